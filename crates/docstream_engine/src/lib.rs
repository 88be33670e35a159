//! Docstream engine: multipart submission and event stream decoding.
mod decode;
mod engine;
mod frame;
mod interpret;
mod pipeline;
mod preview;
mod source;
mod splitter;
mod types;
mod upload;

pub use decode::ChunkDecoder;
pub use engine::EngineHandle;
pub use frame::{parse_frame, FrameError};
pub use interpret::{
    decode_processed_data, interpret, DataDecodeError, FileEvent, StreamEvent, COMPLETION_MESSAGE,
};
pub use pipeline::EventPipeline;
pub use preview::{log_preview, MAX_LOG_PREVIEW};
pub use source::{drive_stream, ChunkSource, ResponseChunks};
pub use splitter::FrameSplitter;
pub use types::{BatchId, EngineEvent, FailureKind, UploadError};
pub use upload::{
    ChannelEventSink, EventSink, ReqwestUploader, UploadFile, UploadSettings, Uploader,
};
