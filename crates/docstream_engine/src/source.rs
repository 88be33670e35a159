use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use engine_logging::{engine_debug, engine_warn};

use crate::upload::map_reqwest_error;
use crate::{
    log_preview, BatchId, ChunkDecoder, EngineEvent, EventPipeline, EventSink, StreamEvent,
    UploadError,
};

/// Pull-based source of response body chunks. Finite and not restartable.
#[async_trait::async_trait]
pub trait ChunkSource: Send {
    /// Waits for the next chunk; `None` once the body has ended.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, UploadError>>;
}

/// Body chunks of an HTTP response.
pub struct ResponseChunks {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl ResponseChunks {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            stream: response.bytes_stream().boxed(),
        }
    }
}

#[async_trait::async_trait]
impl ChunkSource for ResponseChunks {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, UploadError>> {
        self.stream
            .next()
            .await
            .map(|chunk| chunk.map_err(map_reqwest_error))
    }
}

/// Consumes `source` to the end, emitting every event of interest for `batch_id`.
///
/// Unrecognized events are dropped here. Malformed ones are forwarded so the
/// consumer can try to attribute them to a file.
pub async fn drive_stream(
    batch_id: BatchId,
    source: &mut dyn ChunkSource,
    decoder: ChunkDecoder,
    sink: &dyn EventSink,
) -> Result<usize, UploadError> {
    let mut pipeline = EventPipeline::with_decoder(decoder);
    let mut forwarded = 0;

    while let Some(chunk) = source.next_chunk().await {
        let chunk = chunk?;
        for event in pipeline.push_bytes(&chunk) {
            forwarded += forward(batch_id, event, sink);
        }
    }
    for event in pipeline.finish() {
        forwarded += forward(batch_id, event, sink);
    }
    Ok(forwarded)
}

fn forward(batch_id: BatchId, event: StreamEvent, sink: &dyn EventSink) -> usize {
    match &event {
        StreamEvent::Unrecognized => {
            engine_debug!("batch {batch_id}: ignoring unrecognized event");
            return 0;
        }
        StreamEvent::Malformed(err) => {
            engine_warn!(
                "batch {batch_id}: {err}; data: {}",
                log_preview(&err.raw)
            );
        }
        StreamEvent::File(file) => {
            if let Some(Err(err)) = &file.data {
                engine_warn!(
                    "batch {batch_id}: {} for {}; raw: {}",
                    err,
                    file.file_name,
                    log_preview(&err.raw)
                );
            }
        }
        StreamEvent::Completion => {
            engine_debug!("batch {batch_id}: backend reported completion");
        }
    }
    sink.emit(EngineEvent::Stream { batch_id, event });
    1
}
