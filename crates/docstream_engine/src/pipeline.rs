use engine_logging::engine_debug;

use crate::{interpret, log_preview, parse_frame, ChunkDecoder, FrameSplitter, StreamEvent};

/// Bytes in, classified events out: decoder, splitter, frame parser and
/// interpreter chained for one response body.
#[derive(Default)]
pub struct EventPipeline {
    decoder: ChunkDecoder,
    splitter: FrameSplitter,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: ChunkDecoder) -> Self {
        Self {
            decoder,
            splitter: FrameSplitter::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(bytes);
        self.push_text(&text)
    }

    pub fn push_text(&mut self, text: &str) -> Vec<StreamEvent> {
        self.splitter
            .push(text)
            .iter()
            .flat_map(|frame| parse_frame(frame))
            .map(|payload| match payload {
                Ok(value) => interpret(value),
                Err(err) => StreamEvent::Malformed(err),
            })
            .collect()
    }

    /// Ends the stream. Frames completed by the decoder's tail are returned;
    /// an unterminated trailing frame is discarded.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let tail = self.decoder.finish();
        let events = self.push_text(&tail);
        if let Some(rest) = self.splitter.finish() {
            engine_debug!(
                "Discarding unterminated frame at end of stream: {}",
                log_preview(&rest)
            );
        }
        events
    }
}
