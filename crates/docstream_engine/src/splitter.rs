/// Record terminator of the event stream.
const FRAME_TERMINATOR: &str = "\n\n";

/// Cuts decoded text into frames terminated by a blank line.
///
/// Text after the last terminator stays buffered until more arrives, so a
/// terminator split across two chunks is still recognised.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every frame completed by it, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = self.buffer[consumed..].find(FRAME_TERMINATOR) {
            frames.push(self.buffer[consumed..consumed + pos].to_string());
            consumed += pos + FRAME_TERMINATOR.len();
        }
        self.buffer.drain(..consumed);
        frames
    }

    /// Text received after the last complete frame.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Returns the unterminated remainder, if it holds anything but whitespace.
    pub fn finish(self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}
