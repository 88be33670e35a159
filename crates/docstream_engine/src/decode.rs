use encoding_rs::{Decoder, Encoding, UTF_8};

use engine_logging::engine_warn;

/// Streaming text decoder for response chunks.
///
/// Multi-byte sequences split across chunk boundaries are held back until the
/// next chunk completes them. Invalid sequences become U+FFFD.
pub struct ChunkDecoder {
    decoder: Decoder,
    encoding: &'static Encoding,
}

impl ChunkDecoder {
    pub fn utf8() -> Self {
        Self::with_encoding(UTF_8)
    }

    /// Picks the encoding from a `charset=` parameter, falling back to UTF-8.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(extract_charset)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        Self::with_encoding(encoding)
    }

    fn with_encoding(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
            encoding,
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.decode_inner(bytes, false)
    }

    /// Flushes any incomplete trailing sequence.
    pub fn finish(&mut self) -> String {
        self.decode_inner(&[], true)
    }

    fn decode_inner(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 16);
        let mut text = String::with_capacity(capacity);
        let (_, _, had_errors) = self.decoder.decode_to_string(bytes, &mut text, last);
        if had_errors {
            engine_warn!(
                "Replaced malformed {} bytes in event stream",
                self.encoding.name()
            );
        }
        text
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::utf8()
    }
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}
