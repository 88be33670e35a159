use serde_json::Value;

const DATA_FIELD: &str = "data:";

/// A `data:` payload that is not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed event payload: {reason}")]
pub struct FrameError {
    /// The payload text after the `data:` marker.
    pub raw: String,
    pub reason: String,
}

/// Extracts and decodes every `data:` payload of one frame.
///
/// Each data line is its own event. Blank payloads and lines carrying other
/// fields (`id:`, `event:`, comments) are skipped.
pub fn parse_frame(frame: &str) -> Vec<Result<Value, FrameError>> {
    frame
        .lines()
        .filter_map(|line| line.trim().strip_prefix(DATA_FIELD))
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
        .map(|payload| {
            serde_json::from_str(payload).map_err(|err| FrameError {
                raw: payload.to_string(),
                reason: err.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_data_lines_and_ignores_other_fields() {
        let frame = ": keep-alive\nid: 3\nevent: result\n  data: {\"fileName\":\"a.pdf\"}  ";
        let parsed = parse_frame(frame);
        assert_eq!(parsed, vec![Ok(json!({"fileName": "a.pdf"}))]);
    }

    #[test]
    fn every_data_line_is_a_separate_event() {
        let parsed = parse_frame("data: 1\ndata: {\"b\":2}");
        assert_eq!(parsed, vec![Ok(json!(1)), Ok(json!({"b": 2}))]);
    }

    #[test]
    fn empty_payload_yields_nothing() {
        assert!(parse_frame("data:\ndata:    ").is_empty());
    }

    #[test]
    fn malformed_payload_keeps_raw_text() {
        let parsed = parse_frame("data: {\"fileName\": \"a.pdf\"");
        assert_eq!(parsed.len(), 1);
        let err = parsed[0].clone().unwrap_err();
        assert_eq!(err.raw, "{\"fileName\": \"a.pdf\"");
        assert!(err.to_string().starts_with("malformed event payload"));
    }
}
