use std::borrow::Cow;

const TRUNCATED_MARKER: &str = "...[truncated]";
pub const MAX_LOG_PREVIEW: usize = 240;

/// Shortens raw payload text for log lines, cutting on a char boundary.
pub fn log_preview(text: &str) -> Cow<'_, str> {
    if text.len() <= MAX_LOG_PREVIEW {
        return Cow::Borrowed(text);
    }
    let mut end = MAX_LOG_PREVIEW;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}{TRUNCATED_MARKER}", &text[..end]))
}

#[cfg(test)]
mod tests {
    use super::{log_preview, MAX_LOG_PREVIEW};

    #[test]
    fn short_text_is_borrowed() {
        assert_eq!(log_preview("data: {}"), "data: {}");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let text = "é".repeat(MAX_LOG_PREVIEW);
        let preview = log_preview(&text);
        assert!(preview.ends_with("...[truncated]"));
        assert!(preview.len() <= MAX_LOG_PREVIEW + "...[truncated]".len());
    }
}
