const TRUNCATED_MARKER: &str = "...[truncated]";

/// Characters of backend stdout kept in failure diagnostics.
pub const MAX_STDOUT_PREVIEW: usize = 300;

/// Keep at most `max_chars` characters of `text`, marking the cut.
pub fn prepare_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((end, _)) => format!("{}{TRUNCATED_MARKER}", &text[..end]),
    }
}

#[cfg(test)]
mod tests {
    use super::{prepare_preview, MAX_STDOUT_PREVIEW};

    #[test]
    fn short_content_kept_as_is() {
        let content = "short preview";
        assert_eq!(prepare_preview(content, MAX_STDOUT_PREVIEW), content);
    }

    #[test]
    fn truncated_content_appends_marker() {
        let content: String = "a".repeat(MAX_STDOUT_PREVIEW + 128);
        let preview = prepare_preview(&content, MAX_STDOUT_PREVIEW);
        assert!(preview.ends_with("...[truncated]"));
        assert_eq!(preview.len(), MAX_STDOUT_PREVIEW + "...[truncated]".len());
    }

    #[test]
    fn cuts_on_char_boundaries() {
        let content = "ééééé";
        assert_eq!(prepare_preview(content, 2), "éé...[truncated]");
    }
}
