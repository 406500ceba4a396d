//! html_extract.rs — pull a generated HTML document out of a bot reply.
//!
//! Two named paths instead of one inline pattern: a fenced ```html code
//! block, then a bare-document fallback for replies that skip the fence.

/// Interior of the first markdown code fence tagged `html`, fence markers
/// and language hint stripped. The tag match is case-insensitive.
pub fn fenced_html_block(text: &str) -> Option<String> {
    let mut rest = text;
    loop {
        let open = rest.find("```")?;
        let after_fence = &rest[open + 3..];
        let line_end = after_fence.find('\n')?;
        let tag = after_fence[..line_end].trim();

        let body_start = &after_fence[line_end + 1..];
        let close = body_start.find("```")?;
        let body = &body_start[..close];

        if tag.eq_ignore_ascii_case("html") {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                return None;
            }
            return Some(trimmed.to_string());
        }
        // Skip this fenced block and keep scanning.
        rest = &body_start[close + 3..];
    }
}

/// Fallback: the reply itself is a bare HTML document (no fence).
pub fn doctype_document(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Fenced block first, bare document second. `Some` means the message can
/// offer a preview button.
pub fn extract_html(text: &str) -> Option<String> {
    fenced_html_block(text).or_else(|| doctype_document(text))
}

/// Webview helper: decides whether a bot message gets a preview button.
#[tauri::command]
pub fn extract_preview_html(text: String) -> Option<String> {
    extract_html(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<!DOCTYPE html>\n<html><body><h1>Salam</h1></body></html>";

    #[test]
    fn fenced_block_interior_is_returned_exactly() {
        let reply = format!("Budur saytınız:\n```html\n{DOC}\n```\nUğurlar!");
        assert_eq!(fenced_html_block(&reply).unwrap(), DOC);
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let reply = format!("```HTML\n{DOC}\n```");
        assert!(fenced_html_block(&reply).is_some());
    }

    #[test]
    fn other_fences_are_skipped() {
        let reply = format!("```js\nconsole.log(1)\n```\nsonra:\n```html\n{DOC}\n```");
        assert_eq!(fenced_html_block(&reply).unwrap(), DOC);
    }

    #[test]
    fn untagged_fence_does_not_match() {
        let reply = format!("```\n{DOC}\n```");
        assert!(fenced_html_block(&reply).is_none());
    }

    #[test]
    fn empty_fenced_block_does_not_match() {
        assert!(fenced_html_block("```html\n\n```").is_none());
    }

    #[test]
    fn unclosed_fence_does_not_match() {
        assert!(fenced_html_block("```html\n<html>").is_none());
    }

    #[test]
    fn doctype_fallback_matches_bare_documents() {
        assert_eq!(doctype_document(DOC).unwrap(), DOC);
        assert!(doctype_document("  <html lang=\"az\"><body></body></html>").is_some());
        assert!(doctype_document("salam, necəsən").is_none());
    }

    #[test]
    fn extract_prefers_fenced_block() {
        let reply = format!("```html\n<html>fenced</html>\n```\n{DOC}");
        assert_eq!(extract_html(&reply).unwrap(), "<html>fenced</html>");
    }

    #[test]
    fn plain_text_yields_none() {
        assert!(extract_html("Bakı Azərbaycanın paytaxtıdır.").is_none());
    }
}
