//! Structured document model and its transformers.
//!
//! This module handles:
//! - The node tree (`types`) and locations within it (`path`)
//! - Markdown to document value and back, via comrak
//! - HTML serialization for the clipboard and HTML paste deserialization

mod html;
mod markdown;
pub mod path;
mod types;

pub use html::{html_to_value, value_to_html};
pub use markdown::{markdown_to_value, value_to_markdown};
pub use path::{Path, Point, Range};
pub use types::{Element, ElementKind, Mark, Marks, Node, Text, Value, is_empty_value};

/// Image file extensions recognised in pasted URLs.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif", "ico", "svg", "avif",
];

/// Returns true if `text` is a single http(s) or mailto URL.
pub fn is_url(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.contains(char::is_whitespace) {
        return false;
    }
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| text.len() > scheme.len() && text.starts_with(scheme))
}

/// Returns true if `text` is a URL whose path ends in a recognised image
/// extension. Query strings and fragments are ignored.
pub fn is_image_url(text: &str) -> bool {
    if !is_url(text) {
        return false;
    }
    let text = text.trim();
    let path = text.split(['?', '#']).next().unwrap_or(text);
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url_accepts_http_and_mailto() {
        assert!(is_url("https://example.com"));
        assert!(is_url("  http://example.com/a  "));
        assert!(is_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_is_url_rejects_prose() {
        assert!(!is_url("see https://example.com"));
        assert!(!is_url("https://"));
        assert!(!is_url("example.com"));
    }

    #[test]
    fn test_is_image_url_checks_extension() {
        assert!(is_image_url("https://example.com/cat.png"));
        assert!(is_image_url("https://example.com/cat.JPG?size=large"));
        assert!(!is_image_url("https://example.com/cat.html"));
        assert!(!is_image_url("/local/cat.png"));
    }

    #[test]
    fn test_markdown_and_html_agree_on_bold() {
        let value = markdown_to_value("Hello **world**");
        assert_eq!(value_to_markdown(&value), "Hello **world**");
        assert!(value_to_html(&value).contains("<strong>world</strong>"));
    }
}
