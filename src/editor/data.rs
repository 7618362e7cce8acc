//! Clipboard and drag payloads keyed by MIME type.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::document::{Node, Value};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
/// Internal lossless fragment format: base64-encoded JSON nodes.
pub const FRAGMENT_MIME: &str = "application/x-markwright-fragment";

/// A set of representations of the same content, keyed by MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    items: BTreeMap<String, String>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload holding only plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut data = Self::new();
        data.set_data(TEXT_PLAIN, text);
        data
    }

    pub fn set_data(&mut self, mime: &str, data: impl Into<String>) {
        self.items.insert(mime.to_string(), data.into());
    }

    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.items.get(mime).map(String::as_str)
    }

    pub fn has(&self, mime: &str) -> bool {
        self.items.contains_key(mime)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store `nodes` under [`FRAGMENT_MIME`].
    pub fn set_fragment(&mut self, nodes: &[Node]) {
        if let Some(encoded) = encode_fragment(nodes) {
            self.set_data(FRAGMENT_MIME, encoded);
        }
    }

    /// Decode the [`FRAGMENT_MIME`] entry, if present and well formed.
    pub fn fragment(&self) -> Option<Value> {
        decode_fragment(self.get_data(FRAGMENT_MIME)?)
    }
}

pub fn encode_fragment(nodes: &[Node]) -> Option<String> {
    let json = serde_json::to_vec(nodes).ok()?;
    Some(STANDARD.encode(json))
}

pub fn decode_fragment(encoded: &str) -> Option<Value> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sets_text_plain_only() {
        let data = DataTransfer::plain("hi");
        assert_eq!(data.get_data(TEXT_PLAIN), Some("hi"));
        assert_eq!(data.types().collect::<Vec<_>>(), vec![TEXT_PLAIN]);
    }

    #[test]
    fn test_fragment_survives_encoding() {
        let nodes = vec![Node::paragraph("copied")];
        let mut data = DataTransfer::new();
        data.set_fragment(&nodes);
        assert_eq!(data.fragment(), Some(nodes));
    }

    #[test]
    fn test_malformed_fragment_is_ignored() {
        let mut data = DataTransfer::new();
        data.set_data(FRAGMENT_MIME, "not base64!");
        assert_eq!(data.fragment(), None);
        data.set_data(FRAGMENT_MIME, STANDARD.encode("{\"nope\":1}"));
        assert_eq!(data.fragment(), None);
    }
}
