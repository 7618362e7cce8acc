//! Rich paste.
//!
//! Pasted data is tried in order of fidelity: the editor's own fragment
//! format, then `text/html`, then plain text that looks like markdown block
//! syntax. Anything else falls through to the inner layers as plain text.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{html_to_value, is_empty_value, markdown_to_value};

use super::{Flow, Plugin};
use crate::editor::{DataTransfer, Editor, TEXT_HTML, TEXT_PLAIN};

static MARKDOWN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}(?:#{1,6}\s|[-*+]\s|\d{1,9}[.)]\s|>|```|~~~|\{\{#clause\s)")
        .unwrap_or_else(|err| unreachable!("markdown block pattern is valid: {err}"))
});

/// Whether `text` contains a line starting with markdown block syntax.
pub(crate) fn looks_like_markdown(text: &str) -> bool {
    MARKDOWN_BLOCK.is_match(text)
}

pub struct HtmlPlugin;

impl Plugin for HtmlPlugin {
    fn name(&self) -> &'static str {
        "html"
    }

    fn insert_data(&self, editor: &mut Editor, data: &DataTransfer) -> Flow {
        if let Some(nodes) = data.fragment() {
            tracing::debug!(editor = %editor.id(), blocks = nodes.len(), "paste fragment");
            editor.insert_fragment(nodes);
            return Flow::Handled;
        }
        if let Some(html) = data.get_data(TEXT_HTML) {
            let nodes = html_to_value(html);
            if !is_empty_value(&nodes) {
                tracing::debug!(editor = %editor.id(), blocks = nodes.len(), "paste html");
                editor.insert_fragment(nodes);
                return Flow::Handled;
            }
        }
        if let Some(text) = data.get_data(TEXT_PLAIN)
            && looks_like_markdown(text)
        {
            let nodes = markdown_to_value(text);
            tracing::debug!(editor = %editor.id(), blocks = nodes.len(), "paste markdown");
            editor.insert_fragment(nodes);
            return Flow::Handled;
        }
        Flow::Continue
    }
}

pub fn with_html(editor: Editor) -> Editor {
    editor.register(HtmlPlugin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementKind, Mark, Marks, Node};
    use crate::editor::build_editor;

    fn empty_editor() -> Editor {
        let mut editor = build_editor(None);
        editor.move_to_start();
        editor
    }

    #[test]
    fn test_looks_like_markdown() {
        assert!(looks_like_markdown("# Title"));
        assert!(looks_like_markdown("intro\n- item"));
        assert!(looks_like_markdown("1. first"));
        assert!(!looks_like_markdown("just words"));
        assert!(!looks_like_markdown("https://example.com/page"));
    }

    #[test]
    fn test_paste_html_keeps_marks() {
        let mut editor = empty_editor();
        let mut data = DataTransfer::plain("Hello world");
        data.set_data(TEXT_HTML, "<p>Hello <strong>world</strong></p>");
        editor.insert_data(&data);
        let para = editor.value()[0].as_element().unwrap();
        assert_eq!(para.string(), "Hello world");
        assert_eq!(
            para.children.last(),
            Some(&Node::marked("world", Marks::default().with(Mark::Bold)))
        );
    }

    #[test]
    fn test_paste_markdown_blocks() {
        let mut editor = empty_editor();
        editor.insert_data(&DataTransfer::plain("# Title\n\n- one\n- two"));
        let kinds: Vec<_> = editor.value().iter().filter_map(Node::kind).cloned().collect();
        assert_eq!(
            kinds,
            vec![ElementKind::Heading { level: 1 }, ElementKind::BulletedList]
        );
    }

    #[test]
    fn test_fragment_preferred_over_html() {
        let mut editor = empty_editor();
        let mut data = DataTransfer::new();
        data.set_fragment(&[Node::paragraph("from fragment")]);
        data.set_data(TEXT_HTML, "<p>from html</p>");
        editor.insert_data(&data);
        assert_eq!(editor.value()[0].string(), "from fragment");
    }

    #[test]
    fn test_plain_prose_falls_through() {
        let mut editor = empty_editor();
        editor.insert_data(&DataTransfer::plain("one\ntwo"));
        assert_eq!(editor.value().len(), 2);
        assert_eq!(editor.value()[1].string(), "two");
    }
}
