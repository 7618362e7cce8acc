//! Inline links.
//!
//! Links are inline elements. A URL typed or pasted over an expanded
//! selection wraps the selection in a link. Normalization removes links that
//! lost all their text and flattens links nested inside links.

use crate::document::path::{element_at, element_at_mut, find_ancestor};
use crate::document::{Element, ElementKind, Node, Path, Value, is_url};

use super::{Flow, Plugin};
use crate::editor::inlines::{inline_len, node_len, split_inlines};
use crate::editor::{ChangeKind, DataTransfer, Editor, TEXT_PLAIN};

pub struct LinksPlugin;

impl Plugin for LinksPlugin {
    fn name(&self) -> &'static str {
        "links"
    }

    fn is_inline(&self, element: &Element) -> Option<bool> {
        matches!(element.kind, ElementKind::Link { .. }).then_some(true)
    }

    fn insert_text(&self, editor: &mut Editor, text: &str) -> Flow {
        wrap_if_url(editor, text)
    }

    fn insert_data(&self, editor: &mut Editor, data: &DataTransfer) -> Flow {
        data.get_data(TEXT_PLAIN)
            .map_or(Flow::Continue, |text| wrap_if_url(editor, text))
    }

    fn normalize(&self, value: &mut Value) -> bool {
        normalize_links(value, false)
    }
}

pub fn with_links(editor: Editor) -> Editor {
    editor.register(LinksPlugin)
}

fn wrap_if_url(editor: &mut Editor, text: &str) -> Flow {
    let expanded = editor.selection().is_some_and(|s| s.is_expanded());
    if expanded && is_url(text) {
        insert_link(editor, text.trim(), None);
        return Flow::Handled;
    }
    Flow::Continue
}

fn link_kind(url: &str) -> ElementKind {
    ElementKind::Link {
        href: url.to_string(),
        title: None,
    }
}

fn is_link(el: &Element) -> bool {
    matches!(el.kind, ElementKind::Link { .. })
}

/// Link the selection to `url`. A collapsed selection inserts a new link
/// showing `text` (or the URL itself); an expanded one wraps the selected
/// text in each block. Existing links in the way are unwrapped first.
pub fn insert_link(editor: &mut Editor, url: &str, text: Option<&str>) {
    let Some(selection) = editor.selection().cloned() else {
        return;
    };
    tracing::debug!(editor = %editor.id(), url, "insert link");
    editor.transact(ChangeKind::Other, |editor| {
        if is_link_active(editor) {
            unwrap_link(editor);
        }
        if selection.is_collapsed() {
            let label = text.filter(|t| !t.is_empty()).unwrap_or(url);
            editor.insert_fragment(vec![Node::element(link_kind(url), vec![Node::text(label)])]);
            return;
        }
        let Some((start, end)) = editor.selection_edges() else {
            return;
        };
        let captured = editor.capture_selection();
        let blocks = editor.text_blocks();
        for ordinal in start.ordinal..=end.ordinal {
            let Some(block) = blocks.get(ordinal) else {
                continue;
            };
            if editor.block_is_void(block) {
                continue;
            }
            let len = crate::document::path::block_len(&editor.value, block);
            let from = if ordinal == start.ordinal { start.offset } else { 0 };
            let to = if ordinal == end.ordinal { end.offset } else { len };
            if from >= to {
                continue;
            }
            if let Some(el) = element_at_mut(&mut editor.value, block) {
                el.children = wrap_range(&el.children, from, to, link_kind(url));
            }
        }
        if let Some(captured) = captured {
            editor.restore_selection(captured);
        }
    });
}

fn wrap_range(children: &[Node], from: usize, to: usize, kind: ElementKind) -> Vec<Node> {
    let (mut out, rest) = split_inlines(children, from);
    let (middle, tail) = split_inlines(&rest, to - from);
    let mut inner = Vec::new();
    for node in middle {
        match node {
            Node::Element(el) if is_link(&el) => inner.extend(el.children),
            other => inner.push(other),
        }
    }
    out.push(Node::element(kind, inner));
    out.extend(tail);
    out
}

/// Remove links touching the selection, keeping their text.
pub fn unwrap_link(editor: &mut Editor) {
    editor.transact(ChangeKind::Other, |editor| {
        let Some((start, end)) = editor.selection_edges() else {
            return;
        };
        let captured = editor.capture_selection();
        let blocks = editor.text_blocks();
        for ordinal in start.ordinal..=end.ordinal {
            let Some(block) = blocks.get(ordinal) else {
                continue;
            };
            let from = if ordinal == start.ordinal { start.offset } else { 0 };
            let to = if ordinal == end.ordinal { end.offset } else { usize::MAX };
            if let Some(el) = element_at_mut(&mut editor.value, block) {
                el.children = unwrap_in_range(std::mem::take(&mut el.children), from, to);
            }
        }
        if let Some(captured) = captured {
            editor.restore_selection(captured);
        }
    });
}

fn unwrap_in_range(children: Vec<Node>, from: usize, to: usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut offset = 0;
    for node in children {
        let len = node_len(&node);
        let touches = offset <= to && offset + len >= from;
        offset += len;
        match node {
            Node::Element(el) if is_link(&el) && touches => out.extend(el.children),
            other => out.push(other),
        }
    }
    out
}

fn link_path_at(editor: &Editor, path: &[usize]) -> Option<Vec<usize>> {
    find_ancestor(editor.value(), path, is_link)
}

/// Whether the anchor or focus of the selection is inside a link.
pub fn is_link_active(editor: &Editor) -> bool {
    editor.selection().is_some_and(|s| {
        link_path_at(editor, &s.anchor.path).is_some() || link_path_at(editor, &s.focus.path).is_some()
    })
}

/// Whether the whole selection lies within the body of a single link.
pub fn is_selection_link_body(editor: &Editor) -> bool {
    selection_link_path(editor).is_some()
}

/// Path of the link holding both ends of the selection.
pub fn selection_link_path(editor: &Editor) -> Option<Path> {
    let selection = editor.selection()?;
    let anchor = link_path_at(editor, &selection.anchor.path)?;
    let focus = link_path_at(editor, &selection.focus.path)?;
    (anchor == focus).then_some(anchor)
}

/// The link around the focus, if any.
pub fn active_link(editor: &Editor) -> Option<Element> {
    let focus = &editor.selection()?.focus;
    let path = link_path_at(editor, &focus.path)?;
    element_at(editor.value(), &path).cloned()
}

fn normalize_links(nodes: &mut Vec<Node>, inside_link: bool) -> bool {
    let mut changed = false;
    let mut idx = 0;
    while idx < nodes.len() {
        let Node::Element(el) = &mut nodes[idx] else {
            idx += 1;
            continue;
        };
        if is_link(el) {
            if inside_link || inline_len(&el.children) == 0 {
                let inner = std::mem::take(&mut el.children);
                nodes.splice(idx..=idx, inner);
                changed = true;
                continue;
            }
            changed |= normalize_links(&mut el.children, true);
        } else {
            changed |= normalize_links(&mut el.children, inside_link);
        }
        idx += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::build_editor;

    const URL: &str = "https://example.com";

    fn editor_with(text: &str) -> Editor {
        let mut editor = build_editor(None);
        editor.reset(vec![Node::paragraph(text)]);
        editor
    }

    fn link_children(editor: &Editor) -> Vec<String> {
        editor.value()[0]
            .children()
            .iter()
            .filter(|n| matches!(n.kind(), Some(ElementKind::Link { .. })))
            .map(Node::string)
            .collect()
    }

    #[test]
    fn test_insert_link_wraps_expanded_selection() {
        let mut editor = editor_with("see the docs");
        editor.select_block_position(0, 8, false);
        editor.select_block_position(0, 12, true);
        insert_link(&mut editor, URL, None);
        assert_eq!(link_children(&editor), vec!["docs"]);
        assert_eq!(editor.value()[0].string(), "see the docs");
        assert!(is_selection_link_body(&editor));
    }

    #[test]
    fn test_insert_link_at_cursor_inserts_label() {
        let mut editor = editor_with("go ");
        editor.move_to_end();
        insert_link(&mut editor, URL, Some("here"));
        assert_eq!(link_children(&editor), vec!["here"]);
        assert_eq!(editor.value()[0].string(), "go here");
    }

    #[test]
    fn test_pasting_url_over_selection_links_it() {
        let mut editor = editor_with("click me");
        editor.select_all();
        editor.insert_data(&DataTransfer::plain(URL));
        assert_eq!(link_children(&editor), vec!["click me"]);
    }

    #[test]
    fn test_unwrap_link_keeps_text() {
        let mut editor = editor_with("see the docs");
        editor.select_all();
        insert_link(&mut editor, URL, None);
        editor.select_block_position(0, 2, false);
        assert!(is_link_active(&editor));
        unwrap_link(&mut editor);
        assert!(link_children(&editor).is_empty());
        assert_eq!(editor.value()[0].string(), "see the docs");
        assert!(!is_link_active(&editor));
    }

    #[test]
    fn test_active_link_reports_href() {
        let mut editor = editor_with("docs");
        editor.select_all();
        insert_link(&mut editor, URL, None);
        editor.select_block_position(0, 1, false);
        let link = active_link(&editor).unwrap();
        assert_eq!(
            link.kind,
            ElementKind::Link {
                href: URL.into(),
                title: None
            }
        );
    }

    #[test]
    fn test_normalize_removes_empty_and_nested_links() {
        let inner = Node::element(link_kind("b"), vec![Node::text("x")]);
        let mut value = vec![Node::element(
            ElementKind::Paragraph,
            vec![
                Node::element(link_kind("a"), vec![Node::text("")]),
                Node::element(link_kind("c"), vec![Node::text("y"), inner]),
            ],
        )];
        assert!(LinksPlugin.normalize(&mut value));
        let para = value[0].as_element().unwrap();
        assert_eq!(para.children.len(), 2);
        assert_eq!(para.children[1].string(), "yx");
        assert_eq!(para.children[1].children().len(), 2);
    }
}
