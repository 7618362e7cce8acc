//! Structural constraints on the document tree.
//!
//! - the document holds at least one block, and only blocks;
//! - lists hold only list items, and list items only live in lists;
//! - paragraphs, headings and code blocks hold only inline content;
//! - void elements hold exactly one empty, unmarked text;
//! - code blocks hold a single unmarked text;
//! - heading levels stay within 1..=6;
//! - lists and clauses without children are removed.

use crate::document::{Element, ElementKind, Node, Text, Value};

use super::Plugin;
use crate::editor::Editor;

pub struct SchemaPlugin;

impl Plugin for SchemaPlugin {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn is_void(&self, element: &Element) -> Option<bool> {
        matches!(element.kind, ElementKind::HorizontalRule).then_some(true)
    }

    fn normalize(&self, value: &mut Value) -> bool {
        let mut changed = normalize_blocks(value, None);
        if value.is_empty() {
            value.push(Node::paragraph(""));
            changed = true;
        }
        changed
    }
}

pub fn with_schema(editor: Editor) -> Editor {
    editor.register(SchemaPlugin)
}

const fn is_text_only(kind: &ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Paragraph | ElementKind::Heading { .. } | ElementKind::CodeBlock { .. }
    )
}

fn holds_blocks(el: &Element) -> bool {
    el.kind.is_container() || el.children.iter().any(|c| !c.is_inline_content())
}

/// Normalize the children of the root (`parent` is `None`) or of a block
/// that holds blocks.
fn normalize_blocks(children: &mut Vec<Node>, parent: Option<&ElementKind>) -> bool {
    let in_list = parent.is_some_and(ElementKind::is_list);
    let mut changed = false;
    let mut idx = 0;
    while idx < children.len() {
        let Node::Element(el) = &mut children[idx] else {
            idx += 1;
            continue;
        };

        if is_text_only(&el.kind) && el.children.iter().any(|c| !c.is_inline_content()) {
            let kind = el.kind.clone();
            let inner = std::mem::take(&mut el.children);
            children.splice(idx..=idx, regroup(inner, &kind));
            changed = true;
            continue;
        }

        if el.kind == ElementKind::ListItem && !in_list {
            if holds_blocks(el) {
                let inner = std::mem::take(&mut el.children);
                children.splice(idx..=idx, inner);
            } else {
                el.kind = ElementKind::Paragraph;
            }
            changed = true;
            continue;
        }

        if in_list && el.kind != ElementKind::ListItem {
            if el.kind == ElementKind::Paragraph {
                el.kind = ElementKind::ListItem;
            } else {
                let wrapped = std::mem::replace(&mut children[idx], Node::text(""));
                children[idx] = Node::element(ElementKind::ListItem, vec![wrapped]);
            }
            changed = true;
            continue;
        }

        changed |= normalize_element(el);

        if el.kind.is_container() && el.children.is_empty() {
            children.remove(idx);
            changed = true;
            continue;
        }
        idx += 1;
    }

    if children.iter().any(Node::is_inline_content) {
        let wrapper = if in_list {
            ElementKind::ListItem
        } else {
            ElementKind::Paragraph
        };
        let inner = std::mem::take(children);
        *children = regroup(inner, &wrapper);
        changed = true;
    }
    changed
}

fn normalize_element(el: &mut Element) -> bool {
    if el.kind.is_inline() {
        return false;
    }
    if let ElementKind::Heading { level } = &mut el.kind
        && !(1..=6).contains(&*level)
    {
        *level = (*level).clamp(1, 6);
        return true;
    }
    if el.kind.is_void() {
        let ok = matches!(el.children.as_slice(), [Node::Text(t)] if t.text.is_empty() && t.marks.is_empty());
        if !ok {
            el.children = vec![Node::text("")];
        }
        return !ok;
    }
    if matches!(el.kind, ElementKind::CodeBlock { .. }) {
        let ok = matches!(el.children.as_slice(), [Node::Text(t)] if t.marks.is_empty());
        if !ok {
            el.children = vec![Node::Text(Text::new(el.string()))];
        }
        return !ok;
    }
    if holds_blocks(el) {
        return normalize_blocks(&mut el.children, Some(&el.kind));
    }
    false
}

/// Keep block nodes, wrapping each run of inline nodes in `kind`.
fn regroup(nodes: Vec<Node>, kind: &ElementKind) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for node in nodes {
        if node.is_inline_content() {
            run.push(node);
        } else {
            if !run.is_empty() {
                out.push(Node::element(kind.clone(), std::mem::take(&mut run)));
            }
            out.push(node);
        }
    }
    if !run.is_empty() {
        out.push(Node::element(kind.clone(), run));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Mark, Marks};

    fn normalized(mut value: Value) -> Value {
        while SchemaPlugin.normalize(&mut value) {}
        value
    }

    fn item(text: &str) -> Node {
        Node::element(ElementKind::ListItem, vec![Node::text(text)])
    }

    #[test]
    fn test_empty_document_gets_paragraph() {
        assert_eq!(normalized(Vec::new()), vec![Node::paragraph("")]);
    }

    #[test]
    fn test_root_text_is_wrapped_in_paragraph() {
        assert_eq!(
            normalized(vec![Node::text("loose"), Node::paragraph("p")]),
            vec![Node::paragraph("loose"), Node::paragraph("p")]
        );
    }

    #[test]
    fn test_list_children_become_items() {
        let value = vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::paragraph("a"), item("b"), Node::text("c")],
        )];
        let list = normalized(value);
        let children = list[0].children();
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|c| c.kind() == Some(&ElementKind::ListItem)));
        assert_eq!(children[2].string(), "c");
    }

    #[test]
    fn test_stray_list_item_becomes_paragraph() {
        assert_eq!(normalized(vec![item("x")]), vec![Node::paragraph("x")]);
    }

    #[test]
    fn test_paragraph_holding_blocks_is_split() {
        let value = vec![Node::element(
            ElementKind::Paragraph,
            vec![
                Node::text("a"),
                Node::Element(Element::void(ElementKind::HorizontalRule)),
                Node::text("b"),
            ],
        )];
        let out = normalized(value);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Node::paragraph("a"));
        assert_eq!(out[1].kind(), Some(&ElementKind::HorizontalRule));
        assert_eq!(out[2], Node::paragraph("b"));
    }

    #[test]
    fn test_void_children_reset() {
        let value = vec![Node::element(
            ElementKind::Image {
                href: "a.png".into(),
                title: None,
                alt: String::new(),
            },
            vec![Node::text("junk")],
        )];
        assert_eq!(normalized(value)[0].children(), &[Node::text("")]);
    }

    #[test]
    fn test_code_block_flattened_to_plain_text() {
        let bold = Marks::default().with(Mark::Bold);
        let value = vec![Node::element(
            ElementKind::CodeBlock { info: None },
            vec![Node::text("let "), Node::marked("x", bold)],
        )];
        assert_eq!(normalized(value)[0].children(), &[Node::text("let x")]);
    }

    #[test]
    fn test_heading_level_clamped() {
        let value = vec![Node::element(
            ElementKind::Heading { level: 9 },
            vec![Node::text("t")],
        )];
        assert_eq!(
            normalized(value)[0].kind(),
            Some(&ElementKind::Heading { level: 6 })
        );
    }

    #[test]
    fn test_empty_containers_removed() {
        let value = vec![
            Node::element(ElementKind::BulletedList, Vec::new()),
            Node::element(ElementKind::Clause { name: "c".into() }, Vec::new()),
            Node::paragraph("kept"),
        ];
        assert_eq!(normalized(value), vec![Node::paragraph("kept")]);
    }

    #[test]
    fn test_valid_document_untouched() {
        let mut value = vec![
            Node::element(ElementKind::Heading { level: 1 }, vec![Node::text("T")]),
            Node::element(ElementKind::BulletedList, vec![item("a")]),
        ];
        assert!(!SchemaPlugin.normalize(&mut value));
    }
}
