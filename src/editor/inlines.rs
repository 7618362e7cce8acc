//! Pure operations on the inline children of a text block.
//!
//! Offsets are char offsets into the block's flattened string. Every
//! function returns fresh children; zero-length pieces are dropped and left
//! for normalization to restore.

use crate::document::path::char_slice;
use crate::document::{Element, Mark, Marks, Node, Text};

pub fn node_len(node: &Node) -> usize {
    match node {
        Node::Text(t) => t.char_len(),
        Node::Element(el) => inline_len(&el.children),
    }
}

pub fn inline_len(children: &[Node]) -> usize {
    children.iter().map(node_len).sum()
}

/// Split at `offset`. The left side holds the chars before it.
pub fn split_inlines(children: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut remaining = offset;
    for child in children {
        let len = node_len(child);
        if len == 0 {
            continue;
        }
        if remaining >= len {
            left.push(child.clone());
            remaining -= len;
        } else if remaining == 0 {
            right.push(child.clone());
        } else {
            match child {
                Node::Text(text) => {
                    let mut head = text.clone();
                    head.text = char_slice(&text.text, 0, remaining).to_string();
                    let mut tail = text.clone();
                    tail.text = char_slice(&text.text, remaining, len).to_string();
                    left.push(head.into());
                    right.push(tail.into());
                }
                Node::Element(el) => {
                    let (head, tail) = split_inlines(&el.children, remaining);
                    left.push(Element::new(el.kind.clone(), head).into());
                    right.push(Element::new(el.kind.clone(), tail).into());
                }
            }
            remaining = 0;
        }
    }
    (left, right)
}

/// Replace the chars in `from..to` with `insert`.
pub fn replace_range(children: &[Node], from: usize, to: usize, insert: Vec<Node>) -> Vec<Node> {
    let (mut out, _) = split_inlines(children, from);
    let (_, tail) = split_inlines(children, to.max(from));
    out.extend(insert);
    out.extend(tail);
    out
}

/// Set or clear `mark` on every text in `from..to`.
pub fn set_mark_in_range(children: &[Node], from: usize, to: usize, mark: Mark, on: bool) -> Vec<Node> {
    let (mut out, rest) = split_inlines(children, from);
    let (mut middle, tail) = split_inlines(&rest, to.saturating_sub(from));
    for node in &mut middle {
        for_each_text_mut(node, &mut |text| text.marks.set(mark, on));
    }
    out.extend(middle);
    out.extend(tail);
    out
}

pub fn for_each_text_mut(node: &mut Node, f: &mut impl FnMut(&mut Text)) {
    match node {
        Node::Text(text) => f(text),
        Node::Element(el) => {
            for child in &mut el.children {
                for_each_text_mut(child, f);
            }
        }
    }
}

/// Marks of the text that ends at or contains `offset`.
pub fn marks_at(children: &[Node], offset: usize) -> Marks {
    let (left, right) = split_inlines(children, offset);
    last_text(&left)
        .or_else(|| first_text(&right))
        .map(|t| t.marks)
        .unwrap_or_default()
}

fn last_text(nodes: &[Node]) -> Option<&Text> {
    nodes.iter().rev().find_map(|node| match node {
        Node::Text(t) => Some(t),
        Node::Element(el) => last_text(&el.children),
    })
}

fn first_text(nodes: &[Node]) -> Option<&Text> {
    nodes.iter().find_map(|node| match node {
        Node::Text(t) => Some(t),
        Node::Element(el) => first_text(&el.children),
    })
}

/// `children`, or a single empty text carrying `marks` when empty.
pub fn fill_empty(children: Vec<Node>, marks: Marks) -> Vec<Node> {
    if children.is_empty() {
        vec![Node::marked("", marks)]
    } else {
        children
    }
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementKind;

    fn bold() -> Marks {
        Marks::default().with(Mark::Bold)
    }

    fn link(text: &str) -> Node {
        Node::element(
            ElementKind::Link {
                href: "https://example.com".into(),
                title: None,
            },
            vec![Node::text(text)],
        )
    }

    #[test]
    fn test_split_inside_text() {
        let (left, right) = split_inlines(&[Node::text("hello")], 2);
        assert_eq!(left, vec![Node::text("he")]);
        assert_eq!(right, vec![Node::text("llo")]);
    }

    #[test]
    fn test_split_on_boundary_keeps_leaves_whole() {
        let children = vec![Node::text("ab"), Node::marked("cd", bold())];
        let (left, right) = split_inlines(&children, 2);
        assert_eq!(left, vec![Node::text("ab")]);
        assert_eq!(right, vec![Node::marked("cd", bold())]);
    }

    #[test]
    fn test_split_inside_link_splits_link() {
        let children = vec![Node::text("a"), link("bcd"), Node::text("e")];
        let (left, right) = split_inlines(&children, 2);
        assert_eq!(left, vec![Node::text("a"), link("b")]);
        assert_eq!(right, vec![link("cd"), Node::text("e")]);
    }

    #[test]
    fn test_replace_range_deletes_across_leaves() {
        let children = vec![Node::text("Hello "), Node::marked("world", bold())];
        let out = replace_range(&children, 3, 8, Vec::new());
        assert_eq!(out, vec![Node::text("Hel"), Node::marked("rld", bold())]);
    }

    #[test]
    fn test_set_mark_in_range_marks_middle_only() {
        let out = set_mark_in_range(&[Node::text("abcde")], 1, 3, Mark::Bold, true);
        assert_eq!(
            out,
            vec![Node::text("a"), Node::marked("bc", bold()), Node::text("de")]
        );
    }

    #[test]
    fn test_marks_at_prefers_text_before_offset() {
        let children = vec![Node::marked("ab", bold()), Node::text("cd")];
        assert_eq!(marks_at(&children, 2), bold());
        assert_eq!(marks_at(&children, 0), bold());
        assert_eq!(marks_at(&children, 3), Marks::default());
    }
}
