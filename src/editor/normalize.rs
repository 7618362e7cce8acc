//! Normalization the bare editor always applies.
//!
//! Inline runs keep adjacent texts with equal marks merged, drop empty texts,
//! and keep a text on both sides of every inline element so the cursor can
//! sit there. Elements that may hold text always hold at least one leaf.

use crate::document::{Element, Node};

/// Returns whether anything changed.
pub fn normalize_base(nodes: &mut [Node]) -> bool {
    let mut changed = false;
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            changed |= normalize_element(el);
        }
    }
    changed
}

fn normalize_element(el: &mut Element) -> bool {
    let mut changed = normalize_base(&mut el.children);
    if el.children.is_empty() {
        if !el.kind.is_container() {
            el.children.push(Node::text(""));
            changed = true;
        }
        return changed;
    }
    if el.children.iter().all(Node::is_inline_content) {
        let tidy = tidy_inline_children(&el.children);
        if tidy != el.children {
            el.children = tidy;
            changed = true;
        }
    }
    changed
}

fn tidy_inline_children(children: &[Node]) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Text(text) if text.text.is_empty() => {}
            Node::Text(text) => {
                if let Some(Node::Text(prev)) = merged.last_mut()
                    && prev.marks == text.marks
                {
                    prev.text.push_str(&text.text);
                } else {
                    merged.push(child.clone());
                }
            }
            Node::Element(_) => merged.push(child.clone()),
        }
    }

    if merged.is_empty() {
        // keep the marks of the leaf being emptied
        let marks = children
            .iter()
            .find_map(Node::as_text)
            .map(|t| t.marks)
            .unwrap_or_default();
        return vec![Node::marked("", marks)];
    }

    let mut spaced = Vec::with_capacity(merged.len() + 2);
    for node in merged {
        if node.as_element().is_some() && !matches!(spaced.last(), Some(Node::Text(_))) {
            spaced.push(Node::text(""));
        }
        spaced.push(node);
    }
    if !matches!(spaced.last(), Some(Node::Text(_))) {
        spaced.push(Node::text(""));
    }
    spaced
}
