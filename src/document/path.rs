//! Locations in the document tree and read-only tree queries.
//!
//! A [`Path`] is a list of child indices starting at the top-level block.
//! A [`Point`] addresses a char offset inside a text leaf. All queries here
//! are pure functions over a `&[Node]`; mutation lives in the editor.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::types::{Element, Node};

pub type Path = Vec<usize>;

/// A char offset inside the text leaf at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub const fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// A selection between two points. `anchor` is where it started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub const fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    pub fn start(&self) -> Point {
        self.edges().0
    }

    pub fn end(&self) -> Point {
        self.edges().1
    }
}

/// Strict ancestor check.
pub fn is_ancestor(ancestor: &[usize], path: &[usize]) -> bool {
    ancestor.len() < path.len() && path.starts_with(ancestor)
}

pub fn parent(path: &[usize]) -> Path {
    path[..path.len().saturating_sub(1)].to_vec()
}

/// Path of the following sibling.
pub fn next(path: &[usize]) -> Path {
    let mut out = path.to_vec();
    if let Some(last) = out.last_mut() {
        *last += 1;
    }
    out
}

/// Path of the preceding sibling, if any.
pub fn previous(path: &[usize]) -> Option<Path> {
    let mut out = path.to_vec();
    let last = out.last_mut()?;
    *last = last.checked_sub(1)?;
    Some(out)
}

pub fn compare(a: &[usize], b: &[usize]) -> Ordering {
    a.cmp(b)
}

/// Adjust `path` for a node inserted at `inserted`.
pub fn transform_for_insert(path: &mut Path, inserted: &[usize]) {
    let Some((&idx, parent)) = inserted.split_last() else {
        return;
    };
    let depth = parent.len();
    if path.len() > depth && path.starts_with(parent) && path[depth] >= idx {
        path[depth] += 1;
    }
}

pub fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get(first)?;
    for &idx in rest {
        node = node.children().get(idx)?;
    }
    Some(node)
}

pub fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get_mut(first)?;
    for &idx in rest {
        node = node.as_element_mut()?.children.get_mut(idx)?;
    }
    Some(node)
}

pub fn element_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Element> {
    node_at(nodes, path)?.as_element()
}

pub fn element_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Element> {
    node_at_mut(nodes, path)?.as_element_mut()
}

/// The child list that contains the node at `path` (the root list for
/// top-level paths).
pub fn siblings_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    if path.len() <= 1 {
        return Some(nodes);
    }
    let parent_path = parent(path);
    Some(&mut element_at_mut(nodes, &parent_path)?.children)
}

/// Paths of every text leaf in document order.
pub fn text_paths(nodes: &[Node]) -> Vec<Path> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect_text_paths(nodes, &mut prefix, &mut out);
    out
}

fn collect_text_paths(nodes: &[Node], prefix: &mut Path, out: &mut Vec<Path>) {
    for (idx, node) in nodes.iter().enumerate() {
        prefix.push(idx);
        match node {
            Node::Text(_) => out.push(prefix.clone()),
            Node::Element(el) => collect_text_paths(&el.children, prefix, out),
        }
        prefix.pop();
    }
}

/// Paths of every element with inline children (including voids), in
/// document order.
pub fn text_block_paths(nodes: &[Node]) -> Vec<Path> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect_text_blocks(nodes, &mut prefix, &mut out);
    out
}

fn collect_text_blocks(nodes: &[Node], prefix: &mut Path, out: &mut Vec<Path>) {
    for (idx, node) in nodes.iter().enumerate() {
        if let Node::Element(el) = node {
            prefix.push(idx);
            if el.kind.is_inline() {
                // inline elements never hold blocks
            } else if el.has_inline_children() {
                out.push(prefix.clone());
            } else {
                collect_text_blocks(&el.children, prefix, out);
            }
            prefix.pop();
        }
    }
}

/// First text leaf at or below `path`.
pub fn first_text_path(nodes: &[Node], path: &[usize]) -> Option<Path> {
    let mut out = path.to_vec();
    let mut node = node_at(nodes, path)?;
    while let Node::Element(el) = node {
        node = el.children.first()?;
        out.push(0);
    }
    Some(out)
}

/// Last text leaf at or below `path`.
pub fn last_text_path(nodes: &[Node], path: &[usize]) -> Option<Path> {
    let mut out = path.to_vec();
    let mut node = node_at(nodes, path)?;
    while let Node::Element(el) = node {
        let idx = el.children.len().checked_sub(1)?;
        node = &el.children[idx];
        out.push(idx);
    }
    Some(out)
}

pub fn start_point(nodes: &[Node], path: &[usize]) -> Option<Point> {
    first_text_path(nodes, path).map(|p| Point::new(p, 0))
}

pub fn end_point(nodes: &[Node], path: &[usize]) -> Option<Point> {
    let leaf = last_text_path(nodes, path)?;
    let len = node_at(nodes, &leaf)?.as_text()?.char_len();
    Some(Point::new(leaf, len))
}

/// Range spanning the whole node at `path`.
pub fn node_range(nodes: &[Node], path: &[usize]) -> Option<Range> {
    Some(Range::new(start_point(nodes, path)?, end_point(nodes, path)?))
}

/// The nearest ancestor of a text leaf that is not inline: its text block.
pub fn block_path_of(nodes: &[Node], text_path: &[usize]) -> Option<Path> {
    let mut path = parent(text_path);
    while !path.is_empty() {
        let el = element_at(nodes, &path)?;
        if !el.kind.is_inline() {
            return Some(path);
        }
        path = parent(&path);
    }
    None
}

/// Ancestors of `path` (nearest first) whose element matches `pred`.
pub fn find_ancestor(
    nodes: &[Node],
    path: &[usize],
    pred: impl Fn(&Element) -> bool,
) -> Option<Path> {
    let mut current = path.to_vec();
    while !current.is_empty() {
        if let Some(el) = element_at(nodes, &current)
            && pred(el)
        {
            return Some(current);
        }
        current = parent(&current);
    }
    None
}

/// Char length of the inline content of a text block.
pub fn block_len(nodes: &[Node], block: &[usize]) -> usize {
    element_at(nodes, block).map_or(0, |el| el.string().chars().count())
}

/// Flatten a point to `(block path, char offset within the block)`.
pub fn block_offset_of(nodes: &[Node], point: &Point) -> Option<(Path, usize)> {
    let block = block_path_of(nodes, &point.path)?;
    let mut offset = 0;
    for leaf in text_paths_under(nodes, &block) {
        if leaf == point.path {
            return Some((block, offset + point.offset));
        }
        offset += node_at(nodes, &leaf)
            .and_then(Node::as_text)
            .map_or(0, super::types::Text::char_len);
    }
    None
}

/// Which leaf wins when an offset sits exactly on a leaf boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// End of the earlier leaf.
    Backward,
    /// Start of the later leaf.
    Forward,
}

/// Inverse of [`block_offset_of`]. Offsets past the end clamp to the end.
pub fn point_at_block_offset(
    nodes: &[Node],
    block: &[usize],
    offset: usize,
    affinity: Affinity,
) -> Option<Point> {
    let leaves = text_paths_under(nodes, block);
    let mut remaining = offset;
    let count = leaves.len();
    for (idx, leaf) in leaves.iter().enumerate() {
        let len = node_at(nodes, leaf)?.as_text()?.char_len();
        let is_last = idx + 1 == count;
        let fits = match affinity {
            Affinity::Backward => remaining <= len,
            Affinity::Forward => remaining < len,
        };
        if fits || is_last {
            return Some(Point::new(leaf.clone(), remaining.min(len)));
        }
        remaining -= len;
    }
    None
}

pub fn text_paths_under(nodes: &[Node], path: &[usize]) -> Vec<Path> {
    let Some(node) = node_at(nodes, path) else {
        return Vec::new();
    };
    match node {
        Node::Text(_) => vec![path.to_vec()],
        Node::Element(el) => {
            let mut out = Vec::new();
            let mut prefix = path.to_vec();
            collect_text_paths(&el.children, &mut prefix, &mut out);
            out
        }
    }
}

/// Whether the point addresses an existing leaf and offset.
pub fn is_valid_point(nodes: &[Node], point: &Point) -> bool {
    node_at(nodes, &point.path)
        .and_then(Node::as_text)
        .is_some_and(|t| point.offset <= t.char_len())
}

/// Nearest valid point: same leaf clamped, else the closest preceding leaf,
/// else the first leaf.
pub fn clamp_point(nodes: &[Node], point: &Point) -> Option<Point> {
    if let Some(text) = node_at(nodes, &point.path).and_then(Node::as_text) {
        return Some(Point::new(point.path.clone(), point.offset.min(text.char_len())));
    }
    let leaves = text_paths(nodes);
    let leaf = leaves
        .iter()
        .rev()
        .find(|leaf| leaf.as_slice() < point.path.as_slice())
        .or_else(|| leaves.first())?;
    end_point(nodes, leaf)
}

/// Topmost nodes lying strictly between two text leaves, in document
/// order. Ancestors of either leaf are excluded.
pub fn topmost_between(nodes: &[Node], start: &[usize], end: &[usize]) -> Vec<Path> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect_between(nodes, &mut prefix, start, end, &mut out);
    out
}

fn collect_between(
    nodes: &[Node],
    prefix: &mut Path,
    start: &[usize],
    end: &[usize],
    out: &mut Vec<Path>,
) {
    for (idx, node) in nodes.iter().enumerate() {
        prefix.push(idx);
        let p = prefix.as_slice();
        if p >= end && !is_ancestor(p, end) {
            prefix.pop();
            return;
        }
        let after_start = p > start;
        if after_start && !is_ancestor(p, end) {
            out.push(prefix.clone());
        } else if let Node::Element(el) = node
            && (is_ancestor(p, start) || is_ancestor(p, end))
        {
            collect_between(&el.children, prefix, start, end, out);
        }
        prefix.pop();
    }
}

/// The subtree covered by `range`, with edge texts clipped.
pub fn fragment(nodes: &[Node], range: &Range) -> Vec<Node> {
    let (start, end) = range.edges();
    let mut prefix = Vec::new();
    clip_nodes(nodes, &mut prefix, &start, &end)
}

fn clip_nodes(nodes: &[Node], prefix: &mut Path, start: &Point, end: &Point) -> Vec<Node> {
    let mut out = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        prefix.push(idx);
        if let Some(clipped) = clip_node(node, prefix, start, end) {
            out.push(clipped);
        }
        prefix.pop();
    }
    out
}

fn clip_node(node: &Node, path: &mut Path, start: &Point, end: &Point) -> Option<Node> {
    match node {
        Node::Text(text) => {
            if path.as_slice() < start.path.as_slice() || path.as_slice() > end.path.as_slice() {
                return None;
            }
            let len = text.char_len();
            let from = if *path == start.path { start.offset } else { 0 };
            let to = if *path == end.path { end.offset } else { len };
            let mut clipped = text.clone();
            clipped.text = char_slice(&text.text, from, to.max(from)).to_string();
            Some(Node::Text(clipped))
        }
        Node::Element(el) => {
            let children = clip_nodes(&el.children, path, start, end);
            if children.is_empty() {
                return None;
            }
            Some(Node::Element(Element::new(el.kind.clone(), children)))
        }
    }
}

/// Byte index of the `char_idx`-th char (or the string length).
pub fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

pub fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let start = byte_index(s, from);
    let end = byte_index(s, to);
    &s[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{ElementKind, Mark, Marks};

    fn sample() -> Vec<Node> {
        vec![
            Node::element(
                ElementKind::Paragraph,
                vec![
                    Node::text("Hello "),
                    Node::marked("world", Marks::default().with(Mark::Bold)),
                ],
            ),
            Node::element(
                ElementKind::BulletedList,
                vec![
                    Node::element(ElementKind::ListItem, vec![Node::text("one")]),
                    Node::element(ElementKind::ListItem, vec![Node::text("two")]),
                ],
            ),
            Node::paragraph("tail"),
        ]
    }

    #[test]
    fn test_text_paths_in_document_order() {
        let paths = text_paths(&sample());
        assert_eq!(
            paths,
            vec![vec![0, 0], vec![0, 1], vec![1, 0, 0], vec![1, 1, 0], vec![2, 0]]
        );
    }

    #[test]
    fn test_text_block_paths_skip_containers() {
        let blocks = text_block_paths(&sample());
        assert_eq!(blocks, vec![vec![0], vec![1, 0], vec![1, 1], vec![2]]);
    }

    #[test]
    fn test_range_edges_orders_backward_selection() {
        let range = Range::new(Point::new(vec![2, 0], 1), Point::new(vec![0, 0], 3));
        assert!(range.is_backward());
        let (start, end) = range.edges();
        assert_eq!(start.path, vec![0, 0]);
        assert_eq!(end.path, vec![2, 0]);
    }

    #[test]
    fn test_block_offset_roundtrip_across_leaves() {
        let nodes = sample();
        let point = Point::new(vec![0, 1], 2);
        let (block, offset) = block_offset_of(&nodes, &point).unwrap();
        assert_eq!(block, vec![0]);
        assert_eq!(offset, 8);
        assert_eq!(
            point_at_block_offset(&nodes, &block, offset, Affinity::Backward),
            Some(point)
        );
    }

    #[test]
    fn test_point_affinity_on_leaf_boundary() {
        let nodes = sample();
        let back = point_at_block_offset(&nodes, &[0], 6, Affinity::Backward).unwrap();
        let fwd = point_at_block_offset(&nodes, &[0], 6, Affinity::Forward).unwrap();
        assert_eq!(back, Point::new(vec![0, 0], 6));
        assert_eq!(fwd, Point::new(vec![0, 1], 0));
    }

    #[test]
    fn test_fragment_clips_edge_texts() {
        let nodes = sample();
        let range = Range::new(Point::new(vec![0, 1], 1), Point::new(vec![1, 0, 0], 2));
        let frag = fragment(&nodes, &range);
        assert_eq!(frag.len(), 2);
        assert_eq!(frag[0].string(), "orld");
        assert_eq!(frag[1].children().len(), 1);
        assert_eq!(frag[1].string(), "on");
    }

    #[test]
    fn test_topmost_between_excludes_ancestors() {
        let nodes = sample();
        let between = topmost_between(&nodes, &[0, 0], &[1, 1, 0]);
        assert_eq!(between, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_block_path_of_skips_inline_parents() {
        let nodes = vec![Node::element(
            ElementKind::Paragraph,
            vec![
                Node::text("see "),
                Node::element(
                    ElementKind::Link {
                        href: "https://example.com".into(),
                        title: None,
                    },
                    vec![Node::text("here")],
                ),
            ],
        )];
        assert_eq!(block_path_of(&nodes, &[0, 1, 0]), Some(vec![0]));
    }

    #[test]
    fn test_clamp_point_falls_back_to_previous_leaf() {
        let nodes = sample();
        let clamped = clamp_point(&nodes, &Point::new(vec![1, 5, 0], 0)).unwrap();
        assert_eq!(clamped, Point::new(vec![1, 1, 0], 3));
    }

    #[test]
    fn test_transform_for_insert_shifts_later_siblings() {
        let mut path = vec![0, 3, 1];
        transform_for_insert(&mut path, &[0, 2]);
        assert_eq!(path, vec![0, 4, 1]);
        let mut earlier = vec![0, 1];
        transform_for_insert(&mut earlier, &[0, 2]);
        assert_eq!(earlier, vec![0, 1]);
    }

    #[test]
    fn test_char_slice_multibyte() {
        assert_eq!(char_slice("café au lait", 2, 6), "fé a");
    }
}
