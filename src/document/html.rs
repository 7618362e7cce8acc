//! HTML transformers.
//!
//! Serialization renders each block's markdown through comrak, so clipboard
//! HTML matches what any CommonMark renderer would produce. Deserialization
//! is a small regex tokenizer for the tag subset that serialization emits
//! plus the common aliases other applications put on the clipboard. It is
//! not a conforming HTML parser.

use std::fmt::Write;
use std::sync::LazyLock;

use comrak::markdown_to_html;
use regex::{Captures, Regex};

use super::markdown::{block_to_markdown, create_options};
use super::types::{Element, ElementKind, Mark, Marks, Node, Value};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>|[^<]+|<"#)
        .unwrap_or_else(|err| unreachable!("html token pattern: {err}"))
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .unwrap_or_else(|err| unreachable!("html attribute pattern: {err}"))
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")
        .unwrap_or_else(|err| unreachable!("html entity pattern: {err}"))
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").unwrap_or_else(|err| unreachable!("whitespace pattern: {err}"))
});

/// Serialize a document (or fragment) to HTML.
pub fn value_to_html(nodes: &[Node]) -> String {
    let options = create_options();
    let mut out = String::new();
    for node in nodes {
        push_block_html(node, &options, &mut out);
    }
    out
}

fn push_block_html(node: &Node, options: &comrak::Options, out: &mut String) {
    if let Some(el) = node.as_element()
        && let ElementKind::Clause { name } = &el.kind
    {
        let _ = writeln!(
            out,
            "<div class=\"clause\" data-clause=\"{}\">",
            escape_attr(name)
        );
        for child in &el.children {
            push_block_html(child, options, out);
        }
        out.push_str("</div>\n");
        return;
    }
    out.push_str(&markdown_to_html(&block_to_markdown(node), options));
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Deserialize pasted HTML into a document value. Unknown tags are ignored
/// and their text content kept.
pub fn html_to_value(html: &str) -> Value {
    let mut builder = HtmlBuilder::new();
    for caps in TOKEN.captures_iter(html) {
        builder.token(&caps);
    }
    builder.finish()
}

/// An open element while building. `kind == None` is a transparent frame
/// (the root, or a plain `<div>`).
struct Frame {
    tag: String,
    kind: Option<ElementKind>,
    children: Vec<Node>,
    /// Void blocks met inside a text block, emitted after it closes.
    deferred: Vec<Node>,
}

impl Frame {
    fn new(tag: &str, kind: Option<ElementKind>) -> Self {
        Self {
            tag: tag.to_string(),
            kind,
            children: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn accepts_inline(&self) -> bool {
        matches!(
            self.kind,
            Some(
                ElementKind::Paragraph
                    | ElementKind::Heading { .. }
                    | ElementKind::CodeBlock { .. }
                    | ElementKind::ListItem
                    | ElementKind::BlockQuote
            )
        )
    }

    fn inline_only(&self) -> bool {
        matches!(
            self.kind,
            Some(ElementKind::Paragraph | ElementKind::Heading { .. } | ElementKind::CodeBlock { .. })
        )
    }

    fn is_implicit_paragraph(&self) -> bool {
        self.tag.is_empty() && self.kind == Some(ElementKind::Paragraph)
    }
}

struct HtmlBuilder {
    frames: Vec<Frame>,
    /// Open anchors; `None` for anchors without an href.
    links: Vec<Option<Element>>,
    mark_depth: [usize; 4],
    pre_depth: usize,
    skip_depth: usize,
    /// Set by `<br>`; the source line break after it is not content.
    after_break: bool,
}

impl HtmlBuilder {
    fn new() -> Self {
        Self {
            frames: vec![Frame::new("", None)],
            links: Vec::new(),
            mark_depth: [0; 4],
            pre_depth: 0,
            skip_depth: 0,
            after_break: false,
        }
    }

    fn token(&mut self, caps: &Captures<'_>) {
        let Some(tag) = caps.get(2) else {
            let raw = &caps[0];
            if !raw.starts_with("<!--") && self.skip_depth == 0 {
                self.text(raw);
            }
            return;
        };
        let tag = tag.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let attrs = caps.get(3).map_or("", |m| m.as_str());

        if matches!(tag.as_str(), "script" | "style" | "head" | "title") {
            if closing {
                self.skip_depth = self.skip_depth.saturating_sub(1);
            } else {
                self.skip_depth += 1;
            }
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        if closing {
            self.close_tag(&tag);
        } else {
            self.open_tag(&tag, attrs);
        }
    }

    fn open_tag(&mut self, tag: &str, attrs: &str) {
        match tag {
            "b" | "strong" => self.mark_depth[mark_index(Mark::Bold)] += 1,
            "i" | "em" => self.mark_depth[mark_index(Mark::Italic)] += 1,
            "s" | "del" | "strike" => self.mark_depth[mark_index(Mark::Strikethrough)] += 1,
            "code" if self.pre_depth > 0 => {
                let lang = attr(attrs, "class").and_then(|class| {
                    class
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-").map(str::to_string))
                });
                if let Some(frame) = self.frames.last_mut()
                    && let Some(ElementKind::CodeBlock { info }) = &mut frame.kind
                    && info.is_none()
                {
                    *info = lang;
                }
            }
            "code" => self.mark_depth[mark_index(Mark::Code)] += 1,
            "a" => {
                let link = attr(attrs, "href").map(|href| {
                    Element::new(
                        ElementKind::Link {
                            href,
                            title: attr(attrs, "title").filter(|t| !t.is_empty()),
                        },
                        Vec::new(),
                    )
                });
                self.links.push(link);
            }
            "br" => {
                self.push_inline(Node::marked("\n", self.marks()));
                self.after_break = true;
            }
            // Inline here; a paragraph holding nothing else becomes an
            // image block when it closes.
            "img" => {
                if let Some(href) = attr(attrs, "src") {
                    let kind = ElementKind::InlineImage {
                        href,
                        title: attr(attrs, "title").filter(|t| !t.is_empty()),
                    };
                    let alt = attr(attrs, "alt").unwrap_or_default();
                    let image = Node::element(kind, vec![Node::marked(alt, self.marks())]);
                    self.push_inline(image);
                }
            }
            "hr" => self.push_void(Element::void(ElementKind::HorizontalRule).into()),
            "p" => self.open_block(tag, Some(ElementKind::Paragraph)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse().unwrap_or(1);
                self.open_block(tag, Some(ElementKind::Heading { level }));
            }
            "blockquote" => self.open_block(tag, Some(ElementKind::BlockQuote)),
            "pre" => {
                self.open_block(tag, Some(ElementKind::CodeBlock { info: None }));
                self.pre_depth += 1;
            }
            "ul" => self.open_block(tag, Some(ElementKind::BulletedList)),
            "ol" => {
                let start = attr(attrs, "start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                self.open_block(tag, Some(ElementKind::NumberedList { start }));
            }
            "li" => {
                if self
                    .frames
                    .last()
                    .is_some_and(|f| f.kind == Some(ElementKind::ListItem))
                {
                    self.pop_frame();
                }
                self.open_block(tag, Some(ElementKind::ListItem));
            }
            "div" => {
                let is_clause = attr(attrs, "class")
                    .is_some_and(|c| c.split_whitespace().any(|c| c == "clause"));
                let kind = is_clause.then(|| ElementKind::Clause {
                    name: attr(attrs, "data-clause").unwrap_or_else(|| "clause".to_string()),
                });
                self.open_block(tag, kind);
            }
            _ => {}
        }
    }

    fn close_tag(&mut self, tag: &str) {
        match tag {
            "b" | "strong" => dec(&mut self.mark_depth[mark_index(Mark::Bold)]),
            "i" | "em" => dec(&mut self.mark_depth[mark_index(Mark::Italic)]),
            "s" | "del" | "strike" => dec(&mut self.mark_depth[mark_index(Mark::Strikethrough)]),
            "code" if self.pre_depth > 0 => {}
            "code" => dec(&mut self.mark_depth[mark_index(Mark::Code)]),
            "a" => {
                if let Some(link) = self.links.pop().flatten() {
                    self.push_link(link);
                }
            }
            _ => {
                if let Some(idx) = self.frames.iter().rposition(|f| f.tag == tag)
                    && idx > 0
                {
                    while self.frames.len() > idx {
                        self.pop_frame();
                    }
                }
            }
        }
    }

    fn marks(&self) -> Marks {
        let mut marks = Marks::default();
        if self.pre_depth > 0 {
            return marks;
        }
        for mark in Mark::ALL {
            marks.set(mark, self.mark_depth[mark_index(mark)] > 0);
        }
        marks
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        let in_pre = self.pre_depth > 0;
        let mut text = if in_pre {
            decoded
        } else {
            WHITESPACE.replace_all(&decoded, " ").into_owned()
        };
        if !in_pre && self.after_break {
            text = text.trim_start().to_string();
            if text.is_empty() {
                return;
            }
            self.after_break = false;
        }
        let accepts = self.frames.last().is_some_and(Frame::accepts_inline);
        if !in_pre && text.trim().is_empty() && !accepts && self.links.is_empty() {
            return;
        }
        self.push_inline(Node::marked(text, self.marks()));
    }

    fn push_inline(&mut self, node: Node) {
        if let Some(link) = self.links.iter_mut().rev().find_map(Option::as_mut) {
            link.children.push(node);
            return;
        }
        if !self.frames.last().is_some_and(Frame::accepts_inline) {
            self.frames.push(Frame::new("", Some(ElementKind::Paragraph)));
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.children.push(node);
        }
    }

    fn push_link(&mut self, link: Element) {
        if link.children.is_empty() {
            return;
        }
        // nested anchors are invalid HTML; flatten into the outer one
        if let Some(outer) = self.links.iter_mut().rev().find_map(Option::as_mut) {
            outer.children.extend(link.children);
            return;
        }
        self.push_inline(link.into());
    }

    fn push_void(&mut self, node: Node) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.inline_only() {
            frame.deferred.push(node);
        } else {
            frame.children.push(node);
        }
    }

    fn open_block(&mut self, tag: &str, kind: Option<ElementKind>) {
        self.close_links();
        while self.frames.len() > 1 && self.frames.last().is_some_and(Frame::inline_only) {
            self.pop_frame();
        }
        self.frames.push(Frame::new(tag, kind));
    }

    fn close_links(&mut self) {
        while let Some(link) = self.links.pop() {
            if let Some(link) = link {
                self.push_link(link);
            }
        }
    }

    fn pop_frame(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        if self
            .frames
            .last()
            .is_some_and(|f| !f.is_implicit_paragraph())
        {
            self.close_links();
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if matches!(frame.kind, Some(ElementKind::CodeBlock { .. })) {
            self.pre_depth = self.pre_depth.saturating_sub(1);
        }
        let Some(parent) = self.frames.last_mut() else {
            return;
        };
        match frame.kind {
            Some(kind) => {
                if let Some(node) = finish_element(kind, frame.children) {
                    parent.children.push(node);
                }
            }
            None => parent.children.extend(frame.children),
        }
        parent.children.extend(frame.deferred);
    }

    fn finish(mut self) -> Value {
        self.close_links();
        while self.frames.len() > 1 {
            self.pop_frame();
        }
        let root = self.frames.pop().map(|f| f.children).unwrap_or_default();
        let blocks = tidy_blocks(root);
        if blocks.is_empty() {
            vec![Node::paragraph("")]
        } else {
            blocks
        }
    }
}

const fn mark_index(mark: Mark) -> usize {
    match mark {
        Mark::Bold => 0,
        Mark::Italic => 1,
        Mark::Code => 2,
        Mark::Strikethrough => 3,
    }
}

const fn dec(depth: &mut usize) {
    *depth = depth.saturating_sub(1);
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        Some(decode_entities(value))
    })
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn finish_element(kind: ElementKind, children: Vec<Node>) -> Option<Node> {
    match kind {
        ElementKind::Paragraph => {
            let children = tidy_inlines(children);
            if let [Node::Element(only)] = children.as_slice()
                && let ElementKind::InlineImage { href, title } = &only.kind
            {
                let image = ElementKind::Image {
                    href: href.clone(),
                    title: title.clone(),
                    alt: only.string(),
                };
                return Some(Element::void(image).into());
            }
            (!children.is_empty()).then(|| Node::element(kind, children))
        }
        ElementKind::Heading { .. } => {
            let children = tidy_inlines(children);
            (!children.is_empty()).then(|| Node::element(kind, children))
        }
        ElementKind::CodeBlock { .. } => {
            let mut literal: String = children.iter().map(Node::string).collect();
            if literal.ends_with('\n') {
                literal.pop();
            }
            if let Some(rest) = literal.strip_prefix('\n') {
                literal = rest.to_string();
            }
            Some(Node::element(kind, vec![Node::text(literal)]))
        }
        ElementKind::ListItem | ElementKind::BlockQuote => {
            let children = if children.iter().all(Node::is_inline_content) {
                tidy_inlines(children)
            } else {
                let mut blocks = tidy_blocks(children);
                // a lone paragraph collapses into its parent, as in markdown
                if let [Node::Element(only)] = blocks.as_mut_slice()
                    && only.kind == ElementKind::Paragraph
                {
                    std::mem::take(&mut only.children)
                } else {
                    blocks
                }
            };
            let children = if children.is_empty() {
                vec![Node::text("")]
            } else {
                children
            };
            Some(Node::element(kind, children))
        }
        ElementKind::BulletedList | ElementKind::NumberedList { .. } => {
            let items: Vec<Node> = tidy_blocks(children)
                .into_iter()
                .map(|child| {
                    if child.kind() == Some(&ElementKind::ListItem) {
                        child
                    } else {
                        Node::element(ElementKind::ListItem, vec![child])
                    }
                })
                .collect();
            (!items.is_empty()).then(|| Node::element(kind, items))
        }
        ElementKind::Clause { .. } => {
            let children = tidy_blocks(children);
            let children = if children.is_empty() {
                vec![Node::paragraph("")]
            } else {
                children
            };
            Some(Node::element(kind, children))
        }
        _ => Some(Node::element(kind, children)),
    }
}

/// Wrap runs of inline content into paragraphs; drop whitespace-only runs.
fn tidy_blocks(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for child in children {
        if child.is_inline_content() {
            run.push(child);
        } else {
            flush_inline_run(&mut run, &mut out);
            out.push(child);
        }
    }
    flush_inline_run(&mut run, &mut out);
    out
}

fn flush_inline_run(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    let inlines = tidy_inlines(std::mem::take(run));
    if !inlines.is_empty() {
        out.push(Node::element(ElementKind::Paragraph, inlines));
    }
}

/// Merge equal-mark neighbours, trim the run's outer whitespace, drop
/// empty texts.
fn tidy_inlines(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    for child in children {
        if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &child)
            && prev.marks == next.marks
        {
            prev.text.push_str(&next.text);
            continue;
        }
        out.push(child);
    }
    if let Some(Node::Text(first)) = out.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(Node::Text(last)) = out.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    out.retain(|node| node.as_text().is_none_or(|t| !t.text.is_empty()));
    if out
        .iter()
        .all(|n| n.as_element().is_none() && n.string().is_empty())
    {
        return Vec::new();
    }
    out
}
