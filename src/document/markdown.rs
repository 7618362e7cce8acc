//! Markdown transformers: comrak AST to document value and back.
//!
//! Clause blocks use the template fence syntax
//! `{{#clause name}}` ... `{{/clause}}`, each fence on its own line.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{Arena, Options, parse_document};
use regex::Regex;
use std::sync::LazyLock;

use super::types::{Element, ElementKind, Mark, Marks, Node, Text, Value};

static CLAUSE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\{\{#clause[ \t]+[^}\s]+[ \t]*\}\}|\{\{/clause\}\})[ \t]*$")
        .unwrap_or_else(|err| unreachable!("clause fence pattern: {err}"))
});

static CLAUSE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{#clause\s+([^}\s]+)\s*\}\}$")
        .unwrap_or_else(|err| unreachable!("clause open pattern: {err}"))
});

const CLAUSE_CLOSE: &str = "{{/clause}}";

const HARD_BREAK: &str = "\\\n";

/// Comrak options shared by parsing and HTML rendering.
pub(crate) fn create_options() -> Options {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
}

/// Parse markdown into a document value.
///
/// # Example
///
/// ```
/// use markwright::document::{markdown_to_value, value_to_markdown};
///
/// let value = markdown_to_value("Hello **world**");
/// assert_eq!(value_to_markdown(&value), "Hello **world**");
/// ```
pub fn markdown_to_value(markdown: &str) -> Value {
    let source = CLAUSE_FENCE.replace_all(markdown, "\n$1\n");
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, &source, &options);

    let mut blocks = Vec::new();
    for child in root.children() {
        convert_block(child, &mut blocks);
    }
    let blocks = group_clauses(blocks);
    if blocks.is_empty() {
        vec![Node::paragraph("")]
    } else {
        blocks
    }
}

fn convert_block<'a>(node: &'a AstNode<'a>, out: &mut Vec<Node>) {
    match &node.data.borrow().value {
        NodeValue::Paragraph => convert_paragraph(node, out),
        NodeValue::Heading(heading) => {
            let children = collect_inlines(node);
            out.push(Node::element(
                ElementKind::Heading {
                    level: heading.level.clamp(1, 6),
                },
                non_empty_inlines(children),
            ));
        }
        NodeValue::BlockQuote => {
            let mut inner = Vec::new();
            for child in node.children() {
                convert_block(child, &mut inner);
            }
            out.push(collapse_single_paragraph(ElementKind::BlockQuote, inner));
        }
        NodeValue::CodeBlock(code) => {
            let info = code.info.trim();
            let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
            out.push(Node::element(
                ElementKind::CodeBlock {
                    info: (!info.is_empty()).then(|| info.to_string()),
                },
                vec![Node::text(literal)],
            ));
        }
        NodeValue::List(list) => {
            let kind = match list.list_type {
                ListType::Bullet => ElementKind::BulletedList,
                ListType::Ordered => ElementKind::NumberedList {
                    start: list.start as u64,
                },
            };
            let mut items = Vec::new();
            for child in node.children() {
                convert_block(child, &mut items);
            }
            out.push(Node::element(kind, items));
        }
        NodeValue::Item(_) => {
            let mut inner = Vec::new();
            for child in node.children() {
                convert_block(child, &mut inner);
            }
            out.push(collapse_single_paragraph(ElementKind::ListItem, inner));
        }
        NodeValue::ThematicBreak => {
            out.push(Element::void(ElementKind::HorizontalRule).into());
        }
        NodeValue::HtmlBlock(html) => {
            out.push(Node::paragraph(html.literal.trim_end()));
        }
        _ => {
            let text = extract_text(node);
            if !text.trim().is_empty() {
                out.push(Node::paragraph(text));
            }
        }
    }
}

/// A paragraph holding nothing but one image becomes an image block. Any
/// other paragraph keeps its images inline.
fn convert_paragraph<'a>(node: &'a AstNode<'a>, out: &mut Vec<Node>) {
    if let Some(image) = lone_image(node) {
        out.push(image);
        return;
    }
    let inlines = collect_inlines(node);
    let blank = inlines
        .iter()
        .all(|n| n.as_element().is_none() && n.string().trim().is_empty());
    if !blank {
        out.push(Node::element(ElementKind::Paragraph, trim_inlines(inlines)));
    }
}

fn lone_image<'a>(paragraph: &'a AstNode<'a>) -> Option<Node> {
    let mut image = None;
    for child in paragraph.children() {
        match &child.data.borrow().value {
            NodeValue::Image(link) if image.is_none() => {
                image = Some(ElementKind::Image {
                    href: link.url.clone(),
                    title: non_empty(&link.title),
                    alt: extract_text(child),
                });
            }
            NodeValue::Text(text) if text.trim().is_empty() => {}
            NodeValue::SoftBreak | NodeValue::LineBreak => {}
            _ => return None,
        }
    }
    image.map(|kind| Element::void(kind).into())
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn trim_inlines(mut inlines: Vec<Node>) -> Vec<Node> {
    if let Some(Node::Text(first)) = inlines.first_mut() {
        first.text = first.text.trim_start_matches('\n').to_string();
    }
    if let Some(Node::Text(last)) = inlines.last_mut() {
        last.text = last.text.trim_end_matches('\n').to_string();
    }
    inlines
}

fn collapse_single_paragraph(kind: ElementKind, inner: Vec<Node>) -> Node {
    match inner.as_slice() {
        [] => Node::element(kind, vec![Node::text("")]),
        [Node::Element(el)] if el.kind == ElementKind::Paragraph => {
            Node::element(kind, el.children.clone())
        }
        _ => Node::element(kind, inner),
    }
}

fn non_empty_inlines(children: Vec<Node>) -> Vec<Node> {
    if children.is_empty() {
        vec![Node::text("")]
    } else {
        children
    }
}

fn collect_inlines<'a>(node: &'a AstNode<'a>) -> Vec<Node> {
    let mut out = Vec::new();
    convert_children(node, Marks::default(), &mut out);
    merge_texts(out)
}

/// Join neighbouring texts that carry the same marks.
fn merge_texts(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &node)
            && prev.marks == next.marks
        {
            prev.text.push_str(&next.text);
            continue;
        }
        out.push(node);
    }
    out
}

fn convert_inline<'a>(node: &'a AstNode<'a>, marks: Marks, out: &mut Vec<Node>) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push(Node::marked(text.clone(), marks)),
        NodeValue::SoftBreak => out.push(Node::marked(" ", marks)),
        // a newline inside a text leaf is a hard break
        NodeValue::LineBreak => out.push(Node::marked("\n", marks)),
        NodeValue::Code(code) => {
            out.push(Node::marked(code.literal.clone(), marks.with(Mark::Code)));
        }
        NodeValue::HtmlInline(html) => out.push(Node::marked(html.clone(), marks)),
        NodeValue::Emph => convert_children(node, marks.with(Mark::Italic), out),
        NodeValue::Strong => convert_children(node, marks.with(Mark::Bold), out),
        NodeValue::Strikethrough => {
            convert_children(node, marks.with(Mark::Strikethrough), out);
        }
        NodeValue::Link(link) => {
            let mut children = Vec::new();
            convert_children(node, marks, &mut children);
            if children.is_empty() {
                children.push(Node::marked(link.url.clone(), marks));
            }
            out.push(Node::element(
                ElementKind::Link {
                    href: link.url.clone(),
                    title: non_empty(&link.title),
                },
                merge_texts(children),
            ));
        }
        NodeValue::Image(link) => {
            let mut alt = Vec::new();
            convert_children(node, marks, &mut alt);
            out.push(Node::element(
                ElementKind::InlineImage {
                    href: link.url.clone(),
                    title: non_empty(&link.title),
                },
                non_empty_inlines(merge_texts(alt)),
            ));
        }
        _ => convert_children(node, marks, out),
    }
}

fn convert_children<'a>(node: &'a AstNode<'a>, marks: Marks, out: &mut Vec<Node>) {
    for child in node.children() {
        convert_inline(child, marks, out);
    }
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(c) => text.push_str(&c.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

/// Fold `{{#clause name}}` ... `{{/clause}}` fence paragraphs into clause
/// elements. Unbalanced fences stay as plain paragraphs.
fn group_clauses(blocks: Vec<Node>) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    // (name, opening fence paragraph, collected children)
    let mut stack: Vec<(String, Node, Vec<Node>)> = Vec::new();

    for block in blocks {
        let fence = block
            .as_element()
            .filter(|el| el.kind == ElementKind::Paragraph)
            .map(|el| el.string().trim().to_string());
        if let Some(text) = fence.as_deref() {
            if let Some(caps) = CLAUSE_OPEN.captures(text) {
                stack.push((caps[1].to_string(), block, Vec::new()));
                continue;
            }
            if text == CLAUSE_CLOSE
                && let Some((name, _, children)) = stack.pop()
            {
                let children = if children.is_empty() {
                    vec![Node::paragraph("")]
                } else {
                    children
                };
                let clause = Node::element(ElementKind::Clause { name }, children);
                match stack.last_mut() {
                    Some((_, _, parent)) => parent.push(clause),
                    None => root.push(clause),
                }
                continue;
            }
        }
        match stack.last_mut() {
            Some((_, _, parent)) => parent.push(block),
            None => root.push(block),
        }
    }

    // unclosed fences: splice their content back in place
    while let Some((_, opening, children)) = stack.pop() {
        let target = match stack.last_mut() {
            Some((_, _, parent)) => parent,
            None => &mut root,
        };
        target.push(opening);
        target.extend(children);
    }
    root
}

/// Serialize a document (or fragment) to markdown. Blocks are separated by
/// a blank line; there is no trailing newline.
pub fn value_to_markdown(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(block_to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn block_to_markdown(node: &Node) -> String {
    let el = match node {
        Node::Text(text) => return escape_line_start(&text_to_markdown(text)),
        Node::Element(el) => el,
    };
    match &el.kind {
        ElementKind::Paragraph => escape_line_start(&inlines_or_blocks(el)),
        ElementKind::Link { .. } | ElementKind::InlineImage { .. } => {
            escape_line_start(&inlines_to_markdown(std::slice::from_ref(node)))
        }
        ElementKind::Heading { level } => {
            format!(
                "{} {}",
                "#".repeat(usize::from((*level).clamp(1, 6))),
                inlines_to_markdown(&el.children).replace(HARD_BREAK, " ")
            )
        }
        ElementKind::BlockQuote => prefix_lines(&inlines_or_blocks(el), "> ", "> "),
        ElementKind::CodeBlock { info } => {
            let body = el.string();
            let fence = if body.contains("```") { "~~~" } else { "```" };
            format!("{fence}{}\n{body}\n{fence}", info.as_deref().unwrap_or(""))
        }
        ElementKind::BulletedList => list_to_markdown(el, None),
        ElementKind::NumberedList { start } => list_to_markdown(el, Some(*start)),
        ElementKind::ListItem => prefix_lines(&inlines_or_blocks(el), "- ", "  "),
        ElementKind::Image { href, title, alt } => {
            let mut out = format!("![{}]", escape_text(alt));
            push_destination(&mut out, href, title.as_deref());
            out
        }
        ElementKind::HorizontalRule => "---".to_string(),
        ElementKind::Clause { name } => {
            format!(
                "{{{{#clause {name}}}}}\n{}\n{CLAUSE_CLOSE}",
                value_to_markdown(&el.children)
            )
        }
    }
}

fn inlines_or_blocks(el: &Element) -> String {
    if el.has_inline_children() || el.children.is_empty() {
        inlines_to_markdown(&el.children)
    } else {
        value_to_markdown(&el.children)
    }
}

fn list_to_markdown(list: &Element, ordered_start: Option<u64>) -> String {
    let mut items = Vec::new();
    for (idx, item) in list.children.iter().enumerate() {
        let marker = match ordered_start {
            Some(start) => format!("{}. ", start + idx as u64),
            None => "- ".to_string(),
        };
        let rest = " ".repeat(marker.len());
        let body = match item.as_element() {
            Some(el) if el.kind == ElementKind::ListItem => {
                if el.has_inline_children() || el.children.is_empty() {
                    inlines_to_markdown(&el.children)
                } else {
                    // tight item: paragraph followed by nested blocks
                    el.children
                        .iter()
                        .map(block_to_markdown)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            _ => block_to_markdown(item),
        };
        items.push(prefix_lines(&body, &marker, &rest));
    }
    items.join("\n")
}

fn prefix_lines(body: &str, first: &str, rest: &str) -> String {
    let mut out = String::new();
    for (idx, line) in body.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let prefix = if idx == 0 { first } else { rest };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    out
}

pub(crate) fn inlines_to_markdown(children: &[Node]) -> String {
    let mut out = String::new();
    push_inlines(children, &mut out);
    // A paragraph cannot end in a hard break.
    while out.ends_with(HARD_BREAK) {
        out.truncate(out.len() - HARD_BREAK.len());
    }
    out.split(HARD_BREAK)
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 {
                line.to_string()
            } else {
                escape_line_start(line)
            }
        })
        .collect::<Vec<_>>()
        .join(HARD_BREAK)
}

fn push_inlines(children: &[Node], out: &mut String) {
    for child in children {
        match child {
            Node::Text(text) => {
                let lines = text
                    .text
                    .split('\n')
                    .map(|line| text_to_markdown(&Text::marked(line, text.marks)))
                    .collect::<Vec<_>>();
                out.push_str(&lines.join(HARD_BREAK));
            }
            Node::Element(el) => match &el.kind {
                ElementKind::Link { href, title } => {
                    out.push('[');
                    push_inlines(&el.children, out);
                    out.push(']');
                    push_destination(out, href, title.as_deref());
                }
                ElementKind::InlineImage { href, title } => {
                    out.push_str("![");
                    push_inlines(&el.children, out);
                    out.push(']');
                    push_destination(out, href, title.as_deref());
                }
                _ => push_inlines(&el.children, out),
            },
        }
    }
}

fn push_destination(out: &mut String, href: &str, title: Option<&str>) {
    out.push('(');
    out.push_str(&link_destination(href));
    if let Some(title) = title {
        out.push_str(" \"");
        out.push_str(&title.replace('"', "\\\""));
        out.push('"');
    }
    out.push(')');
}

fn link_destination(href: &str) -> String {
    if href.contains([' ', '(', ')']) {
        format!("<{href}>")
    } else {
        href.to_string()
    }
}

fn text_to_markdown(text: &Text) -> String {
    let raw = text.text.as_str();
    if raw.trim().is_empty() || text.marks.is_empty() {
        return if text.marks.code && !raw.is_empty() {
            code_span(raw)
        } else {
            escape_text(raw)
        };
    }

    // Delimiters must hug non-whitespace, so surrounding spaces move outside.
    let leading = &raw[..raw.len() - raw.trim_start().len()];
    let trailing = &raw[raw.trim_end().len()..];
    let core = raw.trim();

    let mut body = if text.marks.code {
        code_span(core)
    } else {
        escape_text(core)
    };
    if text.marks.italic {
        body = format!("*{body}*");
    }
    if text.marks.bold {
        body = format!("**{body}**");
    }
    if text.marks.strikethrough {
        body = format!("~~{body}~~");
    }
    format!("{leading}{body}{trailing}")
}

fn code_span(literal: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for ch in literal.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    if literal.starts_with('`') || literal.ends_with('`') {
        format!("{fence} {literal} {fence}")
    } else {
        format!("{fence}{literal}{fence}")
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>' | '~') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape characters that would turn a paragraph line into another block.
fn escape_line_start(line: &str) -> String {
    let trimmed = line.trim_start();
    let needs_escape = trimmed.starts_with('#')
        || trimmed.starts_with('-')
        || trimmed.starts_with('+')
        || trimmed.starts_with('=')
        || trimmed.starts_with("{{");
    if needs_escape {
        let indent = line.len() - trimmed.len();
        return format!("{}\\{}", &line[..indent], trimmed);
    }
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if rest.starts_with(". ") || rest.starts_with(") ") || rest == "." || rest == ")" {
            let indent = line.len() - trimmed.len();
            return format!(
                "{}{}\\{}",
                &line[..indent],
                &trimmed[..digits],
                rest
            );
        }
    }
    line.to_string()
}
