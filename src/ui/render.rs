//! Document layout and rendering delegation.
//!
//! A [`Renderer`] decides how blocks and leaves look: the element renderer
//! turns a block into a [`BlockDecoration`] (prefixes, base style, void
//! label) and the leaf renderer styles each text segment. Custom element
//! renderers are consulted before the built-in one.
//!
//! [`layout`] wraps every text block to the viewport width and records a
//! line map so the cursor can be placed and mouse clicks resolved back to
//! document positions.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthChar;

use super::style::Theme;
use crate::document::{Element, ElementKind, Marks, Node, Path, Text};
use crate::editor::Editor;

/// How a text block is drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDecoration {
    /// Prefix of the block's first line.
    pub first_prefix: String,
    /// Prefix of continuation lines.
    pub prefix: String,
    pub prefix_style: Style,
    /// Base style for the block's text.
    pub style: Style,
    /// Replaces the text of void blocks.
    pub void_label: Option<String>,
}

/// Where a block sits in the tree.
#[derive(Debug, Clone)]
pub struct BlockContext {
    /// Kinds of the enclosing elements, outermost first.
    pub ancestors: Vec<ElementKind>,
    /// Number of the innermost list item when it is in a numbered list.
    pub item_number: Option<u64>,
    /// Whether the block opens its list item (and so carries the marker).
    pub first_in_item: bool,
    pub width: u16,
}

pub type LeafRenderer = Box<dyn Fn(&str, Marks, Style) -> Span<'static>>;
pub type ElementRenderer = Box<dyn Fn(&Element, &BlockContext) -> Option<BlockDecoration>>;

pub struct Renderer {
    theme: Theme,
    render_leaf: Option<LeafRenderer>,
    custom_elements: Vec<ElementRenderer>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("custom_elements", &self.custom_elements.len())
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Renderer {
    pub const fn new(theme: Theme) -> Self {
        Self {
            theme,
            render_leaf: None,
            custom_elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_leaf_renderer(mut self, render_leaf: LeafRenderer) -> Self {
        self.render_leaf = Some(render_leaf);
        self
    }

    #[must_use]
    pub fn with_custom_elements(mut self, custom_elements: Vec<ElementRenderer>) -> Self {
        self.custom_elements = custom_elements;
        self
    }

    pub fn set_custom_elements(&mut self, custom_elements: Vec<ElementRenderer>) {
        self.custom_elements = custom_elements;
    }

    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn render_leaf(&self, text: &str, marks: Marks, base: Style) -> Span<'static> {
        match &self.render_leaf {
            Some(render) => render(text, marks, base),
            None => Span::styled(text.to_string(), self.theme.marks(base, marks, false)),
        }
    }

    pub fn render_element(&self, element: &Element, ctx: &BlockContext) -> BlockDecoration {
        self.custom_elements
            .iter()
            .find_map(|render| render(element, ctx))
            .unwrap_or_else(|| self.default_element(element, ctx))
    }

    fn default_element(&self, element: &Element, ctx: &BlockContext) -> BlockDecoration {
        let theme = &self.theme;
        let mut first = String::new();
        let mut rest = String::new();
        let chain: Vec<&ElementKind> = ctx
            .ancestors
            .iter()
            .chain((element.kind == ElementKind::ListItem).then_some(&element.kind))
            .collect();
        let innermost_item = chain.iter().rposition(|k| **k == ElementKind::ListItem);
        for (idx, kind) in chain.iter().enumerate() {
            match kind {
                ElementKind::BlockQuote => {
                    first.push_str("│ ");
                    rest.push_str("│ ");
                }
                ElementKind::Clause { .. } => {
                    first.push_str("┃ ");
                    rest.push_str("┃ ");
                }
                ElementKind::ListItem => {
                    let marker = ctx
                        .item_number
                        .map_or_else(|| "• ".to_string(), |n| format!("{n}. "));
                    let pad = " ".repeat(marker.chars().count());
                    if Some(idx) == innermost_item && ctx.first_in_item {
                        first.push_str(&marker);
                    } else {
                        first.push_str(&pad);
                    }
                    rest.push_str(&pad);
                }
                _ => {}
            }
        }
        let prefix_style = if innermost_item.is_some() {
            theme.list_marker
        } else if ctx.ancestors.contains(&ElementKind::BlockQuote) {
            theme.quote
        } else {
            theme.clause
        };
        let mut style = theme.block(&element.kind);
        if ctx.ancestors.contains(&ElementKind::BlockQuote) {
            style = theme.quote.patch(style);
        }
        let void_label = match &element.kind {
            ElementKind::Image { href, title, alt } => Some(format!(
                "[image: {}]",
                Some(alt.as_str())
                    .filter(|a| !a.is_empty())
                    .or_else(|| title.as_deref().filter(|t| !t.is_empty()))
                    .unwrap_or(href)
            )),
            ElementKind::HorizontalRule => {
                let used = first.chars().count();
                Some("─".repeat(usize::from(ctx.width).saturating_sub(used).max(3)))
            }
            _ => None,
        };
        if matches!(element.kind, ElementKind::CodeBlock { .. }) {
            first.push_str("  ");
            rest.push_str("  ");
        }
        BlockDecoration {
            first_prefix: first,
            prefix: rest,
            prefix_style,
            style,
            void_label,
        }
    }
}

/// One screen row of the laid-out document.
#[derive(Debug, Clone, Default)]
pub struct LayoutLine {
    pub spans: Vec<Span<'static>>,
    /// Text block ordinal this row shows part of.
    pub block: Option<usize>,
    /// Char offset (within the block) of the row's first char.
    pub start: usize,
    pub prefix_width: u16,
    /// Display width of each char on the row.
    pub widths: Vec<u16>,
    /// Set on a clause's header row: the clause path, for dragging.
    pub drag_handle: Option<Path>,
}

impl LayoutLine {
    fn blank() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    pub lines: Vec<LayoutLine>,
    pub width: u16,
}

impl DocumentLayout {
    /// Row and column of a (block ordinal, offset) position.
    pub fn cursor(&self, ordinal: usize, offset: usize) -> Option<(usize, u16)> {
        let (row, line) = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.block == Some(ordinal) && line.start <= offset)
            .last()?;
        let upto = (offset - line.start).min(line.len());
        let col = line.prefix_width + line.widths[..upto].iter().sum::<u16>();
        Some((row, col))
    }

    /// Document position under a row and column.
    pub fn hit(&self, row: usize, col: u16) -> Option<(usize, usize)> {
        let line = self.lines.get(row)?;
        let ordinal = line.block?;
        let mut x = line.prefix_width;
        for (idx, width) in line.widths.iter().enumerate() {
            if col < x + width.div_ceil(2).max(1) {
                return Some((ordinal, line.start + idx));
            }
            x += width;
        }
        Some((ordinal, line.start + line.len()))
    }

    /// First row of a block, for drop targets on separator rows.
    pub fn nearest_block_row(&self, row: usize) -> Option<usize> {
        (row..self.lines.len())
            .find(|r| self.lines[*r].block.is_some())
            .or_else(|| (0..row).rev().find(|r| self.lines[*r].block.is_some()))
    }
}

type DocPosition = (usize, usize);

/// Lay out the editor's document for a viewport `width` columns wide.
pub fn layout(editor: &Editor, renderer: &Renderer, width: u16) -> DocumentLayout {
    let selection = editor
        .selection()
        .filter(|s| s.is_expanded())
        .and_then(|_| {
            let anchor = editor.anchor_position()?;
            let focus = editor.focus_position()?;
            Some(if anchor <= focus { (anchor, focus) } else { (focus, anchor) })
        });
    let mut builder = LayoutBuilder {
        editor,
        renderer,
        width: width.max(1),
        selection,
        ordinal: 0,
        lines: Vec::new(),
    };
    let mut path = Vec::new();
    let mut ancestors = Vec::new();
    builder.walk(editor.value(), &mut path, &mut ancestors);
    DocumentLayout {
        lines: builder.lines,
        width,
    }
}

struct LayoutBuilder<'a> {
    editor: &'a Editor,
    renderer: &'a Renderer,
    width: u16,
    selection: Option<(DocPosition, DocPosition)>,
    ordinal: usize,
    lines: Vec<LayoutLine>,
}

impl<'a> LayoutBuilder<'a> {
    fn walk(&mut self, nodes: &'a [Node], path: &mut Path, ancestors: &mut Vec<(&'a Element, usize)>) {
        let top_level = ancestors.is_empty();
        for (idx, node) in nodes.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if el.kind.is_inline() {
                continue;
            }
            if top_level && idx > 0 {
                self.lines.push(LayoutLine::blank());
            }
            path.push(idx);
            if el.has_inline_children() {
                self.block(el, idx, ancestors);
            } else if let ElementKind::Clause { name } = &el.kind {
                self.clause_fence(format!("┌─ clause: {name}"), Some(path.clone()));
                ancestors.push((el, idx));
                self.walk(&el.children, path, ancestors);
                ancestors.pop();
                self.clause_fence("└─".to_string(), None);
            } else {
                ancestors.push((el, idx));
                self.walk(&el.children, path, ancestors);
                ancestors.pop();
            }
            path.pop();
        }
    }

    fn clause_fence(&mut self, label: String, drag_handle: Option<Path>) {
        let style = self.renderer.theme().clause;
        self.lines.push(LayoutLine {
            spans: vec![Span::styled(label, style)],
            drag_handle,
            ..LayoutLine::default()
        });
    }

    fn context(&self, el: &'a Element, index: usize, ancestors: &[(&'a Element, usize)]) -> BlockContext {
        let mut chain = ancestors.to_vec();
        chain.push((el, index));
        let item = chain.iter().rposition(|(el, _)| el.kind == ElementKind::ListItem);
        let item_number = item.and_then(|pos| {
            let list = pos.checked_sub(1).map(|p| &chain[p].0.kind)?;
            match list {
                ElementKind::NumberedList { start } => Some(start + chain[pos].1 as u64),
                _ => None,
            }
        });
        let first_in_item = el.kind == ElementKind::ListItem
            || (index == 0
                && ancestors
                    .last()
                    .is_some_and(|(el, _)| el.kind == ElementKind::ListItem));
        BlockContext {
            ancestors: ancestors.iter().map(|(el, _)| el.kind.clone()).collect(),
            item_number,
            first_in_item,
            width: self.width,
        }
    }

    fn selected(&self, position: DocPosition) -> bool {
        self.selection
            .is_some_and(|(start, end)| start <= position && position < end)
    }

    fn block(&mut self, el: &'a Element, index: usize, ancestors: &[(&'a Element, usize)]) {
        let ordinal = self.ordinal;
        self.ordinal += 1;
        let ctx = self.context(el, index, ancestors);
        let deco = self.renderer.render_element(el, &ctx);
        let theme = self.renderer.theme();
        let first_width = str_width(&deco.first_prefix);

        if self.editor.is_void(el) {
            let label = deco.void_label.clone().unwrap_or_default();
            let mut style = deco.style;
            if self.selected((ordinal, 0)) {
                style = style.patch(theme.selection);
            }
            self.lines.push(LayoutLine {
                spans: vec![
                    Span::styled(deco.first_prefix.clone(), deco.prefix_style),
                    Span::styled(label, style),
                ],
                block: Some(ordinal),
                prefix_width: first_width,
                ..LayoutLine::default()
            });
            return;
        }

        let mut cells: Vec<(char, Style)> = Vec::new();
        let mut leaves = Vec::new();
        collect_leaves(&el.children, deco.style, theme, &mut leaves);
        for (text, base) in leaves {
            let span = self.renderer.render_leaf(&text.text, text.marks, base);
            let style = span.style;
            // A leaf renderer may only restyle; it cannot change the text.
            if span.content.chars().count() == text.char_len() {
                cells.extend(span.content.chars().map(|c| (c, style)));
            } else {
                cells.extend(text.text.chars().map(|c| (c, style)));
            }
        }
        for (idx, cell) in cells.iter_mut().enumerate() {
            if self.selected((ordinal, idx)) {
                cell.1 = cell.1.patch(theme.selection);
            }
        }

        let rest_width = str_width(&deco.prefix);
        let avail = usize::from(self.width.saturating_sub(first_width.max(rest_width)).max(1));
        for (row, (start, end)) in wrap(&cells, avail).into_iter().enumerate() {
            let (prefix, prefix_width) = if row == 0 {
                (deco.first_prefix.clone(), first_width)
            } else {
                (deco.prefix.clone(), rest_width)
            };
            let mut spans = vec![Span::styled(prefix, deco.prefix_style)];
            spans.extend(group_cells(&cells[start..end]));
            self.lines.push(LayoutLine {
                spans,
                block: Some(ordinal),
                start,
                prefix_width,
                widths: cells[start..end].iter().map(|(c, _)| char_width(*c)).collect(),
                drag_handle: None,
            });
        }
    }
}

fn collect_leaves<'a>(
    nodes: &'a [Node],
    base: Style,
    theme: &Theme,
    out: &mut Vec<(&'a Text, Style)>,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push((text, base)),
            Node::Element(el) => {
                let base = match el.kind {
                    ElementKind::Link { .. } => base.patch(theme.link),
                    ElementKind::InlineImage { .. } => base.patch(theme.image),
                    _ => base,
                };
                collect_leaves(&el.children, base, theme, out);
            }
        }
    }
}

fn char_width(c: char) -> u16 {
    u16::try_from(c.width().unwrap_or(0)).unwrap_or(1)
}

fn str_width(s: &str) -> u16 {
    s.chars().map(char_width).sum()
}

/// Split cells into rows of at most `avail` columns, preferring to break
/// after a space. A newline ends its row and is not part of either row.
fn wrap(cells: &[(char, Style)], avail: usize) -> Vec<(usize, usize)> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut col = 0;
    let mut last_space: Option<usize> = None;
    let mut idx = 0;
    while idx < cells.len() {
        let c = cells[idx].0;
        if c == '\n' {
            rows.push((start, idx));
            start = idx + 1;
            col = 0;
            last_space = None;
            idx += 1;
            continue;
        }
        let width = usize::from(char_width(c));
        if col + width > avail && idx > start {
            let brk = match last_space {
                Some(space) if space >= start => space + 1,
                _ => idx,
            };
            rows.push((start, brk));
            start = brk;
            col = cells[brk..idx].iter().map(|(c, _)| usize::from(char_width(*c))).sum();
            last_space = None;
            continue;
        }
        if c == ' ' {
            last_space = Some(idx);
        }
        col += width;
        idx += 1;
    }
    rows.push((start, cells.len()));
    rows
}

/// Merge runs of equally styled cells into spans.
fn group_cells(cells: &[(char, Style)]) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut current_style: Option<Style> = None;
    for (c, style) in cells {
        if current_style.is_some_and(|s| s != *style) {
            spans.push(Span::styled(std::mem::take(&mut current), current_style.unwrap_or_default()));
        }
        current_style = Some(*style);
        current.push(*c);
    }
    if let Some(style) = current_style {
        spans.push(Span::styled(current, style));
    }
    spans
}

/// New scroll offset keeping `cursor_row` inside a viewport `height` rows
/// tall.
pub const fn scroll_to(scroll: usize, cursor_row: usize, height: usize) -> usize {
    if height == 0 || cursor_row < scroll {
        cursor_row
    } else if cursor_row >= scroll + height {
        cursor_row + 1 - height
    } else {
        scroll
    }
}

/// Draw the visible rows of `layout`. With a `placeholder`, the document
/// is empty and the hint is drawn in its place.
pub fn render_document(
    frame: &mut Frame,
    area: Rect,
    layout: &DocumentLayout,
    scroll: usize,
    placeholder: Option<(&str, Style)>,
) {
    if let Some((text, style)) = placeholder {
        frame.render_widget(Paragraph::new(Line::styled(text.to_string(), style)), area);
        return;
    }
    let visible: Vec<Line> = layout
        .lines
        .iter()
        .skip(scroll)
        .take(usize::from(area.height))
        .map(|line| Line::from(line.spans.clone()))
        .collect();
    frame.render_widget(Paragraph::new(visible), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markdown_to_value;
    use crate::editor::build_editor;

    fn laid_out(markdown: &str, width: u16) -> DocumentLayout {
        let mut editor = build_editor(None);
        editor.reset(markdown_to_value(markdown));
        layout(&editor, &Renderer::default(), width)
    }

    fn row_text(line: &LayoutLine) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_prefers_spaces() {
        let cells: Vec<_> = "hello big world".chars().map(|c| (c, Style::default())).collect();
        assert_eq!(wrap(&cells, 10), vec![(0, 10), (10, 15)]);
    }

    #[test]
    fn test_wrap_hard_breaks_long_words() {
        let cells: Vec<_> = "abcdefgh".chars().map(|c| (c, Style::default())).collect();
        assert_eq!(wrap(&cells, 3), vec![(0, 3), (3, 6), (6, 8)]);
    }

    #[test]
    fn test_wrap_newline_ends_row() {
        let cells: Vec<_> = "ab\ncd".chars().map(|c| (c, Style::default())).collect();
        assert_eq!(wrap(&cells, 10), vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn test_blocks_are_separated_and_prefixed() {
        let layout = laid_out("# Title\n\n- one\n- two\n\n> quoted", 40);
        let rows: Vec<String> = layout.lines.iter().map(row_text).collect();
        assert_eq!(rows, vec!["Title", "", "• one", "• two", "", "│ quoted"]);
    }

    #[test]
    fn test_numbered_items_count_from_start() {
        let layout = laid_out("3. three\n4. four", 40);
        let rows: Vec<String> = layout.lines.iter().map(row_text).collect();
        assert_eq!(rows, vec!["3. three", "4. four"]);
    }

    #[test]
    fn test_cursor_and_hit_agree() {
        let layout = laid_out("- hello world", 9);
        // "• " prefix leaves 7 columns: "hello " / "world"
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.cursor(0, 8), Some((1, 4)));
        assert_eq!(layout.hit(1, 4), Some((0, 8)));
        assert_eq!(layout.hit(0, 0), Some((0, 0)));
        assert_eq!(layout.hit(1, 30), Some((0, 11)));
    }

    #[test]
    fn test_clause_header_carries_drag_handle() {
        let layout = laid_out("{{#clause fee}}\nLate fee.\n{{/clause}}", 40);
        assert_eq!(row_text(&layout.lines[0]), "┌─ clause: fee");
        assert_eq!(layout.lines[0].drag_handle, Some(vec![0]));
        assert_eq!(row_text(&layout.lines[1]), "┃ Late fee.");
        assert_eq!(layout.nearest_block_row(0), Some(1));
    }

    #[test]
    fn test_custom_elements_take_precedence() {
        let mut editor = build_editor(None);
        editor.reset(markdown_to_value("# Title"));
        let renderer = Renderer::default().with_custom_elements(vec![Box::new(|el, _| {
            matches!(el.kind, ElementKind::Heading { .. }).then(|| BlockDecoration {
                first_prefix: "H> ".into(),
                ..BlockDecoration::default()
            })
        })]);
        let layout = layout(&editor, &renderer, 40);
        assert_eq!(row_text(&layout.lines[0]), "H> Title");
    }

    #[test]
    fn test_scroll_follows_cursor() {
        assert_eq!(scroll_to(0, 3, 10), 0);
        assert_eq!(scroll_to(0, 12, 10), 3);
        assert_eq!(scroll_to(5, 2, 10), 2);
    }
}
