//! The markdown editor component.
//!
//! [`MarkdownEditor`] wraps an [`Editor`] built once with the full plugin
//! stack and turns terminal events into editor operations:
//!
//! - key presses go through `can_key_down`, then navigation, then the
//!   hotkey table (gated by `can_be_formatted`), then input events (gated
//!   by `is_editable`)
//! - copy and cut serialize the selection to markdown and HTML
//! - every handled event drains the editor's change flag into `on_change`
//!   (never while read-only) and opens the link prompt when the selection
//!   moves into a link
//! - clause drag-and-drop is validated before anything moves
//!
//! Rendering is delegated to [`crate::ui`]; the component keeps the last
//! layout to resolve mouse positions.

mod clipboard;
mod dnd;
mod hotkeys;
mod input;
mod modal;
mod policy;


use std::fmt;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;

use crate::document::path::{Affinity, node_range};
use crate::document::{ElementKind, Node, Path, Point, Value, is_empty_value};
use crate::editor::{
    BlockCursor, DataTransfer, Direction, Editor, active_link, build_editor,
    insert_image, insert_link, selection_link_path, toggle_block, toggle_mark, unwrap_link,
};
use crate::ui::overlays::render_modal_overlay;
use crate::ui::render::{
    DocumentLayout, ElementRenderer, Renderer, layout, render_document, scroll_to,
};
use crate::ui::style::Theme;
use crate::ui::toolbar::{ToolbarHit, hit_button, render_toolbar};

pub use clipboard::{
    Clipboard, ClipboardError, MemoryClipboard, Osc52Clipboard, default_clipboard,
    selection_to_clipboard,
};
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use dnd::{DRAG_MIME, DropEffect, DropError, drag_over, drag_payload, drop_clause};
pub use hotkeys::{Hotkey, HotkeyAction, HotkeyEntry, HotkeyParseError, HotkeyTable, MatchMode};
pub use input::{EventOutcome, InputEvent};
pub use modal::{LinkField, LinkPrompt, Modal, ModalOutcome};
pub use policy::Policy;

pub const DEFAULT_PLACEHOLDER: &str = "Enter some rich text...";

/// Rows moved by PageUp/PageDown when nothing has been rendered yet.
const DEFAULT_PAGE_ROWS: usize = 10;
const SCROLL_STEP: usize = 3;

pub type OnChange = Box<dyn FnMut(&Value, &Editor)>;

/// Screen geometry from the last render.
#[derive(Debug, Default)]
struct ViewState {
    toolbar: Option<Rect>,
    hits: Vec<ToolbarHit>,
    body: Rect,
    layout: DocumentLayout,
}

pub struct MarkdownEditor {
    editor: Editor,
    on_change: OnChange,
    read_only: bool,
    policy: Policy,
    hotkeys: HotkeyTable,
    match_mode: MatchMode,
    placeholder: String,
    active_button: Style,
    renderer: Renderer,
    renderer_generation: u64,
    clipboard: Box<dyn Clipboard>,
    modal: Option<Modal>,
    /// Link the selection was last seen in.
    last_link: Option<Path>,
    drag: Option<DataTransfer>,
    scroll: usize,
    follow_cursor: bool,
    view: ViewState,
}

impl fmt::Debug for MarkdownEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownEditor")
            .field("editor", &self.editor)
            .field("read_only", &self.read_only)
            .field("match_mode", &self.match_mode)
            .field("clipboard", &self.clipboard.name())
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

impl MarkdownEditor {
    /// Build the editor for `value`. `on_change` receives the document and
    /// the editor after every change while the component is editable.
    pub fn new(value: Value, on_change: impl FnMut(&Value, &Editor) + 'static) -> Self {
        let mut editor = build_editor(None);
        editor.reset(value);
        Self {
            editor,
            on_change: Box::new(on_change),
            read_only: false,
            policy: Policy::default(),
            hotkeys: HotkeyTable::default(),
            match_mode: MatchMode::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            active_button: Theme::active_button(),
            renderer: Renderer::default(),
            renderer_generation: 0,
            clipboard: Box::new(MemoryClipboard::new()),
            modal: None,
            last_link: None,
            drag: None,
            scroll: 0,
            follow_cursor: true,
            view: ViewState::default(),
        }
    }

    // --- Builders ---

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.set_read_only(read_only);
        self
    }

    /// Layer extra capabilities onto the editor. The function receives the
    /// fully built editor and must return it; the document is normalized
    /// again under the new plugins.
    #[must_use]
    pub fn with_augment_editor(mut self, augment: impl FnOnce(Editor) -> Editor + 'static) -> Self {
        let value = self.editor.value().clone();
        let editor = std::mem::take(&mut self.editor);
        self.editor = augment(editor);
        self.editor.reset(value);
        tracing::debug!(editor = %self.editor.id(), plugins = ?self.editor.plugin_names(), "augmented");
        self
    }

    #[must_use]
    pub fn with_custom_elements(mut self, custom_elements: Vec<ElementRenderer>) -> Self {
        self.set_custom_elements(custom_elements);
        self
    }

    /// Replace the whole renderer, leaf renderer included.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self.renderer_generation += 1;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub const fn with_active_button(mut self, style: Style) -> Self {
        self.active_button = style;
        self
    }

    #[must_use]
    pub fn with_hotkeys(mut self, hotkeys: HotkeyTable) -> Self {
        for (hotkey, actions) in hotkeys.overlaps() {
            tracing::debug!(%hotkey, ?actions, "hotkey bound more than once");
        }
        self.hotkeys = hotkeys;
        self
    }

    #[must_use]
    pub const fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    // --- Props ---

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.modal = None;
            self.drag = None;
        }
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub const fn set_active_button(&mut self, style: Style) {
        self.active_button = style;
    }

    /// Swap the custom element renderers. Only the renderer is rebuilt.
    pub fn set_custom_elements(&mut self, custom_elements: Vec<ElementRenderer>) {
        self.renderer.set_custom_elements(custom_elements);
        self.renderer_generation += 1;
    }

    /// Replace the document without notifying `on_change`.
    pub fn set_value(&mut self, value: Value) {
        self.editor.reset(value);
        self.last_link = None;
        self.scroll = 0;
    }

    // --- Accessors ---

    pub const fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn value(&self) -> &Value {
        self.editor.value()
    }

    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub const fn toolbar_visible(&self) -> bool {
        !self.read_only
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub const fn active_button(&self) -> Style {
        self.active_button
    }

    pub const fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub const fn show_link_modal(&self) -> bool {
        matches!(self.modal, Some(Modal::Link(_)))
    }

    pub const fn hotkeys(&self) -> &HotkeyTable {
        &self.hotkeys
    }

    pub const fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub const fn renderer_generation(&self) -> u64 {
        self.renderer_generation
    }

    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Run `f` against the editor, then report any change like an event.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let result = f(&mut self.editor);
        self.flush_change();
        result
    }

    /// Put the cursor at the start of the document if nothing is selected.
    pub fn focus(&mut self) {
        if self.editor.selection().is_none() {
            self.editor.move_to_start();
            self.flush_change();
        }
    }

    // --- Change propagation ---

    fn flush_change(&mut self) {
        let Some(change) = self.editor.take_change() else {
            return;
        };
        if self.read_only {
            tracing::trace!(editor = %self.editor.id(), ?change, "read-only, change ignored");
            return;
        }
        (self.on_change)(self.editor.value(), &self.editor);
        let link = selection_link_path(&self.editor);
        if link.is_some() && link != self.last_link && self.modal.is_none() {
            self.open_link_modal();
        }
        self.last_link = link;
    }

    // --- Keyboard ---

    pub fn handle_key(&mut self, key: KeyEvent) -> EventOutcome {
        if key.kind == KeyEventKind::Release {
            return EventOutcome::Ignored;
        }
        if self.modal.is_some() {
            return self.handle_modal_key(&key);
        }
        if !self.policy.can_key_down(&self.editor, &key) {
            tracing::debug!(?key, "key down denied");
            return EventOutcome::Prevented;
        }
        self.follow_cursor = true;
        if self.editor.selection().is_none() {
            self.editor.move_to_start();
        }
        if self.navigate(&key) {
            self.flush_change();
            return EventOutcome::Handled;
        }
        if !self.read_only {
            let actions = self.hotkeys.matching(&key);
            if !actions.is_empty() {
                return self.run_hotkeys(&actions);
            }
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::SHIFT) {
            match key.code {
                KeyCode::Char('c') => return self.copy(),
                KeyCode::Char('x') => return self.cut(),
                KeyCode::Char('v') => return self.paste(),
                _ => {}
            }
        }
        // Flush the selection placed above, if any.
        self.flush_change();
        InputEvent::from_key(&key).map_or(EventOutcome::Ignored, |input| self.handle_input(input))
    }

    fn run_hotkeys(&mut self, actions: &[HotkeyAction]) -> EventOutcome {
        if actions.iter().any(|a| a.is_formatting()) && !self.policy.can_be_formatted(&self.editor) {
            tracing::debug!(?actions, "formatting denied");
            return EventOutcome::Prevented;
        }
        let run = match self.match_mode {
            MatchMode::FirstMatch => &actions[..1],
            MatchMode::AllMatches => actions,
        };
        for action in run {
            tracing::debug!(
                editor = %self.editor.id(),
                category = action.category(),
                ?action,
                "hotkey"
            );
            self.run_action(*action);
        }
        self.flush_change();
        EventOutcome::Handled
    }

    fn run_action(&mut self, action: HotkeyAction) {
        match action {
            HotkeyAction::Mark(mark) => toggle_mark(&mut self.editor, mark),
            HotkeyAction::Block(format) => toggle_block(&mut self.editor, format),
            HotkeyAction::Image => self.modal = Some(Modal::Image { url: String::new() }),
            HotkeyAction::Undo => self.editor.undo(),
            HotkeyAction::Redo => self.editor.redo(),
            HotkeyAction::Link => self.open_link_modal(),
        }
    }

    /// Arrow keys, Home/End, PageUp/PageDown and select-all. Returns whether
    /// the key was one of them.
    fn navigate(&mut self, key: &KeyEvent) -> bool {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        let by_word = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Left if by_word => self.editor.move_word_left(extend),
            KeyCode::Right if by_word => self.editor.move_word_right(extend),
            KeyCode::Left => self.editor.move_cursor(Direction::Left, extend),
            KeyCode::Right => self.editor.move_cursor(Direction::Right, extend),
            KeyCode::Up => self.move_rows(-1, extend),
            KeyCode::Down => self.move_rows(1, extend),
            KeyCode::PageUp => self.move_rows(-self.page_rows(), extend),
            KeyCode::PageDown => self.move_rows(self.page_rows(), extend),
            KeyCode::Home if by_word => self.editor.move_to_start(),
            KeyCode::End if by_word => self.editor.move_to_end(),
            KeyCode::Home => self.editor.move_home(extend),
            KeyCode::End => self.editor.move_end(extend),
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.editor.select_all();
            }
            _ => return false,
        }
        true
    }

    fn page_rows(&self) -> isize {
        let rows = match usize::from(self.view.body.height) {
            0 => DEFAULT_PAGE_ROWS,
            height => height.saturating_sub(1).max(1),
        };
        isize::try_from(rows).unwrap_or(1)
    }

    /// Move the focus by screen rows using the last layout, keeping the
    /// column. Without a layout, moves by blocks.
    fn move_rows(&mut self, delta: isize, extend: bool) {
        let layout = &self.view.layout;
        let Some((row, col)) = self
            .editor
            .focus_position()
            .and_then(|(ordinal, offset)| layout.cursor(ordinal, offset))
        else {
            let direction = if delta < 0 { Direction::Up } else { Direction::Down };
            for _ in 0..delta.unsigned_abs() {
                self.editor.move_cursor(direction, extend);
            }
            return;
        };
        let last = layout.lines.len().saturating_sub(1);
        let mut target = row.saturating_add_signed(delta).min(last);
        // Skip separator rows in the direction of travel.
        while layout.lines.get(target).is_some_and(|l| l.block.is_none()) {
            match target.checked_add_signed(delta.signum()) {
                Some(next) if next <= last => target = next,
                _ => break,
            }
        }
        let position = if target == row && delta < 0 {
            Some((0, 0))
        } else if target == row && delta > 0 {
            Some((usize::MAX, usize::MAX))
        } else {
            layout.hit(target, col)
        };
        if let Some((ordinal, offset)) = position {
            self.editor.select_block_position(ordinal, offset, extend);
        }
    }

    // --- Input ---

    /// Apply an input event, subject to the read-only flag and
    /// `is_editable`.
    pub fn handle_input(&mut self, input: InputEvent) -> EventOutcome {
        if self.read_only {
            return EventOutcome::Ignored;
        }
        if !self.policy.is_editable(&self.editor, &input) {
            tracing::debug!(input = input.name(), "input denied");
            return EventOutcome::Prevented;
        }
        if self.editor.selection().is_none() {
            self.editor.move_to_start();
        }
        tracing::trace!(editor = %self.editor.id(), input = input.name(), "input");
        let editor = &mut self.editor;
        match input {
            InputEvent::InsertText(text) => editor.insert_text(&text),
            InputEvent::InsertLineBreak => editor.insert_text("\n"),
            InputEvent::InsertParagraph => editor.insert_break(),
            InputEvent::InsertFromPaste(data) | InputEvent::InsertFromDrop(data) => {
                editor.insert_data(&data);
            }
            InputEvent::DeleteContentBackward => editor.delete_backward(),
            InputEvent::DeleteContentForward => editor.delete_forward(),
            InputEvent::DeleteWordBackward => editor.delete_word_backward(),
            InputEvent::DeleteByCut => editor.delete_fragment(),
        }
        self.flush_change();
        EventOutcome::Handled
    }

    // --- Clipboard ---

    pub fn copy(&mut self) -> EventOutcome {
        self.copy_or_cut(false)
    }

    /// Copy, then delete the selection if it is expanded.
    pub fn cut(&mut self) -> EventOutcome {
        self.copy_or_cut(true)
    }

    fn copy_or_cut(&mut self, cut: bool) -> EventOutcome {
        if !self.policy.can_copy(&self.editor) {
            tracing::debug!(cut, "copy denied");
            return EventOutcome::Prevented;
        }
        let Some(data) = selection_to_clipboard(&self.editor) else {
            return EventOutcome::Ignored;
        };
        if let Err(err) = self.clipboard.write(&data) {
            tracing::warn!(clipboard = self.clipboard.name(), %err, "clipboard write failed");
        }
        let expanded = self.editor.selection().is_some_and(|s| s.is_expanded());
        if cut && expanded {
            return match self.handle_input(InputEvent::DeleteByCut) {
                EventOutcome::Prevented => EventOutcome::Prevented,
                _ => EventOutcome::Handled,
            };
        }
        EventOutcome::Handled
    }

    /// Paste the clipboard contents.
    pub fn paste(&mut self) -> EventOutcome {
        match self.clipboard.read() {
            Ok(Some(data)) => self.paste_data(data),
            Ok(None) => EventOutcome::Ignored,
            Err(err) => {
                tracing::warn!(clipboard = self.clipboard.name(), %err, "clipboard read failed");
                EventOutcome::Ignored
            }
        }
    }

    /// Paste text delivered by the terminal (bracketed paste).
    pub fn paste_text(&mut self, text: &str) -> EventOutcome {
        self.paste_data(DataTransfer::plain(text))
    }

    pub fn paste_data(&mut self, data: DataTransfer) -> EventOutcome {
        if let Some(modal) = &mut self.modal {
            modal.paste(data.get_data(crate::editor::TEXT_PLAIN).unwrap_or_default());
            return EventOutcome::Handled;
        }
        self.handle_input(InputEvent::InsertFromPaste(data))
    }

    // --- Modals ---

    fn open_link_modal(&mut self) {
        let prompt = match active_link(&self.editor) {
            Some(link) => {
                let url = match &link.kind {
                    ElementKind::Link { href, .. } => href.clone(),
                    _ => String::new(),
                };
                LinkPrompt {
                    text: link.string(),
                    url,
                    field: LinkField::Url,
                    editing: true,
                }
            }
            None => {
                let text = self
                    .editor
                    .fragment()
                    .iter()
                    .map(Node::string)
                    .collect::<Vec<_>>()
                    .join(" ");
                let field = if text.is_empty() {
                    LinkField::Text
                } else {
                    LinkField::Url
                };
                LinkPrompt {
                    text,
                    url: String::new(),
                    field,
                    editing: false,
                }
            }
        };
        tracing::debug!(editing = prompt.editing, "open link modal");
        self.modal = Some(Modal::Link(prompt));
    }

    fn handle_modal_key(&mut self, key: &KeyEvent) -> EventOutcome {
        let Some(modal) = self.modal.as_mut() else {
            return EventOutcome::Ignored;
        };
        match modal.handle_key(key) {
            ModalOutcome::Pending => {}
            ModalOutcome::Cancel => self.modal = None,
            ModalOutcome::Submit => self.submit_modal(),
        }
        EventOutcome::Handled
    }

    fn submit_modal(&mut self) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        if !self.policy.can_be_formatted(&self.editor) {
            return;
        }
        match modal {
            Modal::Image { url } => insert_image(&mut self.editor, &url),
            Modal::Link(prompt) => self.apply_link(&prompt),
        }
        // The prompt just edited this link; do not reopen it.
        self.last_link = selection_link_path(&self.editor);
        self.flush_change();
    }

    fn apply_link(&mut self, prompt: &LinkPrompt) {
        let url = prompt.url.trim();
        let editor = &mut self.editor;
        if url.is_empty() {
            if prompt.editing {
                unwrap_link(editor);
            }
            return;
        }
        let existing = prompt
            .editing
            .then(|| selection_link_path(editor))
            .flatten()
            .and_then(|path| node_range(editor.value(), &path));
        match existing {
            Some(range) => editor.transact(crate::editor::ChangeKind::Other, |editor| {
                if editor.select(range).is_ok() {
                    editor.delete_fragment();
                    insert_link(editor, url, Some(&prompt.text));
                }
            }),
            None => insert_link(editor, url, Some(&prompt.text)),
        }
    }

    // --- Drag and drop ---

    /// Start dragging the node at `path`.
    pub fn on_drag_start(&mut self, path: &[usize]) -> Option<DataTransfer> {
        if self.read_only {
            return None;
        }
        let data = drag_payload(&self.editor, path)?;
        tracing::debug!(?path, "drag start");
        self.drag = Some(data.clone());
        Some(data)
    }

    pub fn on_drag_over(&self, data: &DataTransfer) -> DropEffect {
        drag_over(data)
    }

    /// Move the dragged clause to `target`. Nothing changes on error.
    pub fn on_drop(&mut self, data: &DataTransfer, target: &Point) -> Result<(), DropError> {
        self.drag = None;
        if self.read_only
            || !self
                .policy
                .is_editable(&self.editor, &InputEvent::InsertFromDrop(data.clone()))
        {
            return Err(DropError::NotEditable);
        }
        drop_clause(&mut self.editor, data, target)?;
        self.flush_change();
        Ok(())
    }

    // --- Mouse ---

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> EventOutcome {
        if self.modal.is_some() {
            return EventOutcome::Ignored;
        }
        let at = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.follow_cursor = false;
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                EventOutcome::Handled
            }
            MouseEventKind::ScrollDown => {
                self.follow_cursor = false;
                let max = self.view.layout.lines.len().saturating_sub(1);
                self.scroll = (self.scroll + SCROLL_STEP).min(max);
                EventOutcome::Handled
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.view.toolbar.is_some_and(|r| r.contains(at)) {
                    return match hit_button(&self.view.hits, mouse.column) {
                        Some(action) => self.toolbar_action(action),
                        None => EventOutcome::Ignored,
                    };
                }
                let Some(row) = self.body_row(at) else {
                    return EventOutcome::Ignored;
                };
                if let Some(handle) = self.view.layout.lines.get(row).and_then(|l| l.drag_handle.clone()) {
                    return match self.on_drag_start(&handle) {
                        Some(_) => EventOutcome::Handled,
                        None => EventOutcome::Ignored,
                    };
                }
                self.click(row, at.x, mouse.modifiers.contains(KeyModifiers::SHIFT))
            }
            MouseEventKind::Drag(MouseButton::Left) if self.drag.is_none() => {
                let Some(row) = self.body_row(at) else {
                    return EventOutcome::Ignored;
                };
                self.click(row, at.x, true)
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(data) = self.drag.take() else {
                    return EventOutcome::Ignored;
                };
                let target = self
                    .body_row(at)
                    .and_then(|row| self.view.layout.nearest_block_row(row))
                    .and_then(|row| self.view.layout.hit(row, at.x - self.view.body.x))
                    .and_then(|(ordinal, offset)| {
                        self.editor
                            .point_for(BlockCursor { ordinal, offset }, Affinity::Backward)
                    });
                let Some(target) = target else {
                    return EventOutcome::Ignored;
                };
                match self.on_drop(&data, &target) {
                    Ok(()) => EventOutcome::Handled,
                    Err(err) => {
                        tracing::debug!(%err, "drop rejected");
                        EventOutcome::Prevented
                    }
                }
            }
            _ => EventOutcome::Ignored,
        }
    }

    fn body_row(&self, at: Position) -> Option<usize> {
        let body = self.view.body;
        body.contains(at)
            .then(|| self.scroll + usize::from(at.y - body.y))
    }

    fn click(&mut self, row: usize, x: u16, extend: bool) -> EventOutcome {
        let Some((ordinal, offset)) = self.view.layout.hit(row, x - self.view.body.x) else {
            return EventOutcome::Ignored;
        };
        self.editor.select_block_position(ordinal, offset, extend);
        self.flush_change();
        EventOutcome::Handled
    }

    fn toolbar_action(&mut self, action: HotkeyAction) -> EventOutcome {
        if self.read_only {
            return EventOutcome::Ignored;
        }
        if self.editor.selection().is_none() {
            self.editor.move_to_start();
        }
        self.run_hotkeys(&[action])
    }

    // --- Rendering ---

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let (toolbar, body) = if self.toolbar_visible() && area.height > 1 {
            (
                Some(Rect { height: 1, ..area }),
                Rect {
                    y: area.y + 1,
                    height: area.height - 1,
                    ..area
                },
            )
        } else {
            (None, area)
        };
        let theme = self.renderer.theme();
        let hits = toolbar.map_or_else(Vec::new, |toolbar| {
            let can_format = self.policy.can_be_formatted(&self.editor);
            render_toolbar(frame, toolbar, &self.editor, theme, self.active_button, can_format)
        });

        let layout = layout(&self.editor, &self.renderer, body.width);
        let cursor = self
            .editor
            .focus_position()
            .and_then(|(ordinal, offset)| layout.cursor(ordinal, offset));
        let height = usize::from(body.height);
        if self.follow_cursor
            && let Some((row, _)) = cursor
        {
            self.scroll = scroll_to(self.scroll, row, height);
        }
        self.scroll = self.scroll.min(layout.lines.len().saturating_sub(1));

        let placeholder = is_empty_value(self.editor.value())
            .then(|| (self.placeholder.as_str(), theme.placeholder));
        render_document(frame, body, &layout, self.scroll, placeholder);

        if !self.read_only
            && self.modal.is_none()
            && let Some((row, col)) = cursor
            && row >= self.scroll
            && row < self.scroll + height
        {
            let y = u16::try_from(row - self.scroll).unwrap_or(0);
            frame.set_cursor_position(Position::new(
                body.x + col.min(body.width.saturating_sub(1)),
                body.y + y,
            ));
        }
        if let Some(modal) = &self.modal {
            render_modal_overlay(modal, frame, area);
        }
        self.view = ViewState {
            toolbar,
            hits,
            body,
            layout,
        };
    }
}
