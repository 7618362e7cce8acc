use std::cell::{Cell, RefCell};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::component::MarkdownEditor;
use crate::document::{Value, markdown_to_value, value_to_markdown};

/// Hash a byte slice for content comparison.
pub(super) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// Path to the edited file
    pub file_path: PathBuf,
    /// The editor component
    pub editor: MarkdownEditor,
    /// Maintained by the component's change callback
    dirty: Rc<Cell<bool>>,
    /// The document as last loaded or saved
    saved: Rc<RefCell<Value>>,
    /// Hash of the file as last read or written, to spot outside edits
    disk_hash: Option<u64>,
    toast: Option<Toast>,
    /// First Ctrl+Q with unsaved changes only warns
    pub quit_confirmed: bool,
    /// First Ctrl+S over a file changed on disk only warns
    pub save_confirmed: bool,
    /// Whether the app should quit
    pub should_quit: bool,
}

impl Model {
    /// Model for `source`, which was read from (or will be saved to)
    /// `file_path`.
    pub fn new(file_path: PathBuf, source: &str) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let saved = Rc::new(RefCell::new(Value::new()));
        let (flag, snapshot) = (Rc::clone(&dirty), Rc::clone(&saved));
        let editor = MarkdownEditor::new(markdown_to_value(source), move |value, _| {
            flag.set(*snapshot.borrow() != *value);
        });
        // normalized, so an untouched document compares equal
        saved.replace(editor.value().clone());
        Self {
            file_path,
            editor,
            dirty,
            saved,
            disk_hash: None,
            toast: None,
            quit_confirmed: false,
            save_confirmed: false,
            should_quit: false,
        }
    }

    /// Load `path`. A missing file starts an empty document that is created
    /// on first save.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(path.to_path_buf(), ""));
        }
        let raw_bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let source = String::from_utf8_lossy(&raw_bytes);
        let mut model = Self::new(path.to_path_buf(), &source);
        model.disk_hash = Some(hash_bytes(&raw_bytes));
        Ok(model)
    }

    /// Reconfigure the editor component.
    #[must_use]
    pub fn with_editor(mut self, configure: impl FnOnce(MarkdownEditor) -> MarkdownEditor) -> Self {
        self.editor = configure(self.editor);
        self
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// The document as it would be saved.
    pub fn markdown(&self) -> String {
        let mut markdown = value_to_markdown(self.editor.value());
        if !markdown.is_empty() {
            markdown.push('\n');
        }
        markdown
    }

    /// Hash the contents of the file on disk, `None` if it can't be read.
    pub fn file_disk_hash(&self) -> Option<u64> {
        let bytes = std::fs::read(&self.file_path).ok()?;
        Some(hash_bytes(&bytes))
    }

    /// Whether the file changed on disk since it was loaded or saved.
    pub fn changed_on_disk(&self) -> bool {
        self.disk_hash
            .is_some_and(|hash| self.file_disk_hash().is_some_and(|now| now != hash))
    }

    pub(super) fn save(&mut self) -> Result<()> {
        let markdown = self.markdown();
        std::fs::write(&self.file_path, &markdown)
            .with_context(|| format!("Failed to write {}", self.file_path.display()))?;
        self.disk_hash = Some(hash_bytes(markdown.as_bytes()));
        self.saved.replace(self.editor.value().clone());
        self.dirty.set(false);
        tracing::debug!(path = %self.file_path.display(), bytes = markdown.len(), "saved");
        Ok(())
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
