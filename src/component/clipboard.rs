//! Clipboard sinks and the copy bridge.
//!
//! Copy serializes the selected fragment three ways: markdown as
//! `text/plain`, HTML as `text/html`, and the lossless internal fragment.
//! Sinks that cannot carry every representation keep the last payload they
//! wrote so in-process pastes stay lossless.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::document::{value_to_html, value_to_markdown};
use crate::editor::{DataTransfer, Editor, TEXT_HTML, TEXT_PLAIN};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard write failed: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "system-clipboard")]
    #[error("system clipboard: {0}")]
    System(#[from] arboard::Error),
}

pub trait Clipboard {
    fn name(&self) -> &'static str;

    fn write(&mut self, data: &DataTransfer) -> Result<(), ClipboardError>;

    /// The current clipboard contents, `None` when empty.
    fn read(&mut self) -> Result<Option<DataTransfer>, ClipboardError>;
}

/// Serialize the editor's selection for the clipboard. `None` when nothing
/// is selected.
pub fn selection_to_clipboard(editor: &Editor) -> Option<DataTransfer> {
    let fragment = editor.fragment();
    if fragment.is_empty() {
        return None;
    }
    let mut data = DataTransfer::new();
    data.set_data(TEXT_PLAIN, value_to_markdown(&fragment));
    data.set_data(TEXT_HTML, value_to_html(&fragment));
    data.set_fragment(&fragment);
    Some(data)
}

/// In-memory clipboard. Clones share contents, which lets tests keep a
/// handle on what the component wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Rc<RefCell<Option<DataTransfer>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<DataTransfer> {
        self.contents.borrow().clone()
    }

    pub fn set_contents(&self, data: DataTransfer) {
        *self.contents.borrow_mut() = Some(data);
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Clipboard for MemoryClipboard {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write(&mut self, data: &DataTransfer) -> Result<(), ClipboardError> {
        self.set_contents(data.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn read(&mut self) -> Result<Option<DataTransfer>, ClipboardError> {
        Ok(self.contents())
    }
}

fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

/// Writes plain text through the OSC 52 terminal escape. Works over SSH
/// but cannot read back, so reads return the last payload written here.
pub struct Osc52Clipboard<W: Write> {
    out: W,
    last: Option<DataTransfer>,
}

impl Osc52Clipboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub const fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn write(&mut self, data: &DataTransfer) -> Result<(), ClipboardError> {
        let text = data.get_data(TEXT_PLAIN).unwrap_or_default();
        self.out.write_all(osc52_sequence(text).as_bytes())?;
        self.out.flush()?;
        self.last = Some(data.clone());
        Ok(())
    }

    fn read(&mut self) -> Result<Option<DataTransfer>, ClipboardError> {
        Ok(self.last.clone())
    }
}

/// The desktop clipboard via arboard. HTML is written with the markdown as
/// its plain-text alternative.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
    last: Option<DataTransfer>,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
            last: None,
        })
    }
}

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn write(&mut self, data: &DataTransfer) -> Result<(), ClipboardError> {
        let plain = data.get_data(TEXT_PLAIN).unwrap_or_default().to_string();
        match data.get_data(TEXT_HTML) {
            Some(html) => self.inner.set_html(html.to_string(), Some(plain))?,
            None => self.inner.set_text(plain)?,
        }
        self.last = Some(data.clone());
        Ok(())
    }

    fn read(&mut self) -> Result<Option<DataTransfer>, ClipboardError> {
        let text = match self.inner.get_text() {
            Ok(text) => text,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        // Our own copy comes back with its fragment and HTML intact.
        if let Some(last) = &self.last
            && last.get_data(TEXT_PLAIN) == Some(text.as_str())
        {
            return Ok(Some(last.clone()));
        }
        Ok((!text.is_empty()).then(|| DataTransfer::plain(text)))
    }
}

/// The best clipboard for a terminal session: the system clipboard when
/// enabled and reachable, OSC 52 otherwise.
pub fn default_clipboard(prefer_system: bool) -> Box<dyn Clipboard> {
    #[cfg(feature = "system-clipboard")]
    if prefer_system {
        match SystemClipboard::new() {
            Ok(clipboard) => return Box::new(clipboard),
            Err(err) => tracing::warn!(%err, "system clipboard unavailable, using OSC 52"),
        }
    }
    #[cfg(not(feature = "system-clipboard"))]
    let _ = prefer_system;
    Box::new(Osc52Clipboard::stdout())
}
