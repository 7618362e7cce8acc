use crossterm::event::{KeyEvent, MouseEvent};

use crate::app::{Model, ToastLevel};

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Key press for the editor component
    Key(KeyEvent),
    /// Mouse event for the editor component
    Mouse(MouseEvent),
    /// Bracketed paste from the terminal
    Paste(String),
    /// Terminal resized
    Resize(u16, u16),
    /// Write the document to its file
    Save,
    /// Quit (asks again when there are unsaved changes)
    Quit,
}

/// Apply `msg` to the model.
pub fn update(mut model: Model, msg: Message) -> Model {
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }
    if !matches!(msg, Message::Save) {
        model.save_confirmed = false;
    }

    match msg {
        Message::Key(key) => {
            model.editor.handle_key(key);
        }
        Message::Mouse(mouse) => {
            model.editor.handle_mouse(mouse);
        }
        Message::Paste(text) => {
            model.editor.paste_text(&text);
        }
        // Layout is recomputed on every draw.
        Message::Resize(..) => {}
        Message::Save => save(&mut model),
        Message::Quit => {
            if model.is_dirty() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

fn save(model: &mut Model) {
    if model.editor.is_read_only() {
        model.show_toast(ToastLevel::Info, "Read-only, nothing saved");
        return;
    }
    if model.changed_on_disk() && !model.save_confirmed {
        model.show_toast(
            ToastLevel::Warning,
            "File changed on disk! Press Ctrl+S again to overwrite",
        );
        model.save_confirmed = true;
        return;
    }
    model.save_confirmed = false;
    match model.save() {
        Ok(()) => {
            let name = model
                .file_path
                .file_name()
                .map_or_else(|| "file".to_string(), |s| s.to_string_lossy().to_string());
            model.show_toast(ToastLevel::Info, format!("Saved {name}"));
        }
        Err(err) => {
            tracing::warn!(%err, "save failed");
            model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}"));
        }
    }
}
