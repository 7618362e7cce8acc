use std::io::{self, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use ratatui::DefaultTerminal;

use crate::app::{App, Model, update};
use crate::component::{MarkdownEditor, default_clipboard};

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let model = Model::load_file(&self.file_path)?.with_editor(|editor| self.configure(editor));

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - markwright requires an interactive terminal")?;
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        let enhanced = use_keyboard_enhancement(supports_keyboard_enhancement())
            && execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )
            .inspect_err(|err| tracing::warn!(%err, "could not enable keyboard enhancement"))
            .is_ok();

        let result = Self::event_loop(&mut terminal, model);

        if enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    pub(super) fn configure(&self, editor: MarkdownEditor) -> MarkdownEditor {
        let mut editor = editor
            .with_read_only(self.read_only)
            .with_match_mode(self.match_mode)
            .with_clipboard(default_clipboard(self.system_clipboard));
        if let Some(placeholder) = &self.placeholder {
            editor = editor.with_placeholder(placeholder.clone());
        }
        editor.focus();
        editor
    }

    fn event_loop(terminal: &mut DefaultTerminal, mut model: Model) -> Result<()> {
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let poll_ms = if needs_render { 0 } else { 250 };
            if event::poll(Duration::from_millis(poll_ms))? {
                if let Some(msg) = Self::handle_event(event::read()?) {
                    tracing::trace!(frame = frame_idx, ?msg, "message");
                    model = update(model, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts and pastes into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    if let Some(msg) = Self::handle_event(event::read()?) {
                        drained += 1;
                        model = update(model, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    tracing::trace!(frame = frame_idx, drained, "drained events");
                }
            }

            if model.should_quit {
                break;
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| Self::view(&mut model, frame))?;
                tracing::trace!(
                    frame = frame_idx,
                    draw_ms = draw_start.elapsed().as_secs_f64() * 1000.0,
                    "frame drawn"
                );
                needs_render = false;
            }
        }
        Ok(())
    }
}

/// Whether to ask the terminal for disambiguated key codes. Legacy encoding
/// folds Ctrl+I into Tab and drops Ctrl+digit and Ctrl+Shift+letter chords.
pub(super) fn use_keyboard_enhancement(supported: io::Result<bool>) -> bool {
    match supported {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(
                "terminal has no keyboard enhancement; Ctrl+I, Ctrl+1..3 and Ctrl+Shift hotkeys may not arrive"
            );
            false
        }
        Err(err) => {
            tracing::warn!(%err, "keyboard enhancement query failed");
            false
        }
    }
}
