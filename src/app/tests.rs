use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tempfile::tempdir;

use super::event_loop::use_keyboard_enhancement;
use super::{App, Message, Model, ToastLevel, update};
use crate::component::MatchMode;

fn create_test_model() -> Model {
    Model::new(PathBuf::from("test.md"), "# Test\n\nHello world")
}

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(mut model: Model, text: &str) -> Model {
    for c in text.chars() {
        model = update(model, key(KeyCode::Char(c)));
    }
    model
}

fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol())
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[test]
fn test_typing_marks_model_dirty() {
    let model = create_test_model();
    assert!(!model.is_dirty());
    let model = update(model, key(KeyCode::End));
    assert!(!model.is_dirty());
    let model = type_text(model, "!");
    assert!(model.is_dirty());
    assert_eq!(model.markdown(), "# Test!\n\nHello world\n");
}

#[test]
fn test_quit_sets_should_quit() {
    let model = create_test_model();
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_with_unsaved_changes_asks_twice() {
    let model = type_text(create_test_model(), "x");
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));

    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_other_messages_reset_quit_confirmation() {
    let model = type_text(create_test_model(), "x");
    let model = update(model, Message::Quit);
    let model = update(model, key(KeyCode::Left));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
}

#[test]
fn test_save_writes_markdown_and_clears_dirty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "Draft\n").unwrap();

    let model = Model::load_file(&path).unwrap();
    let model = update(model, key(KeyCode::End));
    let model = type_text(model, " two");
    assert!(model.is_dirty());

    let model = update(model, Message::Save);
    assert!(!model.is_dirty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Draft two\n");
    assert_eq!(
        model.active_toast(),
        Some(("Saved notes.md", ToastLevel::Info))
    );
}

#[test]
fn test_save_over_outside_edit_needs_confirmation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "Original\n").unwrap();

    let model = Model::load_file(&path).unwrap();
    std::fs::write(&path, "Changed elsewhere\n").unwrap();

    let model = update(model, Message::Save);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Changed elsewhere\n");
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));

    let model = update(model, Message::Save);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Original\n");
    assert_eq!(
        model.active_toast(),
        Some(("Saved notes.md", ToastLevel::Info))
    );
}

#[test]
fn test_missing_file_starts_empty_and_is_created_on_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.md");
    let model = Model::load_file(&path).unwrap();
    assert_eq!(model.markdown(), "");

    let model = type_text(model, "Fresh");
    let _ = update(model, Message::Save);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Fresh\n");
}

#[test]
fn test_read_only_save_is_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixed.md");
    std::fs::write(&path, "Fixed\n").unwrap();
    let model = Model::load_file(&path)
        .unwrap()
        .with_editor(|editor| editor.with_read_only(true));
    let model = type_text(model, "zzz");
    assert!(!model.is_dirty());
    let model = update(model, Message::Save);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Info));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Fixed\n");
}

#[test]
fn test_paste_message_inserts_text() {
    let model = Model::new(PathBuf::from("p.md"), "");
    let model = update(model, Message::Paste("from terminal".into()));
    assert_eq!(model.markdown(), "from terminal\n");
}

#[test]
fn test_toast_lifecycle() {
    let mut model = create_test_model();
    model.show_toast(ToastLevel::Error, "boom");
    assert_eq!(model.active_toast(), Some(("boom", ToastLevel::Error)));
    assert!(!model.expire_toast(Instant::now()));
    assert!(model.expire_toast(Instant::now() + Duration::from_secs(5)));
    assert!(model.active_toast().is_none());
}

#[test]
fn test_app_keys_are_not_sent_to_editor() {
    let ctrl = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    assert_eq!(App::handle_event(ctrl('s')), Some(Message::Save));
    assert_eq!(App::handle_event(ctrl('q')), Some(Message::Quit));
    assert!(matches!(App::handle_event(ctrl('b')), Some(Message::Key(_))));
    assert_eq!(
        App::handle_event(Event::Paste("x".into())),
        Some(Message::Paste("x".into()))
    );
}

#[test]
fn test_configure_applies_app_options() {
    let app = App::new(PathBuf::from("doc.md"))
        .with_read_only(true)
        .with_placeholder(Some("Nothing yet".into()))
        .with_match_mode(MatchMode::AllMatches)
        .with_system_clipboard(false);
    let model = Model::new(PathBuf::from("doc.md"), "").with_editor(|editor| app.configure(editor));
    assert!(model.editor.is_read_only());
    assert_eq!(model.editor.placeholder(), "Nothing yet");
    assert_eq!(model.editor.match_mode(), MatchMode::AllMatches);
}

#[test]
fn test_view_draws_editor_and_status_bar() {
    let mut model = create_test_model();
    let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
    terminal
        .draw(|frame| App::view(&mut model, frame))
        .unwrap();
    assert!(row_text(&terminal, 0).starts_with("[B]"));
    assert!(row_text(&terminal, 1).contains("Test"));
    assert!(row_text(&terminal, 7).starts_with(" test.md"));

    model.show_toast(ToastLevel::Warning, "careful");
    terminal
        .draw(|frame| App::view(&mut model, frame))
        .unwrap();
    assert_eq!(row_text(&terminal, 7), "[warn] careful");
}

#[test]
fn test_keyboard_enhancement_only_when_the_terminal_answers_yes() {
    assert!(use_keyboard_enhancement(Ok(true)));
    assert!(!use_keyboard_enhancement(Ok(false)));
    assert!(!use_keyboard_enhancement(Err(std::io::Error::other("no reply"))));
}
