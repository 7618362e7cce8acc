//! End-to-end checks of the editor component through its public API.

use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proptest::prelude::*;

use markwright::component::{EventOutcome, MarkdownEditor, MemoryClipboard, Policy};
use markwright::document::{ElementKind, Mark, Node, Point, markdown_to_value, value_to_markdown};
use markwright::editor::{TEXT_HTML, TEXT_PLAIN, build_editor, toggle_mark};

const CONTRACT: &str = include_str!("fixtures/contract.md");

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn clause_names(value: &[Node]) -> Vec<String> {
    value
        .iter()
        .filter_map(|node| match node.kind() {
            Some(ElementKind::Clause { name }) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn index_of(value: &[Node], pred: impl Fn(&ElementKind) -> bool) -> usize {
    value
        .iter()
        .position(|node| node.kind().is_some_and(&pred))
        .unwrap()
}

#[test]
fn test_contract_fixture_survives_markdown_round_trip() {
    let value = markdown_to_value(CONTRACT);
    assert_eq!(clause_names(&value), vec!["payment", "liability"]);
    let markdown = value_to_markdown(&value);
    assert!(markdown.ends_with("![Signature](https://example.com/signature.png)"));
    let again = markdown_to_value(&markdown);
    assert_eq!(again, value);
}

#[test]
fn test_clause_drag_reorders_contract() {
    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    let mut editor = MarkdownEditor::new(markdown_to_value(CONTRACT), move |_, _| {
        counter.set(counter.get() + 1);
    });

    let value = editor.value().clone();
    let liability = index_of(&value, |k| matches!(k, ElementKind::Clause { name } if name == "liability"));
    let scope = index_of(&value, |k| matches!(k, ElementKind::Heading { level: 2 }));

    let data = editor.on_drag_start(&[liability]).unwrap();
    editor.on_drop(&data, &Point::new(vec![scope, 0], 0)).unwrap();

    assert_eq!(clause_names(editor.value()), vec!["liability", "payment"]);
    assert_eq!(editor.value().len(), value.len());
    assert_eq!(changes.get(), 1);

    // undo brings the original order back
    editor.handle_key(ctrl('z'));
    assert_eq!(clause_names(editor.value()), vec!["payment", "liability"]);
}

#[test]
fn test_copy_of_whole_contract_is_markdown_and_html() {
    let clipboard = MemoryClipboard::new();
    let mut editor = MarkdownEditor::new(markdown_to_value(CONTRACT), |_, _| {})
        .with_clipboard(Box::new(clipboard.clone()));
    editor.handle_key(ctrl('a'));
    assert_eq!(editor.handle_key(ctrl('c')), EventOutcome::Handled);

    let data = clipboard.contents().unwrap();
    let plain = data.get_data(TEXT_PLAIN).unwrap();
    assert!(plain.contains("{{#clause payment}}"));
    assert!(plain.contains("**Acme Corp**"));
    let html = data.get_data(TEXT_HTML).unwrap();
    assert!(html.contains("<h1>Service Agreement</h1>"));
    assert!(html.contains("<strong>Acme Corp</strong>"));
}

#[test]
fn test_policy_can_lock_clauses_against_edits() {
    let policy = Policy::permit_all().with_is_editable(|editor, _| {
        editor
            .selection()
            .is_none_or(|s| s.focus.path.len() < 2 || !matches!(
                editor.value()[s.focus.path[0]].kind(),
                Some(ElementKind::Clause { .. })
            ))
    });
    let mut editor =
        MarkdownEditor::new(markdown_to_value("Open\n\n{{#clause fixed}}\nLocked\n{{/clause}}"), |_, _| {})
            .with_policy(policy);
    editor.focus();

    editor.handle_key(KeyEvent::new(KeyCode::Char('!'), KeyModifiers::NONE));
    assert!(value_to_markdown(editor.value()).starts_with("!Open"));

    editor.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
    assert_eq!(
        editor.handle_key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE)),
        EventOutcome::Prevented
    );
    assert!(value_to_markdown(editor.value()).contains("Locked"));
    assert!(!value_to_markdown(editor.value()).contains('?'));
}

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..5).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn prop_toggling_a_mark_twice_restores_value(
        text in sentence(),
        a in 0usize..40,
        b in 0usize..40,
        mark in prop_oneof![
            Just(Mark::Bold),
            Just(Mark::Italic),
            Just(Mark::Code),
            Just(Mark::Strikethrough),
        ],
    ) {
        let mut editor = build_editor(None);
        editor.reset(markdown_to_value(&text));
        let len = text.chars().count();
        editor.select_block_position(0, a.min(len), false);
        editor.select_block_position(0, b.min(len), true);
        let before = editor.value().clone();

        toggle_mark(&mut editor, mark);
        toggle_mark(&mut editor, mark);
        prop_assert_eq!(editor.value(), &before);
    }

    #[test]
    fn prop_typed_text_reaches_the_document(text in sentence()) {
        let mut editor = MarkdownEditor::new(markdown_to_value(""), |_, _| {});
        for c in text.chars() {
            editor.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        prop_assert_eq!(value_to_markdown(editor.value()), text);
    }
}
