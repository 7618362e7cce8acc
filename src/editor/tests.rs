use super::*;
use crate::document::{ElementKind, Mark, Marks, markdown_to_value};

fn editor_with(blocks: &[&str]) -> Editor {
    let mut editor = build_editor(None);
    editor.reset(blocks.iter().map(|b| Node::paragraph(*b)).collect());
    editor
}

fn strings(editor: &Editor) -> Vec<String> {
    editor.value().iter().map(Node::string).collect()
}

fn bold() -> Marks {
    Marks::default().with(Mark::Bold)
}

fn select(editor: &mut Editor, from: (usize, usize), to: (usize, usize)) {
    editor.select_block_position(from.0, from.1, false);
    editor.select_block_position(to.0, to.1, true);
}

// --- Text insertion ---

#[test]
fn test_insert_text_at_cursor() {
    let mut editor = editor_with(&["hd"]);
    editor.select_block_position(0, 1, false);
    editor.insert_text("ello worl");
    assert_eq!(strings(&editor), vec!["hello world"]);
    assert_eq!(editor.focus_position(), Some((0, 10)));
}

#[test]
fn test_insert_text_replaces_selection() {
    let mut editor = editor_with(&["hello world"]);
    select(&mut editor, (0, 6), (0, 11));
    editor.insert_text("there");
    assert_eq!(strings(&editor), vec!["hello there"]);
}

#[test]
fn test_insert_text_without_selection_is_ignored() {
    let mut editor = editor_with(&["a"]);
    editor.insert_text("b");
    assert_eq!(strings(&editor), vec!["a"]);
}

#[test]
fn test_typing_on_void_starts_paragraph() {
    let mut editor = build_editor(None);
    editor.reset(vec![Node::Element(Element::void(ElementKind::HorizontalRule))]);
    editor.select_block_position(0, 0, false);
    editor.insert_text("x");
    assert_eq!(editor.value().len(), 2);
    assert_eq!(editor.value()[1], Node::paragraph("x"));
}

// --- Breaks ---

#[test]
fn test_insert_break_splits_paragraph() {
    let mut editor = editor_with(&["hello"]);
    editor.select_block_position(0, 2, false);
    editor.insert_break();
    assert_eq!(strings(&editor), vec!["he", "llo"]);
    assert_eq!(editor.focus_position(), Some((1, 0)));
}

#[test]
fn test_break_at_heading_end_starts_paragraph() {
    let mut editor = build_editor(None);
    editor.reset(markdown_to_value("# Title"));
    editor.move_to_end();
    editor.insert_break();
    assert_eq!(editor.value()[0].kind(), Some(&ElementKind::Heading { level: 1 }));
    assert_eq!(editor.value()[1].kind(), Some(&ElementKind::Paragraph));
}

#[test]
fn test_break_in_code_block_inserts_newline() {
    let mut editor = build_editor(None);
    editor.reset(markdown_to_value("```\nfn main() {}\n```"));
    editor.move_to_end();
    editor.insert_break();
    assert_eq!(editor.value().len(), 1);
    assert_eq!(editor.value()[0].string(), "fn main() {}\n");
}

#[test]
fn test_split_block_rejects_containers() {
    let mut editor = build_editor(None);
    editor.reset(markdown_to_value("- a"));
    assert_eq!(
        editor.split_block(&[0], 0),
        Err(EditError::NotTextBlock(vec![0]))
    );
}

// --- Deletion ---

#[test]
fn test_backspace_at_block_start_merges() {
    let mut editor = editor_with(&["ab", "cd"]);
    editor.select_block_position(1, 0, false);
    editor.delete_backward();
    assert_eq!(strings(&editor), vec!["abcd"]);
    assert_eq!(editor.focus_position(), Some((0, 2)));
}

#[test]
fn test_delete_forward_at_block_end_merges() {
    let mut editor = editor_with(&["ab", "cd"]);
    editor.select_block_position(0, 2, false);
    editor.delete_forward();
    assert_eq!(strings(&editor), vec!["abcd"]);
}

#[test]
fn test_backspace_at_document_start_is_noop() {
    let mut editor = editor_with(&["ab"]);
    editor.move_to_start();
    editor.delete_backward();
    assert_eq!(strings(&editor), vec!["ab"]);
}

#[test]
fn test_delete_range_across_blocks() {
    let mut editor = editor_with(&["hello", "middle", "world"]);
    select(&mut editor, (0, 2), (2, 3));
    editor.delete_backward();
    assert_eq!(strings(&editor), vec!["held"]);
    assert_eq!(editor.focus_position(), Some((0, 2)));
}

#[test]
fn test_delete_word_backward() {
    let mut editor = editor_with(&["hello world"]);
    editor.move_to_end();
    editor.delete_word_backward();
    assert_eq!(strings(&editor), vec!["hello "]);
}

#[test]
fn test_delete_everything_leaves_empty_paragraph() {
    let mut editor = editor_with(&["a", "b"]);
    editor.select_all();
    editor.delete_fragment();
    assert_eq!(editor.value(), &vec![Node::paragraph("")]);
}

// --- Fragments ---

#[test]
fn test_fragment_clips_edges() {
    let mut editor = build_editor(None);
    editor.reset(vec![Node::element(
        ElementKind::Paragraph,
        vec![Node::text("hello "), Node::marked("world", bold())],
    )]);
    select(&mut editor, (0, 3), (0, 8));
    assert_eq!(
        editor.fragment(),
        vec![Node::element(
            ElementKind::Paragraph,
            vec![Node::text("lo "), Node::marked("wo", bold())],
        )]
    );
}

#[test]
fn test_insert_fragment_blocks_merge_with_halves() {
    let mut editor = editor_with(&["abcd"]);
    editor.select_block_position(0, 2, false);
    editor.insert_fragment(vec![Node::paragraph("X"), Node::paragraph("Y")]);
    assert_eq!(strings(&editor), vec!["abX", "Ycd"]);
    assert_eq!(editor.focus_position(), Some((1, 1)));
}

#[test]
fn test_insert_fragment_single_block_is_inline() {
    let mut editor = editor_with(&["ad"]);
    editor.select_block_position(0, 1, false);
    editor.insert_fragment(vec![Node::paragraph("bc")]);
    assert_eq!(strings(&editor), vec!["abcd"]);
    assert_eq!(editor.focus_position(), Some((0, 3)));
}

// --- Marks ---

#[test]
fn test_toggle_mark_twice_restores_value() {
    let mut editor = editor_with(&["Hello world"]);
    let original = editor.value().clone();
    editor.select_all();
    toggle_mark(&mut editor, Mark::Bold);
    assert!(is_mark_active(&editor, Mark::Bold));
    assert_ne!(editor.value(), &original);
    toggle_mark(&mut editor, Mark::Bold);
    assert!(!is_mark_active(&editor, Mark::Bold));
    assert_eq!(editor.value(), &original);
}

#[test]
fn test_mark_on_partial_selection() {
    let mut editor = editor_with(&["Hello world"]);
    select(&mut editor, (0, 6), (0, 11));
    editor.add_mark(Mark::Bold);
    let para = editor.value()[0].as_element().unwrap();
    assert_eq!(
        para.children,
        vec![Node::text("Hello "), Node::marked("world", bold())]
    );
    assert_eq!(editor.anchor_position(), Some((0, 6)));
    assert_eq!(editor.focus_position(), Some((0, 11)));
}

#[test]
fn test_collapsed_mark_applies_to_typed_text() {
    let mut editor = editor_with(&["ab"]);
    editor.move_to_end();
    editor.add_mark(Mark::Bold);
    assert_eq!(editor.pending_marks(), Some(bold()));
    assert_eq!(strings(&editor), vec!["ab"]);
    editor.insert_text("c");
    editor.insert_text("d");
    let para = editor.value()[0].as_element().unwrap();
    assert_eq!(para.children, vec![Node::text("ab"), Node::marked("cd", bold())]);
}

#[test]
fn test_moving_clears_pending_marks() {
    let mut editor = editor_with(&["ab"]);
    editor.move_to_end();
    editor.add_mark(Mark::Italic);
    editor.move_home(false);
    assert_eq!(editor.pending_marks(), None);
}

// --- Blocks ---

#[test]
fn test_toggle_heading() {
    let mut editor = editor_with(&["Title"]);
    editor.move_to_start();
    toggle_block(&mut editor, BlockFormat::Heading(1));
    assert_eq!(editor.value()[0].kind(), Some(&ElementKind::Heading { level: 1 }));
    assert!(is_block_active(&editor, BlockFormat::Heading(1)));
    assert!(!is_block_active(&editor, BlockFormat::Heading(2)));
    toggle_block(&mut editor, BlockFormat::Heading(1));
    assert_eq!(editor.value()[0].kind(), Some(&ElementKind::Paragraph));
}

#[test]
fn test_toggle_list_wraps_and_unwraps() {
    let mut editor = editor_with(&["a", "b"]);
    editor.select_all();
    toggle_block(&mut editor, BlockFormat::BulletedList);
    assert_eq!(editor.value().len(), 1);
    assert_eq!(editor.value()[0].kind(), Some(&ElementKind::BulletedList));
    assert_eq!(editor.value()[0].children().len(), 2);
    assert!(is_block_active(&editor, BlockFormat::BulletedList));

    toggle_block(&mut editor, BlockFormat::BulletedList);
    assert_eq!(editor.value(), &vec![Node::paragraph("a"), Node::paragraph("b")]);
}

#[test]
fn test_toggle_between_list_types() {
    let mut editor = build_editor(None);
    editor.reset(markdown_to_value("- a\n- b"));
    editor.select_all();
    toggle_block(&mut editor, BlockFormat::NumberedList);
    assert_eq!(editor.value().len(), 1);
    assert_eq!(
        editor.value()[0].kind(),
        Some(&ElementKind::NumberedList { start: 1 })
    );
}

// --- Selection and movement ---

#[test]
fn test_select_rejects_invalid_point() {
    let mut editor = editor_with(&["ab"]);
    let bad = Point::new(vec![4, 0], 0);
    assert_eq!(
        editor.select(Range::collapsed(bad.clone())),
        Err(EditError::InvalidPoint(bad))
    );
    assert!(editor.selection().is_none());
}

#[test]
fn test_left_at_block_start_moves_to_previous_block() {
    let mut editor = editor_with(&["ab", "cd"]);
    editor.select_block_position(1, 0, false);
    editor.move_cursor(Direction::Left, false);
    assert_eq!(editor.focus_position(), Some((0, 2)));
    editor.move_cursor(Direction::Right, true);
    assert_eq!(editor.anchor_position(), Some((0, 2)));
    assert_eq!(editor.focus_position(), Some((1, 0)));
}

#[test]
fn test_left_collapses_expanded_selection_to_start() {
    let mut editor = editor_with(&["abcdef"]);
    select(&mut editor, (0, 4), (0, 1));
    editor.move_cursor(Direction::Left, false);
    assert_eq!(editor.focus_position(), Some((0, 1)));
    assert!(editor.selection().is_some_and(Range::is_collapsed));
}

#[test]
fn test_vertical_movement_clamps_offset() {
    let mut editor = editor_with(&["a", "long line"]);
    editor.select_block_position(1, 7, false);
    editor.move_cursor(Direction::Up, false);
    assert_eq!(editor.focus_position(), Some((0, 1)));
    editor.move_cursor(Direction::Down, false);
    assert_eq!(editor.focus_position(), Some((1, 1)));
}

#[test]
fn test_word_movement() {
    let mut editor = editor_with(&["one two three"]);
    editor.move_to_start();
    editor.move_word_right(false);
    assert_eq!(editor.focus_position(), Some((0, 3)));
    editor.move_word_right(false);
    assert_eq!(editor.focus_position(), Some((0, 7)));
    editor.move_word_left(false);
    assert_eq!(editor.focus_position(), Some((0, 4)));
}

// --- Explicit transforms ---

#[test]
fn test_insert_and_remove_node_at_paths() {
    let mut editor = editor_with(&["a"]);
    editor.insert_node(&[1], Node::paragraph("b")).unwrap();
    assert_eq!(strings(&editor), vec!["a", "b"]);
    assert_eq!(
        editor.insert_node(&[5], Node::paragraph("x")),
        Err(EditError::InvalidPath(vec![5]))
    );
    assert_eq!(editor.remove_node(&[0]).unwrap(), Node::paragraph("a"));
    assert_eq!(strings(&editor), vec!["b"]);
    assert_eq!(editor.remove_node(&[9]), Err(EditError::InvalidPath(vec![9])));
}

// --- History and change tracking ---

#[test]
fn test_undo_break_restores_selection() {
    let mut editor = editor_with(&["hello"]);
    editor.select_block_position(0, 2, false);
    editor.insert_break();
    assert!(editor.can_undo());
    editor.undo();
    assert_eq!(strings(&editor), vec!["hello"]);
    assert_eq!(editor.focus_position(), Some((0, 2)));
    assert!(editor.can_redo());
    editor.redo();
    assert_eq!(strings(&editor), vec!["he", "llo"]);
}

#[test]
fn test_take_change_reports_value_and_selection() {
    let mut editor = editor_with(&["a"]);
    assert_eq!(editor.take_change(), None);
    editor.move_to_end();
    assert_eq!(
        editor.take_change(),
        Some(Change {
            value: false,
            selection: true
        })
    );
    editor.insert_text("b");
    assert!(editor.take_change().is_some_and(|c| c.value));
    assert_eq!(editor.take_change(), None);
}

#[test]
fn test_editor_ids_are_unique() {
    assert_ne!(Editor::new().id(), Editor::new().id());
}

#[test]
fn test_failed_transaction_rolls_back() {
    let mut editor = editor_with(&["a", "b"]);
    editor.select_block_position(1, 1, false);
    editor.take_change();

    let result: Result<(), EditError> = editor.try_transact(ChangeKind::Other, |editor| {
        editor.remove_node(&[0])?;
        editor.remove_node(&[5])?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(strings(&editor), vec!["a", "b"]);
    assert_eq!(editor.focus_position(), Some((1, 1)));
    assert!(!editor.can_undo());
    assert_eq!(editor.take_change(), None);
}
