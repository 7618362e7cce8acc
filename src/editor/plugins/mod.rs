//! Editor plugins.
//!
//! A plugin overrides some of the editor's behaviours. Plugins are stacked:
//! the last one registered is the outermost layer and sees each event first.
//! A hook returns [`Flow::Handled`] to stop dispatch or [`Flow::Continue`] to
//! pass the event to the next layer in, and finally to the base editor.
//!
//! The standard stack is built by [`build_editor`]:
//! history, schema, images, links, html, lists (innermost first), followed by
//! an optional host augmentation.

mod history;
mod html;
mod images;
mod links;
mod lists;
mod schema;

use crate::document::{Element, Value};

use super::{DataTransfer, Editor};

pub use history::{HistoryPlugin, with_history};
pub use html::{HtmlPlugin, with_html};
pub use images::{ImagesPlugin, insert_image, with_images};
pub use links::{
    LinksPlugin, active_link, insert_link, is_link_active, is_selection_link_body, selection_link_path, unwrap_link,
    with_links,
};
pub use lists::{ListsPlugin, with_lists};
pub use schema::{SchemaPlugin, with_schema};

/// Outcome of a plugin hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Handled,
    Continue,
}

/// A layer of editor behaviour. Every hook defaults to passing through.
pub trait Plugin {
    fn name(&self) -> &'static str;

    /// `Some` to decide whether `element` is inline, `None` to defer.
    fn is_inline(&self, _element: &Element) -> Option<bool> {
        None
    }

    /// `Some` to decide whether `element` is void, `None` to defer.
    fn is_void(&self, _element: &Element) -> Option<bool> {
        None
    }

    fn insert_text(&self, _editor: &mut Editor, _text: &str) -> Flow {
        Flow::Continue
    }

    fn insert_break(&self, _editor: &mut Editor) -> Flow {
        Flow::Continue
    }

    fn delete_backward(&self, _editor: &mut Editor) -> Flow {
        Flow::Continue
    }

    fn insert_data(&self, _editor: &mut Editor, _data: &DataTransfer) -> Flow {
        Flow::Continue
    }

    /// Fix up the document. Returns whether anything changed; the editor
    /// repeats the pass until no plugin reports a change.
    fn normalize(&self, _value: &mut Value) -> bool {
        false
    }

    fn undo(&self, _editor: &mut Editor) -> Flow {
        Flow::Continue
    }

    fn redo(&self, _editor: &mut Editor) -> Flow {
        Flow::Continue
    }
}

/// Host hook that receives the fully layered editor and may extend it.
pub type AugmentFn = Box<dyn FnOnce(Editor) -> Editor>;

/// Build the standard editor, applying `augment` last.
pub fn build_editor(augment: Option<AugmentFn>) -> Editor {
    let editor = with_lists(with_html(with_links(with_images(with_schema(with_history(
        Editor::new(),
    ))))));
    let mut editor = match augment {
        Some(augment) => augment(editor),
        None => editor,
    };
    // the initial paragraph must already satisfy every layer
    editor.reset(editor.value().clone());
    tracing::debug!(editor = %editor.id(), plugins = ?editor.plugin_names(), "editor built");
    editor
}
