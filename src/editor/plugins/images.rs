//! Image blocks, and images inside running text.

use crate::document::{Element, ElementKind, Node, is_image_url};

use super::{Flow, Plugin};
use crate::editor::{ChangeKind, DataTransfer, Editor, TEXT_PLAIN};

pub struct ImagesPlugin;

impl Plugin for ImagesPlugin {
    fn name(&self) -> &'static str {
        "images"
    }

    fn is_inline(&self, element: &Element) -> Option<bool> {
        matches!(element.kind, ElementKind::InlineImage { .. }).then_some(true)
    }

    fn is_void(&self, element: &Element) -> Option<bool> {
        matches!(element.kind, ElementKind::Image { .. }).then_some(true)
    }

    fn insert_data(&self, editor: &mut Editor, data: &DataTransfer) -> Flow {
        match data.get_data(TEXT_PLAIN).map(str::trim) {
            Some(text) if is_image_url(text) => {
                insert_image(editor, text);
                Flow::Handled
            }
            _ => Flow::Continue,
        }
    }
}

pub fn with_images(editor: Editor) -> Editor {
    editor.register(ImagesPlugin)
}

/// Insert an image block at the selection (or at the end of the document
/// when there is none).
pub fn insert_image(editor: &mut Editor, url: &str) {
    let url = url.trim();
    if url.is_empty() {
        return;
    }
    tracing::debug!(editor = %editor.id(), url, "insert image");
    if editor.selection().is_none() {
        editor.move_to_end();
    }
    let image = Node::Element(Element::void(ElementKind::Image {
        href: url.to_string(),
        title: None,
        alt: String::new(),
    }));
    editor.transact(ChangeKind::Other, |editor| {
        editor.collapse_for_insert();
        let Some(point) = editor.selection().map(|s| s.focus.clone()) else {
            return;
        };
        editor.insert_blocks(&point, vec![image]);
    });
}
