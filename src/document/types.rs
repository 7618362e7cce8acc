//! Core document types.
//!
//! The document is a tree of [`Node`]s: elements carry a kind and children,
//! text leaves carry a string and a set of [`Marks`]. The JSON shape matches
//! the one hosts already persist, e.g.
//! `{"type": "paragraph", "children": [{"text": "hi", "bold": true}]}`.

use serde::{Deserialize, Serialize};

/// The top-level blocks of a document.
pub type Value = Vec<Node>;

/// Inline formatting attribute applied to text leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Strikethrough,
}

impl Mark {
    pub const ALL: [Self; 4] = [Self::Bold, Self::Italic, Self::Code, Self::Strikethrough];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Code => "code",
            Self::Strikethrough => "strikethrough",
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// The set of marks on a text leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
}

impl Marks {
    pub const fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Code => self.code,
            Mark::Strikethrough => self.strikethrough,
        }
    }

    pub const fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Code => self.code = on,
            Mark::Strikethrough => self.strikethrough = on,
        }
    }

    #[must_use]
    pub const fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub const fn is_empty(&self) -> bool {
        !(self.bold || self.italic || self.code || self.strikethrough)
    }
}

/// A text leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in chars. All offsets in the document are char offsets.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Element type plus its type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Paragraph,
    Heading {
        level: u8,
    },
    BlockQuote,
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        info: Option<String>,
    },
    #[serde(rename = "ul_list")]
    BulletedList,
    #[serde(rename = "ol_list")]
    NumberedList {
        #[serde(default = "default_list_start")]
        start: u64,
    },
    ListItem,
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Image block. The alt text lives here since the block is void.
    Image {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        alt: String,
    },
    /// Image inside running text. Its text children are the alt text.
    InlineImage {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    HorizontalRule,
    Clause {
        name: String,
    },
}

const fn default_list_start() -> u64 {
    1
}

impl ElementKind {
    /// Short type name as used in the JSON `type` field.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading { .. } => "heading",
            Self::BlockQuote => "block_quote",
            Self::CodeBlock { .. } => "code_block",
            Self::BulletedList => "ul_list",
            Self::NumberedList { .. } => "ol_list",
            Self::ListItem => "list_item",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::InlineImage { .. } => "inline_image",
            Self::HorizontalRule => "horizontal_rule",
            Self::Clause { .. } => "clause",
        }
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, Self::BulletedList | Self::NumberedList { .. })
    }

    /// Intrinsically inline kinds, independent of editor plugins.
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Link { .. } | Self::InlineImage { .. })
    }

    /// Intrinsically void kinds, independent of editor plugins.
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::HorizontalRule)
    }

    /// Kinds that only ever hold other blocks.
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::BulletedList | Self::NumberedList { .. } | Self::Clause { .. }
        )
    }

    /// Same variant, ignoring data such as heading level or link target.
    pub fn same_variant(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A block or inline element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub const fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Paragraph, vec![Node::text(text)])
    }

    /// A void element with its single empty text child.
    pub fn void(kind: ElementKind) -> Self {
        Self::new(kind, vec![Node::text("")])
    }

    /// Whether the children are inline content (texts and inline elements).
    pub fn has_inline_children(&self) -> bool {
        self.children.first().is_some_and(Node::is_inline_content)
    }

    /// Concatenated text of all descendants.
    pub fn string(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_string(&mut out);
        }
        out
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(Text::new(text))
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self::Text(Text::marked(text, marks))
    }

    pub fn element(kind: ElementKind, children: Vec<Self>) -> Self {
        Self::Element(Element::new(kind, children))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Element(Element::paragraph(text))
    }

    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub const fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub const fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(t) => Some(t),
            Self::Element(_) => None,
        }
    }

    pub const fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Self::Text(t) => Some(t),
            Self::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[Self] {
        match self {
            Self::Element(el) => &el.children,
            Self::Text(_) => &[],
        }
    }

    pub fn kind(&self) -> Option<&ElementKind> {
        self.as_element().map(|el| &el.kind)
    }

    /// Texts and inline elements.
    pub fn is_inline_content(&self) -> bool {
        match self {
            Self::Text(_) => true,
            Self::Element(el) => el.kind.is_inline(),
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn string(&self) -> String {
        let mut out = String::new();
        self.push_string(&mut out);
        out
    }

    fn push_string(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(&t.text),
            Self::Element(el) => {
                for child in &el.children {
                    child.push_string(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<Text> for Node {
    fn from(t: Text) -> Self {
        Self::Text(t)
    }
}

/// Whether a document holds no visible content (a single empty text block).
pub fn is_empty_value(value: &[Node]) -> bool {
    match value {
        [] => true,
        [only] => only.as_element().is_some_and(|el| {
            !el.kind.is_void() && !el.kind.is_container() && el.string().is_empty()
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_json_omits_false_marks() {
        let node = Node::marked("hi", Marks::default().with(Mark::Bold));
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"text":"hi","bold":true}"#);
    }

    #[test]
    fn test_element_json_uses_type_tag() {
        let node = Node::element(
            ElementKind::Heading { level: 2 },
            vec![Node::text("Title")],
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
        assert_eq!(json["children"][0]["text"], "Title");
    }

    #[test]
    fn test_untagged_node_deserializes_both_shapes() {
        let json = r#"[{"type":"ul_list","children":[{"type":"list_item","children":[{"text":"a","italic":true}]}]}]"#;
        let value: Value = serde_json::from_str(json).unwrap();
        let list = value[0].as_element().unwrap();
        assert_eq!(list.kind, ElementKind::BulletedList);
        let item = list.children[0].as_element().unwrap();
        assert!(item.children[0].as_text().unwrap().marks.italic);
    }

    #[test]
    fn test_numbered_list_start_defaults_to_one() {
        let value: Node = serde_json::from_str(r#"{"type":"ol_list","children":[]}"#).unwrap();
        assert_eq!(value.kind(), Some(&ElementKind::NumberedList { start: 1 }));
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        assert_eq!(Text::new("café").char_len(), 4);
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&[]));
        assert!(is_empty_value(&[Node::paragraph("")]));
        assert!(!is_empty_value(&[Node::paragraph("x")]));
        assert!(!is_empty_value(&[Node::Element(Element::void(
            ElementKind::HorizontalRule
        ))]));
    }

    #[test]
    fn test_has_inline_children() {
        let para = Element::paragraph("x");
        assert!(para.has_inline_children());
        let list = Element::new(ElementKind::BulletedList, vec![Node::paragraph("x")]);
        assert!(!list.has_inline_children());
    }
}
