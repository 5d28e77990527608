//! Document tree types
//!
//! Block and inline nodes share one closed enum so that renderer overrides can
//! target any of them by [`NodeKind`]. Every node owns its children outright;
//! the tree is built once by the parser and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::slug::slug;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    // Block nodes
    Document(Document),
    Paragraph(Paragraph),
    Heading(Heading),
    List(List),
    ListItem(ListItem),
    CodeBlock(CodeBlock),
    ThematicBreak,
    LineBreak,

    // Inline nodes
    Text(Text),
    Strong(Strong),
    Emphasis(Emphasis),
    Strikethrough(Strikethrough),
    CodeSpan(CodeSpan),
    Link(Link),
    Image(Image),
    RawAutolink(RawAutolink),
}

/// Root node: the ordered top-level blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub children: Vec<Node>,
}

/// Paragraph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub children: Vec<Node>,
}

/// Heading node (h1 to h6)
///
/// `id` is the slug of the flattened heading text, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub children: Vec<Node>,
}

/// List node (ordered or unordered); children are `ListItem` nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub children: Vec<Node>,
}

/// List item node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Inline content of the item's own line(s)
    pub children: Vec<Node>,
    /// Nested list, always a `Node::List`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublist: Option<Box<Node>>,
}

/// Fenced or indented code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub lang: Option<String>,
    pub value: String,
}

/// Literal text run (unescaped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
}

/// Strong node (`**text**` or `__text__`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strong {
    pub children: Vec<Node>,
}

/// Emphasis node (`*text*` or `_text_`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emphasis {
    pub children: Vec<Node>,
}

/// Strikethrough node (`~~text~~`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strikethrough {
    pub children: Vec<Node>,
}

/// Code span node; `value` is verbatim source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSpan {
    pub value: String,
}

/// Link node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub title: Option<String>,
    pub children: Vec<Node>,
}

/// Image node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
}

/// Autolink, either `<scheme:...>` or a bare `http://...` word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAutolink {
    pub url: String,
}

/// Type tag of a [`Node`], used to key renderer overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    List,
    ListItem,
    CodeBlock,
    ThematicBreak,
    LineBreak,
    Text,
    Strong,
    Emphasis,
    Strikethrough,
    CodeSpan,
    Link,
    Image,
    RawAutolink,
}

impl NodeKind {
    /// Every node kind, in declaration order
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Document,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::List,
        NodeKind::ListItem,
        NodeKind::CodeBlock,
        NodeKind::ThematicBreak,
        NodeKind::LineBreak,
        NodeKind::Text,
        NodeKind::Strong,
        NodeKind::Emphasis,
        NodeKind::Strikethrough,
        NodeKind::CodeSpan,
        NodeKind::Link,
        NodeKind::Image,
        NodeKind::RawAutolink,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::List => "list",
            Self::ListItem => "listItem",
            Self::CodeBlock => "codeBlock",
            Self::ThematicBreak => "thematicBreak",
            Self::LineBreak => "lineBreak",
            Self::Text => "text",
            Self::Strong => "strong",
            Self::Emphasis => "emphasis",
            Self::Strikethrough => "strikethrough",
            Self::CodeSpan => "codeSpan",
            Self::Link => "link",
            Self::Image => "image",
            Self::RawAutolink => "rawAutolink",
        }
    }

    /// Whether nodes of this kind are block-level
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Paragraph
                | Self::Heading
                | Self::List
                | Self::ListItem
                | Self::CodeBlock
                | Self::ThematicBreak
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    /// The type tag of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Heading(_) => NodeKind::Heading,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::CodeBlock(_) => NodeKind::CodeBlock,
            Node::ThematicBreak => NodeKind::ThematicBreak,
            Node::LineBreak => NodeKind::LineBreak,
            Node::Text(_) => NodeKind::Text,
            Node::Strong(_) => NodeKind::Strong,
            Node::Emphasis(_) => NodeKind::Emphasis,
            Node::Strikethrough(_) => NodeKind::Strikethrough,
            Node::CodeSpan(_) => NodeKind::CodeSpan,
            Node::Link(_) => NodeKind::Link,
            Node::Image(_) => NodeKind::Image,
            Node::RawAutolink(_) => NodeKind::RawAutolink,
        }
    }

    /// Child nodes in document order (empty for leaves)
    ///
    /// A list item's sublist comes after its inline children.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        let (children, sublist): (&[Node], Option<&Node>) = match self {
            Node::Document(n) => (n.children.as_slice(), None),
            Node::Paragraph(n) => (n.children.as_slice(), None),
            Node::Heading(n) => (n.children.as_slice(), None),
            Node::List(n) => (n.children.as_slice(), None),
            Node::ListItem(n) => (n.children.as_slice(), n.sublist.as_deref()),
            Node::Strong(n) => (n.children.as_slice(), None),
            Node::Emphasis(n) => (n.children.as_slice(), None),
            Node::Strikethrough(n) => (n.children.as_slice(), None),
            Node::Link(n) => (n.children.as_slice(), None),
            Node::CodeBlock(_)
            | Node::ThematicBreak
            | Node::LineBreak
            | Node::Text(_)
            | Node::CodeSpan(_)
            | Node::Image(_)
            | Node::RawAutolink(_) => (&[], None),
        };
        children.iter().chain(sublist)
    }

    /// Flatten inline markup to its plain text
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.value),
            Node::CodeSpan(c) => out.push_str(&c.value),
            Node::Image(img) => out.push_str(&img.alt),
            Node::RawAutolink(a) => out.push_str(&a.url),
            Node::LineBreak => out.push(' '),
            Node::CodeBlock(c) => out.push_str(&c.value),
            _ => {
                for child in self.children() {
                    child.push_plain_text(out);
                }
            }
        }
    }
}

/// Flatten a sequence of inline nodes to plain text
pub fn plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(Node::plain_text).collect()
}

// Convenience constructors
impl Node {
    pub fn document(children: Vec<Node>) -> Self {
        Node::Document(Document { children })
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(Paragraph { children })
    }

    /// Build a heading, deriving its id from the flattened inline text
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        let id = slug(&plain_text(&children));
        Node::Heading(Heading {
            level,
            id,
            children,
        })
    }

    pub fn list(ordered: bool, children: Vec<Node>) -> Self {
        Node::List(List { ordered, children })
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem(ListItem {
            children,
            sublist: None,
        })
    }

    pub fn list_item_with_sublist(children: Vec<Node>, sublist: List) -> Self {
        Node::ListItem(ListItem {
            children,
            sublist: Some(Box::new(Node::List(sublist))),
        })
    }

    pub fn code_block(lang: Option<String>, value: impl Into<String>) -> Self {
        Node::CodeBlock(CodeBlock {
            lang,
            value: value.into(),
        })
    }

    pub fn thematic_break() -> Self {
        Node::ThematicBreak
    }

    pub fn line_break() -> Self {
        Node::LineBreak
    }

    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(Text { value: s.into() })
    }

    pub fn strong(children: Vec<Node>) -> Self {
        Node::Strong(Strong { children })
    }

    pub fn emphasis(children: Vec<Node>) -> Self {
        Node::Emphasis(Emphasis { children })
    }

    pub fn strikethrough(children: Vec<Node>) -> Self {
        Node::Strikethrough(Strikethrough { children })
    }

    pub fn code_span(value: impl Into<String>) -> Self {
        Node::CodeSpan(CodeSpan {
            value: value.into(),
        })
    }

    pub fn link(href: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link(Link {
            href: href.into(),
            title: None,
            children,
        })
    }

    pub fn link_with_title(
        href: impl Into<String>,
        title: impl Into<String>,
        children: Vec<Node>,
    ) -> Self {
        Node::Link(Link {
            href: href.into(),
            title: Some(title.into()),
            children,
        })
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>, title: Option<String>) -> Self {
        Node::Image(Image {
            src: src.into(),
            alt: alt.into(),
            title,
        })
    }

    pub fn autolink(url: impl Into<String>) -> Self {
        Node::RawAutolink(RawAutolink { url: url.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_constructors() {
        let text = Node::text("hello");
        assert!(matches!(text, Node::Text(Text { value }) if value == "hello"));

        let para = Node::paragraph(vec![Node::text("content")]);
        assert!(matches!(para, Node::Paragraph(_)));
    }

    #[test]
    fn test_heading_id_from_children() {
        let heading = Node::heading(
            2,
            vec![
                Node::text("Hello "),
                Node::emphasis(vec![Node::text("Big World")]),
            ],
        );
        if let Node::Heading(h) = heading {
            assert_eq!(h.level, 2);
            assert_eq!(h.id, "hello-big-world");
        } else {
            panic!("Expected Heading node");
        }
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Node::thematic_break().kind(), NodeKind::ThematicBreak);
        assert_eq!(Node::code_span("x").kind(), NodeKind::CodeSpan);
        assert_eq!(Node::autolink("http://a.b").kind(), NodeKind::RawAutolink);
        assert_eq!(Node::list(true, vec![]).kind(), NodeKind::List);
    }

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<_> = NodeKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NodeKind::ALL.len());
    }

    #[test]
    fn test_is_block() {
        assert!(NodeKind::Paragraph.is_block());
        assert!(NodeKind::ListItem.is_block());
        assert!(!NodeKind::Text.is_block());
        assert!(!NodeKind::LineBreak.is_block());
    }

    #[test]
    fn test_children_include_sublist() {
        let item = Node::list_item_with_sublist(
            vec![Node::text("one")],
            List {
                ordered: true,
                children: vec![Node::list_item(vec![Node::text("nested")])],
            },
        );
        let kinds: Vec<_> = item.children().map(Node::kind).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::List]);
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let nodes = vec![
            Node::strong(vec![Node::text("a")]),
            Node::code_span("b"),
            Node::link("#", vec![Node::text("c")]),
        ];
        assert_eq!(plain_text(&nodes), "abc");
    }

    #[test]
    fn test_serialize_tagged() {
        let node = Node::code_span("x");
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"type":"codeSpan","value":"x"}"#);

        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
