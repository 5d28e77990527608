//! mark-ast: document tree, options and HTML renderer for mark
//!
//! This crate provides:
//! - The node tree (block and inline nodes in one closed enum)
//! - Node kinds used to key renderer overrides
//! - Heading slugs and smartypants substitutions
//! - Rendering to HTML with a per-instance override table
//!
//! ## Example
//!
//! ```rust
//! use mark_ast::{render_html, Node, NodeKind, Options, Overrides};
//!
//! let doc = Node::document(vec![Node::paragraph(vec![Node::text("hello")])]);
//!
//! let mut overrides = Overrides::new();
//! overrides.insert(NodeKind::Paragraph, |node, r| match node {
//!     Node::Paragraph(p) => format!("<p class=\"lead\">{}</p>", r.render_children(&p.children)),
//!     _ => r.render_default(node),
//! });
//!
//! let html = render_html(&doc, &Options::default(), &overrides);
//! assert_eq!(html, "<p class=\"lead\">hello</p>");
//! ```

pub mod html;
pub mod node;
pub mod options;
pub mod slug;
pub mod smartypants;

pub use html::{Overrides, RenderFn, Renderer, escape_code, escape_text, render_html};
pub use node::{
    CodeBlock, CodeSpan, Document, Emphasis, Heading, Image, Link, List, ListItem, Node, NodeKind,
    Paragraph, RawAutolink, Strikethrough, Strong, Text, plain_text,
};
pub use options::Options;
pub use slug::slug;
pub use smartypants::smarten;
