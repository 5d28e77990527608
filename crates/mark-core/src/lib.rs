//! mark-core: markdown to HTML conversion
//!
//! This crate provides:
//! - [`render`] for one-shot conversion with default options
//! - [`Mark`], a converter instance with its own options and render overrides
//! - Fixture discovery and checking ([`fixture`])
//! - Parallel conversion of whole directories ([`batch`])
//!
//! ## Example
//!
//! ```rust
//! use mark_core::{Mark, Node, NodeKind};
//!
//! assert_eq!(mark_core::render("__bar__ foo"), "<p><strong>bar</strong> foo</p>");
//!
//! let mut mark = Mark::new("hello world", None);
//! mark.add_render_fn(NodeKind::Paragraph, |node, r| match node {
//!     Node::Paragraph(p) => format!("<p class=\"mv-msg\">{}</p>", r.render_children(&p.children)),
//!     _ => r.render_default(node),
//! });
//! assert_eq!(mark.render(), "<p class=\"mv-msg\">hello world</p>");
//! ```

pub mod batch;
pub mod error;
pub mod fixture;

pub use batch::{BatchOptions, BatchResult, convert_directory};
pub use error::{Error, Result};
pub use fixture::{Fixture, FixtureOutcome};
pub use mark_ast::{Node, NodeKind, Options, Overrides, Renderer};

use mark_ast::render_html;

/// A converter instance: one parsed document plus its options and override
/// table
#[derive(Debug)]
pub struct Mark {
    document: Node,
    options: Options,
    overrides: Overrides,
}

impl Mark {
    /// Parse `input`, using `Options::default()` when `options` is `None`
    pub fn new(input: &str, options: Option<Options>) -> Self {
        let options = options.unwrap_or_default();
        let document = mark_parser::parse(input, &options);
        Self {
            document,
            options,
            overrides: Overrides::new(),
        }
    }

    /// Register a render function for `kind`, replacing any earlier one
    pub fn add_render_fn<F>(&mut self, kind: NodeKind, f: F)
    where
        F: Fn(&Node, &Renderer<'_>) -> String + Send + Sync + 'static,
    {
        log::debug!("registering render override for {kind}");
        self.overrides.insert(kind, f);
    }

    /// Render the document to HTML. Rendering does not touch the tree, so
    /// this can be called any number of times.
    pub fn render(&self) -> String {
        render_html(&self.document, &self.options, &self.overrides)
    }

    /// The parsed document tree
    pub fn document(&self) -> &Node {
        &self.document
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Convert markdown to HTML with default options and no overrides
pub fn render(input: &str) -> String {
    Mark::new(input, None).render()
}

/// Convert markdown to HTML with the given options and no overrides
pub fn render_with_options(input: &str, options: &Options) -> String {
    Mark::new(input, Some(*options)).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_options() {
        assert_eq!(render("foobar"), "<p>foobar</p>");
    }

    #[test]
    fn test_render_is_repeatable() {
        let mark = Mark::new("# 1\n## 2", None);
        let first = mark.render();
        assert_eq!(first, mark.render());
        assert_eq!(first, "<h1 id=\"1\">1</h1>\n<h2 id=\"2\">2</h2>");
    }

    #[test]
    fn test_add_render_fn_replaces_previous() {
        let mut mark = Mark::new("hello", None);
        mark.add_render_fn(NodeKind::Text, |_, _| "first".to_string());
        mark.add_render_fn(NodeKind::Text, |_, _| "second".to_string());
        assert_eq!(mark.render(), "<p>second</p>");
    }

    #[test]
    fn test_overrides_compose_through_children() {
        let mut mark = Mark::new("*a* and *b*", None);
        mark.add_render_fn(NodeKind::Emphasis, |node, r| match node {
            Node::Emphasis(em) => format!("<i>{}</i>", r.render_children(&em.children)),
            _ => r.render_default(node),
        });
        mark.add_render_fn(NodeKind::Text, |node, r| {
            r.render_default(node).to_uppercase()
        });
        assert_eq!(mark.render(), "<p><i>A</i> AND <i>B</i></p>");
    }

    #[test]
    fn test_instances_are_independent() {
        let mut custom = Mark::new("x", None);
        custom.add_render_fn(NodeKind::Paragraph, |_, _| "<custom>".to_string());
        let plain = Mark::new("x", None);
        assert_eq!(custom.render(), "<custom>");
        assert_eq!(plain.render(), "<p>x</p>");
    }

    #[test]
    fn test_options_are_kept() {
        let options = Options {
            smartypants: true,
            ..Options::default()
        };
        let mark = Mark::new("a -- b", Some(options));
        assert!(mark.options().smartypants);
        assert_eq!(mark.render(), "<p>a \u{2013} b</p>");
        assert_eq!(render_with_options("a -- b", &options), mark.render());
    }
}
