//! mark-parser: markdown parser for mark
//!
//! Parsing runs in three stages:
//! - [`lines`] splits the input into physical lines
//! - [`block`] groups lines into headings, lists, code blocks and paragraphs
//! - [`inline`] resolves the text of each block into inline nodes
//!
//! ```rust
//! use mark_ast::{Node, Options};
//!
//! let doc = mark_parser::parse("# Title\n\n*hi*", &Options::default());
//! let Node::Document(doc) = doc else { unreachable!() };
//! assert_eq!(doc.children.len(), 2);
//! ```

pub mod block;
pub mod inline;
pub mod lines;

pub use block::BlockParser;
pub use inline::resolve;
pub use lines::{Line, LineSplitter};

use mark_ast::{Node, Options};

/// Parse markdown source into a `Document` node
pub fn parse(input: &str, options: &Options) -> Node {
    Node::document(BlockParser::new(input, options).parse())
}
