//! Node tree to HTML renderer
//!
//! Every node is first looked up in the [`Overrides`] table by its
//! [`NodeKind`]; only when no override is registered does the built-in markup
//! for that kind apply.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

use crate::node::{CodeBlock, Heading, Image, Link, List, ListItem, Node, NodeKind};
use crate::options::Options;
use crate::smartypants::smarten;

/// Caller-supplied render function for one node kind.
///
/// The function receives the node and the active [`Renderer`], which it can
/// use to render children (overrides included) or fall back to the built-in
/// markup.
pub type RenderFn = Box<dyn Fn(&Node, &Renderer<'_>) -> String + Send + Sync>;

/// Per-converter table of render overrides keyed by node kind
#[derive(Default)]
pub struct Overrides {
    fns: HashMap<NodeKind, RenderFn>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` for `kind`, replacing any earlier registration
    pub fn insert<F>(&mut self, kind: NodeKind, f: F)
    where
        F: Fn(&Node, &Renderer<'_>) -> String + Send + Sync + 'static,
    {
        self.fns.insert(kind, Box::new(f));
    }

    pub fn get(&self, kind: NodeKind) -> Option<&RenderFn> {
        self.fns.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.fns.keys().collect();
        kinds.sort();
        f.debug_struct("Overrides").field("kinds", &kinds).finish()
    }
}

/// Render a node tree to HTML
pub fn render_html(node: &Node, options: &Options, overrides: &Overrides) -> String {
    Renderer::new(options, overrides).render(node)
}

/// HTML renderer state: read-only options and override table
#[derive(Debug, Clone)]
pub struct Renderer<'a> {
    options: &'a Options,
    overrides: &'a Overrides,
    /// Last inline character rendered in the current block, for smart quotes
    last_char: Cell<Option<char>>,
}

impl<'a> Renderer<'a> {
    pub fn new(options: &'a Options, overrides: &'a Overrides) -> Self {
        Self {
            options,
            overrides,
            last_char: Cell::new(None),
        }
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Render a node, consulting the override table first
    pub fn render(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Render a node with the built-in markup, ignoring any override for its
    /// own kind (children still go through the override table)
    pub fn render_default(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_default(node, &mut out);
        out
    }

    /// Render a sequence of sibling nodes and concatenate the output
    pub fn render_children(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        self.write_nodes(nodes, &mut out);
        out
    }

    fn write_node(&self, node: &Node, out: &mut String) {
        match self.overrides.get(node.kind()) {
            Some(f) => out.push_str(&f(node, self)),
            None => self.write_default(node, out),
        }
    }

    fn write_nodes(&self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            self.write_node(node, out);
        }
    }

    fn write_default(&self, node: &Node, out: &mut String) {
        if node.kind().is_block() {
            self.last_char.set(None);
        }
        match node {
            Node::Document(d) => {
                for (i, child) in d.children.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    self.write_node(child, out);
                }
            }
            Node::Paragraph(p) => self.write_wrapped("p", &p.children, out),
            Node::Heading(h) => self.write_heading(h, out),
            Node::List(l) => self.write_list(l, out),
            Node::ListItem(li) => self.write_list_item(li, out),
            Node::CodeBlock(c) => self.write_code_block(c, out),
            Node::ThematicBreak => out.push_str("<hr>"),
            Node::LineBreak => {
                self.last_char.set(Some('\n'));
                out.push_str("<br>");
            }
            Node::Text(t) => self.write_text(&t.value, out),
            Node::Strong(s) => self.write_wrapped("strong", &s.children, out),
            Node::Emphasis(e) => self.write_wrapped("em", &e.children, out),
            Node::Strikethrough(s) => self.write_wrapped("del", &s.children, out),
            Node::CodeSpan(c) => {
                self.note_last_char(&c.value);
                out.push_str("<code>");
                out.push_str(&escape_code(&c.value));
                out.push_str("</code>");
            }
            Node::Link(l) => self.write_link(l, out),
            Node::Image(img) => {
                self.note_last_char(&img.alt);
                write_image(img, out);
            }
            Node::RawAutolink(a) => {
                self.note_last_char(&a.url);
                out.push_str("<a href=\"");
                out.push_str(&escape_text(&a.url));
                out.push_str("\">");
                out.push_str(&escape_text(&a.url));
                out.push_str("</a>");
            }
        }
    }

    fn write_wrapped(&self, tag: &str, children: &[Node], out: &mut String) {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        self.write_nodes(children, out);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn write_heading(&self, h: &Heading, out: &mut String) {
        out.push_str(&format!("<h{} id=\"{}\">", h.level, escape_text(&h.id)));
        self.write_nodes(&h.children, out);
        out.push_str(&format!("</h{}>", h.level));
    }

    fn write_list(&self, l: &List, out: &mut String) {
        let tag = if l.ordered { "ol" } else { "ul" };
        out.push('<');
        out.push_str(tag);
        out.push_str(">\n");
        for item in &l.children {
            self.write_node(item, out);
            out.push('\n');
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn write_list_item(&self, li: &ListItem, out: &mut String) {
        out.push_str("<li>");
        self.write_nodes(&li.children, out);
        if let Some(sublist) = &li.sublist {
            self.write_node(sublist, out);
        }
        out.push_str("</li>");
    }

    fn write_code_block(&self, c: &CodeBlock, out: &mut String) {
        out.push_str("<pre><code");
        if let Some(lang) = &c.lang {
            out.push_str(" class=\"lang-");
            out.push_str(&escape_text(lang));
            out.push('"');
        }
        out.push('>');
        out.push_str(&escape_code(&c.value));
        out.push_str("</code></pre>");
    }

    fn write_text(&self, value: &str, out: &mut String) {
        if self.options.smartypants {
            let prev = self.last_char.get();
            out.push_str(&escape_text(&smarten(value, prev, self.options.fractions)));
        } else {
            out.push_str(&escape_text(value));
        }
        self.note_last_char(value);
    }

    fn note_last_char(&self, s: &str) {
        if let Some(c) = s.chars().next_back() {
            self.last_char.set(Some(c));
        }
    }

    fn write_link(&self, l: &Link, out: &mut String) {
        out.push_str("<a href=\"");
        out.push_str(&escape_text(&l.href));
        out.push('"');
        if let Some(title) = &l.title {
            out.push_str(" title=\"");
            out.push_str(&escape_text(title));
            out.push('"');
        }
        out.push('>');
        self.write_nodes(&l.children, out);
        out.push_str("</a>");
    }
}

fn write_image(img: &Image, out: &mut String) {
    out.push_str("<img src=\"");
    out.push_str(&escape_text(&img.src));
    out.push_str("\" alt=\"");
    out.push_str(&escape_text(&img.alt));
    out.push('"');
    if let Some(title) = &img.title {
        out.push_str(" title=\"");
        out.push_str(&escape_text(title));
        out.push('"');
    }
    out.push('>');
}

/// Escape text for HTML, leaving named and numeric entities such as `&copy;`
/// or `&#169;` untouched
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.char_indices() {
        match ch {
            '&' if entity_len(&s[i..]).is_some() => out.push('&'),
            _ => push_escaped(ch, &mut out),
        }
    }
    out
}

/// Escape code content for HTML; every `&` is escaped
pub fn escape_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        push_escaped(ch, &mut out);
    }
    out
}

fn push_escaped(ch: char, out: &mut String) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Length of the entity reference at the start of `s`, if there is one
fn entity_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }

    let (body_start, is_body): (usize, fn(u8) -> bool) = match bytes.get(1) {
        Some(b'#') if matches!(bytes.get(2), Some(b'x' | b'X')) => (3, |b: u8| b.is_ascii_hexdigit()),
        Some(b'#') => (2, |b: u8| b.is_ascii_digit()),
        Some(b) if b.is_ascii_alphabetic() => (1, |b: u8| b.is_ascii_alphanumeric()),
        _ => return None,
    };

    let body = bytes[body_start..]
        .iter()
        .take(32)
        .take_while(|&&b| is_body(b))
        .count();
    let end = body_start + body;
    (body > 0 && bytes.get(end) == Some(&b';')).then_some(end + 1)
}
