//! Block parser
//!
//! Consumes the line sequence and produces the top-level blocks of a
//! document. Each block is recognized by its first line, in this order:
//! ATX heading, thematic break, fenced code, indented code, list, and
//! finally paragraph (which also detects setext underlines). Nothing ever
//! fails: unrecognized lines become paragraph text.

use crate::inline::resolve;
use crate::lines::{Line, LineSplitter};
use mark_ast::{List, Node, Options};

/// Block parser over a split input
pub struct BlockParser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    options: &'a Options,
}

impl<'a> BlockParser<'a> {
    pub fn new(input: &'a str, options: &'a Options) -> Self {
        Self {
            lines: LineSplitter::split(input),
            pos: 0,
            options,
        }
    }

    /// Parse every block of the input
    pub fn parse(mut self) -> Vec<Node> {
        let mut blocks = Vec::new();

        while let Some(line) = self.peek() {
            // Blank runs only separate blocks
            if line.is_blank() {
                self.pos += 1;
                continue;
            }
            self.parse_block(line, &mut blocks);
        }

        log::debug!("parsed {} top-level blocks", blocks.len());
        blocks
    }

    fn parse_block(&mut self, line: Line<'a>, blocks: &mut Vec<Node>) {
        if let Some((level, text)) = try_parse_atx_heading(line.text) {
            log::debug!("line {}: heading (level {level})", line.number);
            self.pos += 1;
            blocks.push(Node::heading(level, resolve(text, self.options)));
        } else if is_thematic_break(line.text) {
            log::debug!("line {}: thematic break", line.number);
            self.pos += 1;
            blocks.push(Node::thematic_break());
        } else if let Some(fence) = self.open_fence(line.text) {
            log::debug!("line {}: fenced code ({:?})", line.number, fence.lang);
            blocks.push(self.parse_fenced_code(fence));
        } else if line.strip_code_indent().is_some() {
            log::debug!("line {}: indented code", line.number);
            blocks.push(self.parse_indented_code());
        } else if try_parse_list_marker(&line).is_some() {
            log::debug!("line {}: list", line.number);
            blocks.push(self.parse_list());
        } else {
            self.parse_paragraph(blocks);
        }
    }

    fn parse_fenced_code(&mut self, fence: Fence) -> Node {
        self.pos += 1;
        let mut content = Vec::new();

        while let Some(line) = self.peek() {
            self.pos += 1;
            let trimmed = line.text.trim_end();
            if fence.closes(trimmed.trim_start()) {
                break;
            }
            // A closing fence can trail the last content line
            if let Some(body) = fence.strip_suffix(trimmed) {
                content.push(body);
                break;
            }
            content.push(line.text);
        }

        Node::code_block(fence.lang, content.join("\n"))
    }

    fn parse_indented_code(&mut self) -> Node {
        let mut content = Vec::new();
        let mut interrupted = false;

        while let Some(line) = self.peek() {
            if line.is_blank() {
                break;
            }
            match line.strip_code_indent() {
                Some(code) => {
                    content.push(code);
                    self.pos += 1;
                }
                None => {
                    interrupted = true;
                    break;
                }
            }
        }

        let mut value = content.join("\n");
        if interrupted {
            value.push('\n');
        }
        Node::code_block(None, value)
    }

    /// Parse a list with an explicit stack of open lists, outermost first
    fn parse_list(&mut self) -> Node {
        let mut stack: Vec<PendingList<'a>> = Vec::new();

        while let Some(line) = self.peek() {
            if line.is_blank() {
                if self.list_resumes_after_blank(&stack) {
                    self.pos += 1;
                    continue;
                }
                break;
            }
            if self.starts_other_block(line.text) {
                break;
            }

            match try_parse_list_marker(&line) {
                Some(marker) => {
                    if !push_item(&mut stack, marker, self.options) {
                        break;
                    }
                }
                None => {
                    // Continuation text belongs to the innermost item
                    if let Some(item) = stack.last_mut().and_then(|l| l.items.last_mut()) {
                        item.lines.push(line.trim_indent());
                    }
                }
            }
            self.pos += 1;
        }

        while stack.len() > 1 {
            close_innermost(&mut stack, self.options);
        }
        match stack.pop() {
            Some(root) => Node::List(root.finish(self.options)),
            None => Node::list(false, Vec::new()),
        }
    }

    /// After a blank line the list goes on only with another top-level
    /// item of the same family
    fn list_resumes_after_blank(&self, stack: &[PendingList<'a>]) -> bool {
        let Some(root) = stack.first() else {
            return false;
        };
        let next = self.lines[self.pos..].iter().find(|l| !l.is_blank());
        next.and_then(try_parse_list_marker)
            .is_some_and(|m| m.ordered == root.ordered && m.indent <= root.indent)
    }

    fn parse_paragraph(&mut self, blocks: &mut Vec<Node>) {
        let mut lines = vec![self.lines[self.pos].text];
        self.pos += 1;

        while let Some(line) = self.peek() {
            if line.is_blank() {
                break;
            }
            if let Some(level) = setext_level(line.text) {
                log::debug!("line {}: setext underline (level {level})", line.number);
                self.pos += 1;
                // Only the line directly above the underline is the heading
                if let Some(title) = lines.pop() {
                    if !lines.is_empty() {
                        blocks.push(self.paragraph(&lines));
                    }
                    blocks.push(Node::heading(level, resolve(title.trim(), self.options)));
                }
                return;
            }
            if self.starts_other_block(line.text) || try_parse_list_marker(&line).is_some() {
                break;
            }
            lines.push(line.text);
            self.pos += 1;
        }

        blocks.push(self.paragraph(&lines));
    }

    fn paragraph(&self, lines: &[&str]) -> Node {
        Node::paragraph(resolve(&lines.join("\n"), self.options))
    }

    /// Whether a line opens a block that ends a paragraph or list
    fn starts_other_block(&self, text: &str) -> bool {
        try_parse_atx_heading(text).is_some()
            || is_thematic_break(text)
            || self.open_fence(text).is_some()
    }

    fn open_fence(&self, text: &str) -> Option<Fence> {
        if !self.options.gfm {
            return None;
        }
        try_parse_fence(text)
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }
}

// ============================================================================
// Lists
// ============================================================================

/// A list whose items are still being collected
struct PendingList<'a> {
    indent: usize,
    ordered: bool,
    items: Vec<PendingItem<'a>>,
}

struct PendingItem<'a> {
    lines: Vec<&'a str>,
    sublist: Option<List>,
}

impl<'a> PendingList<'a> {
    fn new(indent: usize, ordered: bool) -> Self {
        Self {
            indent,
            ordered,
            items: Vec::new(),
        }
    }

    fn finish(self, options: &Options) -> List {
        let children = self
            .items
            .into_iter()
            .map(|item| {
                let children = resolve(&item.lines.join("\n"), options);
                match item.sublist {
                    Some(sublist) => Node::list_item_with_sublist(children, sublist),
                    None => Node::list_item(children),
                }
            })
            .collect();
        List {
            ordered: self.ordered,
            children,
        }
    }
}

/// Place an item line on the stack, opening or closing nested lists as its
/// indentation requires. Returns `false` when the line cannot continue the
/// list at all.
fn push_item<'a>(
    stack: &mut Vec<PendingList<'a>>,
    marker: ListMarker<'a>,
    options: &Options,
) -> bool {
    loop {
        let Some(top) = stack.last() else {
            stack.push(PendingList::new(marker.indent, marker.ordered));
            break;
        };
        if marker.indent > top.indent && !top.items.is_empty() {
            stack.push(PendingList::new(marker.indent, marker.ordered));
            break;
        }
        if marker.indent < top.indent && stack.len() > 1 {
            close_innermost(stack, options);
            continue;
        }
        // Nested levels accept either family, the top level does not
        if stack.len() == 1 && top.ordered != marker.ordered {
            return false;
        }
        break;
    }

    if let Some(list) = stack.last_mut() {
        list.items.push(PendingItem {
            lines: vec![marker.content],
            sublist: None,
        });
    }
    true
}

/// Pop the innermost list and hand it to the last item of its parent
fn close_innermost(stack: &mut Vec<PendingList<'_>>, options: &Options) {
    let Some(done) = stack.pop() else {
        return;
    };
    let list = done.finish(options);
    let Some(item) = stack.last_mut().and_then(|l| l.items.last_mut()) else {
        return;
    };
    match &mut item.sublist {
        Some(existing) => existing.children.extend(list.children),
        None => item.sublist = Some(list),
    }
}

/// A recognized list item marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker<'a> {
    /// Indentation width before the marker
    pub indent: usize,
    pub ordered: bool,
    /// Item text after the marker
    pub content: &'a str,
}

/// Recognize `- `, `* `, `+ ` or `1. ` (after optional indentation)
pub fn try_parse_list_marker<'a>(line: &Line<'a>) -> Option<ListMarker<'a>> {
    let rest = line.trim_indent();

    let (ordered, after) = match rest.strip_prefix(['-', '*', '+']) {
        Some(after) => (false, after),
        None => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || digits > 9 {
                return None;
            }
            (true, rest[digits..].strip_prefix('.')?)
        }
    };

    if !after.starts_with([' ', '\t']) {
        return None;
    }

    Some(ListMarker {
        indent: line.indent_width(),
        ordered,
        content: after.trim_start_matches([' ', '\t']),
    })
}

// ============================================================================
// Line recognizers
// ============================================================================

/// Recognize `# text` through `###### text`, returning level and text
pub fn try_parse_atx_heading(text: &str) -> Option<(u8, &str)> {
    let level = text.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = text[level..].strip_prefix(' ')?;
    let title = rest.trim_end_matches([' ', '#']).trim();
    Some((level as u8, title))
}

/// Three or more of one of `*`, `-`, `_`, optionally separated by spaces
pub fn is_thematic_break(text: &str) -> bool {
    let mut marks = text.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '*' | '-' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Setext underline level: `=` gives 1, `-` gives 2
pub fn setext_level(text: &str) -> Option<u8> {
    let text = text.trim_end();
    if text.is_empty() {
        None
    } else if text.bytes().all(|b| b == b'=') {
        Some(1)
    } else if text.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

/// An opening code fence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub ch: char,
    pub len: usize,
    pub lang: Option<String>,
}

impl Fence {
    /// Whether a (trimmed) line is a closing fence
    fn closes(&self, line: &str) -> bool {
        let run = line.chars().take_while(|&c| c == self.ch).count();
        run >= self.len && run == line.len()
    }

    /// Strip a closing fence off the end of a content line
    fn strip_suffix<'t>(&self, line: &'t str) -> Option<&'t str> {
        let body = line.trim_end_matches(self.ch);
        (line.len() - body.len() >= self.len).then_some(body)
    }
}

/// Recognize an opening fence of three or more backticks or tildes
pub fn try_parse_fence(text: &str) -> Option<Fence> {
    let ch = text.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = text.chars().take_while(|&c| c == ch).count();
    if len < 3 {
        return None;
    }

    let info = text[len..].trim();
    // Backticks in the info string mean an inline code span instead
    if ch == '`' && info.contains('`') {
        return None;
    }
    // Only the first word names the language
    let lang = info.split_whitespace().next().map(str::to_string);
    Some(Fence { ch, len, lang })
}
