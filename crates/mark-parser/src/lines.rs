//! Line splitter
//!
//! Splits raw input into physical lines for the block parser. Leading and
//! trailing whitespace is kept: indentation drives code block and list
//! detection, and trailing spaces mark hard line breaks.

/// Columns a tab advances when measuring indentation
pub const TAB_WIDTH: usize = 4;

/// One physical line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Line text without its terminator (`\n` or `\r\n`)
    pub text: &'a str,
    /// Line number (1-indexed)
    pub number: usize,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str, number: usize) -> Self {
        Self { text, number }
    }

    /// Whether the line holds only spaces and tabs
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(|c| c == ' ' || c == '\t')
    }

    /// Width of the leading whitespace, counting a tab as [`TAB_WIDTH`]
    pub fn indent_width(&self) -> usize {
        self.text
            .chars()
            .take_while(|&c| c == ' ' || c == '\t')
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum()
    }

    /// The line without its leading whitespace
    pub fn trim_indent(&self) -> &'a str {
        self.text.trim_start_matches([' ', '\t'])
    }

    /// The line with one level of code indentation (a tab or four spaces)
    /// removed, or `None` if it is not indented that far
    pub fn strip_code_indent(&self) -> Option<&'a str> {
        if let Some(rest) = self.text.strip_prefix('\t') {
            return Some(rest);
        }
        self.text.strip_prefix("    ")
    }
}

/// Iterator over the lines of an input string
pub struct LineSplitter<'a> {
    input: &'a str,
    /// Current byte position
    pos: usize,
    /// Current line (1-indexed)
    line: usize,
    done: bool,
}

impl<'a> LineSplitter<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    /// Split the entire input
    pub fn split(input: &'a str) -> Vec<Line<'a>> {
        LineSplitter::new(input).collect()
    }
}

impl<'a> Iterator for LineSplitter<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.input[self.pos..];
        let number = self.line;

        let (text, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => {
                self.done = true;
                (rest, rest.len())
            }
        };
        // Handle \r\n as a single terminator
        let text = text.strip_suffix('\r').unwrap_or(text);

        self.pos += consumed;
        self.line += 1;
        Some(Line::new(text, number))
    }
}
