//! Inline resolver
//!
//! Turns the text payload of a block into inline nodes. At each position the
//! recognizers are tried in a fixed order (escape, code span, angled
//! autolink, bare autolink, link, image, delimiter run); anything that does
//! not match is kept as literal text. Emphasis is matched with an explicit
//! delimiter stack, so there is no backtracking.

use std::collections::HashMap;

use mark_ast::{Node, Options};

/// Characters a backslash can escape
pub const ESCAPABLE: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '#', '+', '-', '.', '!', '~', '|', '<', '>',
];

const ANGLED_SCHEMES: &[&str] = &["http://", "https://", "ftp://", "mailto:"];
const BARE_SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// Characters trimmed from the end of a bare autolink, so that sentence
/// punctuation and closing delimiter runs stay outside the URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '*', '_', '~'];

/// Resolve a text payload into inline nodes
pub fn resolve(text: &str, options: &Options) -> Vec<Node> {
    InlineParser::new(text, options, false).parse()
}

#[derive(Debug)]
enum Piece {
    Node(Node),
    Delim(Delim),
}

/// An unmatched delimiter run still waiting for a closer
#[derive(Debug, Clone, Copy)]
struct Delim {
    ch: char,
    count: usize,
}

struct InlineParser<'a> {
    text: &'a str,
    pos: usize,
    options: &'a Options,
    /// Inside a link label: no nested links or autolinks
    in_link: bool,
    pieces: Vec<Piece>,
    /// Indices into `pieces` of open delimiter runs, innermost last
    openers: Vec<usize>,
    /// Offset of the `]` matching each `[`, filled on the first `[`
    label_ends: Option<HashMap<usize, usize>>,
    /// Last destination url scan, as `(start, end)` offsets
    url_scan: Option<(usize, usize)>,
}

impl<'a> InlineParser<'a> {
    fn new(text: &'a str, options: &'a Options, in_link: bool) -> Self {
        Self {
            text,
            pos: 0,
            options,
            in_link,
            pieces: Vec::new(),
            openers: Vec::new(),
            label_ends: None,
            url_scan: None,
        }
    }

    fn parse(mut self) -> Vec<Node> {
        while self.pos < self.text.len() {
            self.step();
        }
        collect_nodes(self.pieces)
    }

    fn step(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(c) = rest.chars().next() else {
            return;
        };

        match c {
            '\\' => self.parse_escape(rest),
            '`' => self.parse_code_span(rest),
            '<' => self.parse_angled_autolink(rest),
            '[' => self.parse_link(rest),
            '!' => self.parse_image(rest),
            '*' | '_' | '~' => self.parse_delimiter_run(c),
            ' ' => self.parse_spaces(rest),
            'h' | 'f' if self.options.gfm && !self.in_link && self.at_word_start() => {
                self.parse_bare_autolink(rest)
            }
            _ => self.literal(c.len_utf8()),
        }
    }

    fn parse_escape(&mut self, rest: &str) {
        match rest[1..].chars().next() {
            Some(c) if ESCAPABLE.contains(&c) => {
                self.push_literal(&rest[1..2]);
                self.pos += 2;
            }
            _ => self.literal(1),
        }
    }

    fn parse_code_span(&mut self, rest: &str) {
        match try_parse_code_span(rest) {
            Some((len, content)) => {
                self.push_node(Node::code_span(content));
                self.pos += len;
            }
            // An unmatched run is literal as a whole
            None => self.literal(count_run(rest, '`')),
        }
    }

    fn parse_angled_autolink(&mut self, rest: &str) {
        if !self.in_link
            && let Some((len, url)) = try_parse_angled_autolink(rest)
        {
            self.push_node(Node::autolink(url));
            self.pos += len;
            return;
        }
        self.literal(1);
    }

    fn parse_bare_autolink(&mut self, rest: &str) {
        match try_parse_bare_autolink(rest) {
            Some(len) => {
                self.push_node(Node::autolink(&rest[..len]));
                self.pos += len;
            }
            None => self.literal(1),
        }
    }

    fn parse_link(&mut self, rest: &str) {
        if !self.in_link
            && let Some(close) = self.label_end(self.pos)
            && let Some(link) = self.link_at(rest, close)
        {
            let children = InlineParser::new(link.label, self.options, true).parse();
            let node = match link.title {
                Some(title) => Node::link_with_title(link.url, title, children),
                None => Node::link(link.url, children),
            };
            self.push_node(node);
            self.pos += link.len;
            return;
        }
        self.literal(1);
    }

    fn parse_image(&mut self, rest: &str) {
        let parts = match rest.strip_prefix('!') {
            Some(after) if after.starts_with('[') => self
                .label_end(self.pos + 1)
                .and_then(|close| self.link_at(after, close)),
            _ => None,
        };
        match parts {
            Some(image) => {
                let title = image.title.map(str::to_string);
                self.push_node(Node::image(image.url, image.label, title));
                self.pos += image.len + 1;
            }
            None => self.literal(1),
        }
    }

    /// Offset of the `]` closing the label opened at `open`, relative to
    /// the character after `open`
    fn label_end(&mut self, open: usize) -> Option<usize> {
        let text = self.text;
        let ends = self.label_ends.get_or_insert_with(|| match_brackets(text));
        ends.get(&open).map(|&close| close - open - 1)
    }

    /// Link parts for `rest` (starting with `[`). No url contains whitespace
    /// or `)`, so a later destination starting inside the last scanned url
    /// ends where that one did.
    fn link_at<'t>(&mut self, rest: &'t str, close: usize) -> Option<LinkParts<'t>> {
        let total = self.text.len();
        let scan = &mut self.url_scan;
        link_parts(rest, close, |inner| {
            let start = total - inner.len();
            match *scan {
                Some((from, end)) if from <= start && start < end => end - start,
                _ => {
                    let len = url_len(inner);
                    *scan = Some((start, start + len));
                    len
                }
            }
        })
    }

    fn parse_spaces(&mut self, rest: &str) {
        let run = count_run(rest, ' ');
        if run >= 2 && rest[run..].starts_with('\n') {
            self.push_node(Node::line_break());
            self.pos += run + 1;
        } else {
            self.literal(run);
        }
    }

    fn parse_delimiter_run(&mut self, ch: char) {
        let text = self.text;
        let rest = &text[self.pos..];
        let count = count_run(rest, ch);
        let prev = text[..self.pos].chars().next_back();
        let next = rest[count..].chars().next();
        self.pos += count;

        if ch == '~' && (!self.options.gfm || count < 2) {
            self.push_literal(&run_text(ch, count));
            return;
        }

        let can_open = next.is_some_and(|c| !c.is_whitespace());
        let can_close = prev.is_some_and(|c| !c.is_whitespace());

        // A run that could go either way stays open unless it is as long as
        // the innermost opener it would close
        let closes = can_close
            && !(can_open && self.innermost_opener(ch).is_some_and(|d| d.count != count));

        let mut remaining = count;
        if closes {
            remaining = self.close_run(ch, count);
        }
        if remaining == 0 {
            return;
        }

        if can_open {
            self.openers.push(self.pieces.len());
            self.pieces.push(Piece::Delim(Delim {
                ch,
                count: remaining,
            }));
        } else {
            self.push_literal(&run_text(ch, remaining));
        }
    }

    /// Match a closing run against the open runs of the same character.
    ///
    /// Returns the number of closer characters left unmatched. Openers that
    /// sit above the matched one on the stack can no longer close and stay
    /// behind as literal text.
    fn close_run(&mut self, ch: char, mut count: usize) -> usize {
        while count > 0 {
            let Some(sp) = self
                .openers
                .iter()
                .rposition(|&i| matches!(&self.pieces[i], Piece::Delim(d) if d.ch == ch))
            else {
                break;
            };
            self.openers.truncate(sp + 1);

            let oi = self.openers[sp];
            let opener = match &self.pieces[oi] {
                Piece::Delim(d) => *d,
                Piece::Node(_) => break,
            };
            let Some(width) = pair_width(ch, opener.count, count) else {
                break;
            };
            log::trace!(
                "pairing {ch:?} run: opener {}, closer {count}, width {width}",
                opener.count
            );

            let children = collect_nodes(self.pieces.drain(oi + 1..));
            let node = match (ch, width) {
                ('~', _) => Node::strikethrough(children),
                (_, 2) => Node::strong(children),
                _ => Node::emphasis(children),
            };

            count -= width;
            if opener.count == width {
                self.pieces.truncate(oi);
                self.openers.pop();
            } else if let Piece::Delim(d) = &mut self.pieces[oi] {
                d.count -= width;
            }
            self.pieces.push(Piece::Node(node));
        }
        count
    }

    fn innermost_opener(&self, ch: char) -> Option<Delim> {
        self.openers.iter().rev().find_map(|&i| match &self.pieces[i] {
            Piece::Delim(d) if d.ch == ch => Some(*d),
            _ => None,
        })
    }

    /// After whitespace, an opening parenthesis or a delimiter run
    fn at_word_start(&self) -> bool {
        self.text[..self.pos]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '(' | '*' | '_' | '~'))
    }

    /// Emit `len` bytes of source as literal text
    fn literal(&mut self, len: usize) {
        let end = self.pos + len;
        let text = self.text;
        self.push_literal(&text[self.pos..end]);
        self.pos = end;
    }

    fn push_literal(&mut self, s: &str) {
        if let Some(Piece::Node(Node::Text(t))) = self.pieces.last_mut() {
            t.value.push_str(s);
        } else {
            self.pieces.push(Piece::Node(Node::text(s)));
        }
    }

    fn push_node(&mut self, node: Node) {
        self.pieces.push(Piece::Node(node));
    }
}

/// How many characters one pairing consumes from each side.
///
/// `~~` always pairs two. For `*` and `_`, two runs of three or more pair
/// as emphasis first so the strong pairing ends up outermost.
fn pair_width(ch: char, opener: usize, closer: usize) -> Option<usize> {
    if ch == '~' {
        return (opener >= 2 && closer >= 2).then_some(2);
    }
    if opener >= 3 && closer >= 3 {
        Some(1)
    } else if opener >= 2 && closer >= 2 {
        Some(2)
    } else {
        Some(1)
    }
}

fn collect_nodes(pieces: impl IntoIterator<Item = Piece>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Node(Node::Text(t)) => push_text(&mut nodes, &t.value),
            Piece::Node(node) => nodes.push(node),
            Piece::Delim(d) => push_text(&mut nodes, &run_text(d.ch, d.count)),
        }
    }
    nodes
}

fn push_text(nodes: &mut Vec<Node>, s: &str) {
    if let Some(Node::Text(t)) = nodes.last_mut() {
        t.value.push_str(s);
    } else {
        nodes.push(Node::text(s));
    }
}

fn run_text(ch: char, count: usize) -> String {
    std::iter::repeat_n(ch, count).collect()
}

fn count_run(text: &str, ch: char) -> usize {
    text.chars().take_while(|&c| c == ch).count() * ch.len_utf8()
}

// ============================================================================
// Recognizers
// ============================================================================

/// Try to parse a code span at the start of `text`.
///
/// Returns the consumed length and the verbatim content.
pub fn try_parse_code_span(text: &str) -> Option<(usize, &str)> {
    let open = count_run(text, '`');
    if open == 0 {
        return None;
    }

    let body = &text[open..];
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if run == open {
                return Some((open + i + run, &body[..i]));
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

/// Try to parse `<scheme:...>` at the start of `text`
pub fn try_parse_angled_autolink(text: &str) -> Option<(usize, &str)> {
    let inner = text.strip_prefix('<')?;
    let end = inner.find(|c: char| c == '>' || c == '<' || c.is_whitespace())?;
    if inner.as_bytes()[end] != b'>' {
        return None;
    }

    let url = &inner[..end];
    let scheme = ANGLED_SCHEMES.iter().find(|s| url.starts_with(**s))?;
    if url.len() == scheme.len() {
        return None;
    }
    Some((end + 2, url))
}

/// Try to parse a bare URL at the start of `text`, returning its length
pub fn try_parse_bare_autolink(text: &str) -> Option<usize> {
    let scheme = BARE_SCHEMES.iter().find(|s| text.starts_with(**s))?;
    let end = text
        .find(|c: char| c.is_whitespace() || c == '<')
        .unwrap_or(text.len());

    let mut url = &text[..end];
    let opens = url.matches('(').count();
    let mut closes = url.matches(')').count();
    while let Some(last) = url.chars().next_back() {
        if last == ')' && closes > opens {
            closes -= 1;
        } else if !TRAILING_PUNCTUATION.contains(&last) {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    (url.len() > scheme.len()).then_some(url.len())
}

/// The parts of `[label](url "title")`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkParts<'t> {
    /// Consumed length, from `[` through `)`
    len: usize,
    label: &'t str,
    url: &'t str,
    title: Option<&'t str>,
}

/// Parse `[label](url "title")` at the start of `text`, given the offset of
/// the closing `]` after the opening bracket
fn link_parts<'t>(
    text: &'t str,
    close: usize,
    url_len: impl FnOnce(&str) -> usize,
) -> Option<LinkParts<'t>> {
    let after = text.strip_prefix('[')?;
    let label = &after[..close];

    let (dest_len, url, title) = try_parse_destination(&after[close + 1..], url_len)?;
    Some(LinkParts {
        len: 1 + close + 1 + dest_len,
        label,
        url,
        title,
    })
}

/// Pair every `[` with its `]` in one pass, keyed by byte offset
fn match_brackets(text: &str) -> HashMap<usize, usize> {
    let bytes = text.as_bytes();
    let mut ends = HashMap::new();
    let mut open = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => open.push(i),
            b']' => {
                if let Some(start) = open.pop() {
                    ends.insert(start, i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    ends
}

/// Length of the url at the start of a destination
fn url_len(inner: &str) -> usize {
    inner
        .find(|c: char| c.is_whitespace() || c == ')')
        .unwrap_or(inner.len())
}

/// Parse `(url "title")`, returning the consumed length, url and title
fn try_parse_destination<'t>(
    text: &'t str,
    url_len: impl FnOnce(&str) -> usize,
) -> Option<(usize, &'t str, Option<&'t str>)> {
    const WS: [char; 3] = [' ', '\t', '\n'];

    let inner = text.strip_prefix('(')?.trim_start_matches(WS);
    let url_len = url_len(inner);
    let url = &inner[..url_len];

    let mut rest = inner[url_len..].trim_start_matches(WS);
    let mut title = None;
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        title = Some(&quoted[..end]);
        rest = quoted[end + 1..].trim_start_matches(WS);
    }

    let tail = rest.strip_prefix(')')?;
    Some((text.len() - tail.len(), url, title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Node> {
        resolve(text, &Options::default())
    }

    fn text(s: &str) -> Node {
        Node::text(s)
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("foobar"), vec![text("foobar")]);
        assert_eq!(parse("foo|bar"), vec![text("foo|bar")]);
        assert_eq!(parse(""), vec![]);
    }

    #[test]
    fn test_strong_and_emphasis() {
        assert_eq!(
            parse("__bar__ foo"),
            vec![Node::strong(vec![text("bar")]), text(" foo")]
        );
        assert_eq!(
            parse("_bar_baz"),
            vec![Node::emphasis(vec![text("bar")]), text("baz")]
        );
        assert_eq!(
            parse("**bar**__baz__"),
            vec![
                Node::strong(vec![text("bar")]),
                Node::strong(vec![text("baz")])
            ]
        );
    }

    #[test]
    fn test_triple_run() {
        assert_eq!(
            parse("___foo___"),
            vec![Node::strong(vec![Node::emphasis(vec![text("foo")])])]
        );
    }

    #[test]
    fn test_split_closer() {
        assert_eq!(
            parse("__foo _bar___"),
            vec![Node::strong(vec![
                text("foo "),
                Node::emphasis(vec![text("bar")])
            ])]
        );
    }

    #[test]
    fn test_mixed_delimiters_nest() {
        assert_eq!(
            parse("~~__*mixim*__~~"),
            vec![Node::strikethrough(vec![Node::strong(vec![
                Node::emphasis(vec![text("mixim")])
            ])])]
        );
        assert_eq!(
            parse("_**mixim**_"),
            vec![Node::emphasis(vec![Node::strong(vec![text("mixim")])])]
        );
    }

    #[test]
    fn test_unmatched_delimiters_are_literal() {
        assert_eq!(parse("*foo"), vec![text("*foo")]);
        assert_eq!(parse("foo *"), vec![text("foo *")]);
        assert_eq!(parse("a ~ b ~c~"), vec![text("a ~ b ~c~")]);
        assert_eq!(
            parse("*a**"),
            vec![Node::emphasis(vec![text("a")]), text("*")]
        );
    }

    #[test]
    fn test_strikethrough_requires_gfm() {
        let options = Options {
            gfm: false,
            ..Options::default()
        };
        assert_eq!(resolve("~~x~~", &options), vec![text("~~x~~")]);
        assert_eq!(parse("~~x~~"), vec![Node::strikethrough(vec![text("x")])]);
    }

    #[test]
    fn test_escape_consumes_one_character() {
        assert_eq!(
            parse("\\**foo\\**"),
            vec![text("*"), Node::emphasis(vec![text("foo*")])]
        );
        assert_eq!(parse("\\*foo\\*"), vec![text("*foo*")]);
        assert_eq!(parse("\\## header"), vec![text("## header")]);
    }

    #[test]
    fn test_backslash_before_other_characters_is_literal() {
        assert_eq!(parse("\\==="), vec![text("\\===")]);
        assert_eq!(parse("trailing \\"), vec![text("trailing \\")]);
    }

    #[test]
    fn test_code_span() {
        assert_eq!(
            parse("`bool` and thats it."),
            vec![Node::code_span("bool"), text(" and thats it.")]
        );
        assert_eq!(parse("``a ` b``"), vec![Node::code_span("a ` b")]);
        assert_eq!(parse("`*x*`"), vec![Node::code_span("*x*")]);
        assert_eq!(parse("``unclosed`"), vec![text("``unclosed`")]);
    }

    #[test]
    fn test_links() {
        assert_eq!(
            parse("[text](link \"title\")"),
            vec![Node::link_with_title("link", "title", vec![text("text")])]
        );
        assert_eq!(parse("[](link)"), vec![Node::link("link", vec![])]);
        assert_eq!(
            parse("Link: [example](#)"),
            vec![text("Link: "), Node::link("#", vec![text("example")])]
        );
        assert_eq!(parse("Link: [not really"), vec![text("Link: [not really")]);
        assert_eq!(parse("[a] (b)"), vec![text("[a] (b)")]);
    }

    #[test]
    fn test_link_label_is_resolved() {
        assert_eq!(
            parse("[**a** [b]](u)"),
            vec![Node::link(
                "u",
                vec![Node::strong(vec![text("a")]), text(" [b]")]
            )]
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(
            parse("![name](url \"title\")"),
            vec![Node::image("url", "name", Some("title".to_string()))]
        );
        assert_eq!(
            parse("img: ![name]()"),
            vec![text("img: "), Node::image("", "name", None)]
        );
        assert_eq!(parse("!not"), vec![text("!not")]);
    }

    #[test]
    fn test_angled_autolink() {
        assert_eq!(
            parse("Link: <http://l.co>"),
            vec![text("Link: "), Node::autolink("http://l.co")]
        );
        assert_eq!(parse("Link: <not really"), vec![text("Link: <not really")]);
        assert_eq!(parse("<http://>"), vec![text("<http://>")]);
    }

    #[test]
    fn test_bare_autolink() {
        assert_eq!(
            parse("http://localhost:3000"),
            vec![Node::autolink("http://localhost:3000")]
        );
        assert_eq!(
            parse("see https://a.io/x."),
            vec![text("see "), Node::autolink("https://a.io/x"), text(".")]
        );
        assert_eq!(parse("xhttp://a.io"), vec![text("xhttp://a.io")]);
    }

    #[test]
    fn test_bare_autolink_leaves_closing_delimiters() {
        let link = || Node::autolink("http://a.b");
        assert_eq!(
            parse("*see http://a.b*"),
            vec![Node::emphasis(vec![text("see "), link()])]
        );
        assert_eq!(
            parse("**x http://a.b**"),
            vec![Node::strong(vec![text("x "), link()])]
        );
        assert_eq!(
            parse("~~gone http://a.b~~"),
            vec![Node::strikethrough(vec![text("gone "), link()])]
        );
        assert_eq!(parse("see http://a.b)"), vec![text("see "), link(), text(")")]);
        assert_eq!(
            parse("(http://a.b)"),
            vec![text("("), link(), text(")")]
        );
        assert_eq!(
            parse("http://w.org/a_(b)"),
            vec![Node::autolink("http://w.org/a_(b)")]
        );
    }

    #[test]
    fn test_both_flanking_run_of_other_length_opens() {
        assert_eq!(
            parse("*foo**bar**baz*"),
            vec![Node::emphasis(vec![
                text("foo"),
                Node::strong(vec![text("bar")]),
                text("baz")
            ])]
        );
        assert_eq!(
            parse("_a_b_c_"),
            vec![
                Node::emphasis(vec![text("a")]),
                text("b"),
                Node::emphasis(vec![text("c")])
            ]
        );
    }

    #[test]
    fn test_unmatched_brackets_are_linear() {
        let input = "[".repeat(100_000);
        assert_eq!(parse(&input), vec![text(&input)]);

        let input = "![".repeat(50_000);
        assert_eq!(parse(&input), vec![text(&input)]);

        let input = "[a](b".repeat(50_000);
        assert_eq!(parse(&input), vec![text(&input)]);
    }

    #[test]
    fn test_destination_inside_earlier_url() {
        assert_eq!(
            parse("[a](x[b](y)"),
            vec![Node::link("x[b](y", vec![text("a")])]
        );
        assert_eq!(parse("[a](x[b](y z"), vec![text("[a](x[b](y z")]);
    }

    #[test]
    fn test_link_after_unmatched_brackets() {
        assert_eq!(
            parse("[[[[x](y)"),
            vec![text("[[["), Node::link("y", vec![text("x")])]
        );
        assert_eq!(
            parse(r"[a \] b](c) [d]"),
            vec![Node::link("c", vec![text("a ] b")]), text(" [d]")]
        );
    }

    #[test]
    fn test_bare_autolink_requires_gfm() {
        let options = Options {
            gfm: false,
            ..Options::default()
        };
        assert_eq!(
            resolve("http://a.io", &options),
            vec![text("http://a.io")]
        );
    }

    #[test]
    fn test_hard_line_break() {
        assert_eq!(
            parse("foo  \nbar"),
            vec![text("foo"), Node::line_break(), text("bar")]
        );
        assert_eq!(parse("foo \nbar"), vec![text("foo \nbar")]);
        assert_eq!(parse("foo  "), vec![text("foo  ")]);
    }

    #[test]
    fn test_emphasis_spans_line_break() {
        assert_eq!(
            parse("**a  \nb**"),
            vec![Node::strong(vec![text("a"), Node::line_break(), text("b")])]
        );
    }

    #[test]
    fn test_link_parts() {
        let link = link_parts("[a](b \"c\") rest", 1, url_len).unwrap();
        assert_eq!(link.len, 10);
        assert_eq!(link.label, "a");
        assert_eq!(link.url, "b");
        assert_eq!(link.title, Some("c"));
    }
}
