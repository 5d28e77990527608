//! Typographic substitutions for text runs

const FRACTIONS: [(&str, char); 3] = [("1/2", '½'), ("1/4", '¼'), ("3/4", '¾')];

/// Apply smartypants substitutions to a literal text run.
///
/// Runs on unescaped text, before HTML escaping. `before` is the character
/// rendered just ahead of the run (`None` at the start of a block), so quote
/// direction carries across inline markup.
pub fn smarten(text: &str, before: Option<char>, fractions: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let prev = match i.checked_sub(1) {
            Some(p) => Some(chars[p]),
            None => before,
        };

        match ch {
            '-' if chars.get(i + 1) == Some(&'-') => {
                if chars.get(i + 2) == Some(&'-') {
                    out.push('—');
                    i += 3;
                } else {
                    out.push('–');
                    i += 2;
                }
                continue;
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                out.push('…');
                i += 3;
                continue;
            }
            '"' => out.push(if is_opening(prev) { '“' } else { '”' }),
            '\'' => out.push(if is_opening(prev) { '‘' } else { '’' }),
            _ => {
                if fractions {
                    if let Some((len, glyph)) = match_fraction(&chars, i, prev) {
                        out.push(glyph);
                        i += len;
                        continue;
                    }
                }
                out.push(ch);
            }
        }
        i += 1;
    }

    out
}

/// A quote opens when it follows nothing, whitespace or an opening bracket
fn is_opening(prev: Option<char>) -> bool {
    prev.is_none_or(|c| c.is_whitespace() || "([{—–".contains(c))
}

fn match_fraction(chars: &[char], start: usize, prev: Option<char>) -> Option<(usize, char)> {
    let word_char = |c: &char| c.is_alphanumeric() || *c == '/';
    if prev.as_ref().is_some_and(word_char) {
        return None;
    }
    for (pattern, glyph) in FRACTIONS {
        let len = pattern.len();
        let Some(candidate) = chars.get(start..start + len) else {
            continue;
        };
        if candidate.iter().copied().eq(pattern.chars())
            && !chars.get(start + len).is_some_and(word_char)
        {
            return Some((len, glyph));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashes() {
        assert_eq!(smarten("a -- b", None, false), "a – b");
        assert_eq!(smarten("a---b", None, false), "a—b");
        assert_eq!(smarten("a - b", None, false), "a - b");
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(smarten("wait...", None, false), "wait…");
        assert_eq!(smarten("a..b", None, false), "a..b");
    }

    #[test]
    fn test_double_quotes() {
        assert_eq!(smarten("\"foo\"", None, false), "“foo”");
        assert_eq!(smarten("say \"hi\" now", None, false), "say “hi” now");
    }

    #[test]
    fn test_single_quotes_and_apostrophes() {
        assert_eq!(smarten("'foo'", None, false), "‘foo’");
        assert_eq!(smarten("don't", None, false), "don’t");
    }

    #[test]
    fn test_quote_direction_from_preceding_character() {
        assert_eq!(smarten("\"", Some('o'), false), "”");
        assert_eq!(smarten("\"", Some(' '), false), "“");
        assert_eq!(smarten("' loudly", Some('i'), false), "’ loudly");
        assert_eq!(smarten("say \"", None, false), "say “");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(smarten("1/2 cup", None, true), "½ cup");
        assert_eq!(smarten("3/4", None, true), "¾");
        assert_eq!(smarten("11/2", None, true), "11/2");
        assert_eq!(smarten("1/25", None, true), "1/25");
        assert_eq!(smarten("1/2 cup", None, false), "1/2 cup");
        assert_eq!(smarten("1/2", Some('x'), true), "1/2");
    }
}
