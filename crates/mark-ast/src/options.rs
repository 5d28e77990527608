//! Conversion options

use serde::{Deserialize, Serialize};

/// Options threaded read-only through parsing and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Recognize GitHub-flavoured constructs: fenced code blocks,
    /// `~~strikethrough~~` and bare `http://` autolinks (default: true)
    pub gfm: bool,
    /// Typographic quotes, dashes and ellipses in text runs (default: false)
    pub smartypants: bool,
    /// With smartypants, turn `1/2`, `1/4` and `3/4` into fraction glyphs
    /// (default: false)
    pub fractions: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gfm: true,
            smartypants: false,
            fractions: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.gfm);
        assert!(!options.smartypants);
        assert!(!options.fractions);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: Options = serde_json::from_str(r#"{"smartypants":true}"#).unwrap();
        assert!(options.smartypants);
        assert!(options.gfm);
    }
}
