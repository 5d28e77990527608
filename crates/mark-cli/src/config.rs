//! Configuration file support for the mark CLI
//!
//! Loads settings from a `_mark.toml` configuration file.

use anyhow::{Context, Result};
use mark_core::Options;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_mark.toml";

/// Root configuration structure
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Parser configuration
    #[serde(skip_serializing_if = "ParseConfig::is_empty")]
    pub parse: ParseConfig,
    /// Renderer configuration
    #[serde(skip_serializing_if = "RenderConfig::is_empty")]
    pub render: RenderConfig,
}

/// Parser configuration
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Recognize fenced code, `~~strikethrough~~` and bare URLs (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gfm: Option<bool>,
}

impl ParseConfig {
    fn is_empty(&self) -> bool {
        self.gfm.is_none()
    }
}

/// Renderer configuration
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Curly quotes, dashes and ellipses in text (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smartypants: Option<bool>,
    /// Replace 1/2, 1/4 and 3/4 with fraction glyphs; needs smartypants (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractions: Option<bool>,
}

impl RenderConfig {
    fn is_empty(&self) -> bool {
        self.smartypants.is_none() && self.fractions.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_mark.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Layer the values set in this file over `base`
    pub fn apply(&self, base: Options) -> Options {
        Options {
            gfm: self.parse.gfm.unwrap_or(base.gfm),
            smartypants: self.render.smartypants.unwrap_or(base.smartypants),
            fractions: self.render.fractions.unwrap_or(base.fractions),
        }
    }

    /// A configuration with every field set from `options`
    pub fn from_options(options: &Options) -> Self {
        Config {
            parse: ParseConfig {
                gfm: Some(options.gfm),
            },
            render: RenderConfig {
                smartypants: Some(options.smartypants),
                fractions: Some(options.fractions),
            },
        }
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.parse.gfm.is_none());
        assert!(config.render.smartypants.is_none());
        assert_eq!(config.apply(Options::default()), Options::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [parse]
            gfm = false

            [render]
            smartypants = true
            fractions = true
            "#,
        )
        .unwrap();

        assert_eq!(config.parse.gfm, Some(false));
        assert_eq!(config.render.smartypants, Some(true));
        assert_eq!(config.render.fractions, Some(true));
    }

    #[test]
    fn test_partial_config_keeps_base() {
        let config: Config = toml::from_str(
            r#"
            [render]
            smartypants = true
            "#,
        )
        .unwrap();

        let options = config.apply(Options::default());
        assert!(options.gfm);
        assert!(options.smartypants);
        assert!(!options.fractions);
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let config: Config = toml::from_str(
            r#"
            [render]
            theme = "dark"
            "#,
        )
        .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_serialize_empty_config() {
        let toml = Config::default().to_toml().unwrap();
        assert!(!toml.contains("[parse]"));
        assert!(!toml.contains("[render]"));
    }

    #[test]
    fn test_roundtrip() {
        let options = Options {
            gfm: false,
            smartypants: true,
            fractions: false,
        };
        let toml = Config::from_options(&options).to_toml().unwrap();
        assert!(toml.contains("gfm = false"));
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.apply(Options::default()), options);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[parse]\ngfm = false\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.parse.gfm, Some(false));
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[parse]\ngfm = \"yes\"\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
