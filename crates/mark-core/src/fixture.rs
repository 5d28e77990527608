//! Fixture contract
//!
//! A fixture is a pair of files in one directory: `<name>.text` holds the
//! markdown input and `<name>.html` the expected output. Newlines are removed
//! from both sides before comparing, so block separators are not significant.
//! Fixtures whose name contains `smartypants` render with smartypants on.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::{Options, render_with_options};

/// Input file extension
pub const INPUT_EXTENSION: &str = "text";
/// Expected output file extension
pub const EXPECTED_EXTENSION: &str = "html";

/// One input/expected pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub name: String,
    pub input: PathBuf,
    pub expected: PathBuf,
}

/// Result of checking one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureOutcome {
    Pass,
    /// Both sides with newlines already stripped
    Mismatch { expected: String, actual: String },
}

impl Fixture {
    /// Options the fixture renders with
    pub fn options(&self) -> Options {
        Options {
            smartypants: self.name.contains("smartypants"),
            ..Options::default()
        }
    }

    /// Render the input and compare it with the expected output
    pub fn check(&self) -> Result<FixtureOutcome> {
        let input = fs::read_to_string(&self.input).map_err(|e| Error::io(&self.input, e))?;
        let expected =
            fs::read_to_string(&self.expected).map_err(|e| Error::io(&self.expected, e))?;

        let actual = strip_newlines(&render_with_options(&input, &self.options()));
        let expected = strip_newlines(&expected);

        if actual == expected {
            Ok(FixtureOutcome::Pass)
        } else {
            log::debug!("fixture {} does not match", self.name);
            Ok(FixtureOutcome::Mismatch { expected, actual })
        }
    }
}

/// Summary of a fixture run
#[derive(Debug, Default)]
pub struct FixtureReport {
    pub passed: usize,
    /// Failing fixtures by name
    pub mismatches: Vec<(String, FixtureOutcome)>,
}

impl FixtureReport {
    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Find every fixture in `dir`, sorted by name
pub fn discover(dir: &Path) -> Result<Vec<Fixture>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut fixtures = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.extension().is_none_or(|ext| ext != INPUT_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let expected = path.with_extension(EXPECTED_EXTENSION);
        if !expected.is_file() {
            return Err(Error::MissingExpected { path });
        }
        fixtures.push(Fixture {
            name: name.to_string(),
            input: path.clone(),
            expected,
        });
    }

    fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(fixtures)
}

/// Check every fixture in `dir` in parallel
pub fn run(dir: &Path) -> Result<FixtureReport> {
    let fixtures = discover(dir)?;
    log::info!("checking {} fixtures in {}", fixtures.len(), dir.display());

    let outcomes: Vec<_> = fixtures
        .par_iter()
        .map(|f| f.check().map(|outcome| (f.name.clone(), outcome)))
        .collect();

    let mut report = FixtureReport::default();
    for outcome in outcomes {
        match outcome? {
            (_, FixtureOutcome::Pass) => report.passed += 1,
            (name, mismatch) => report.mismatches.push((name, mismatch)),
        }
    }
    Ok(report)
}

/// Remove every `\n` from `s`
pub fn strip_newlines(s: &str) -> String {
    s.replace('\n', "")
}
