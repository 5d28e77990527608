//! Directory conversion
//!
//! Converts every markdown file under a directory to a sibling `.html` file
//! (or into a separate output tree), in parallel.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::{Options, render_with_options};

/// File extensions treated as markdown input
pub const INPUT_EXTENSIONS: &[&str] = &["md", "markdown", "text"];

/// Options for directory conversion
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Output root; `None` writes each file next to its input
    pub output_dir: Option<PathBuf>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Number of worker threads (`None` uses rayon's default)
    pub parallel_jobs: Option<usize>,
    /// Parse and render options
    pub options: Options,
}

/// Result of a directory conversion
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success_count: usize,
    pub output_files: Vec<PathBuf>,
    pub failed_files: Vec<(PathBuf, String)>,
}

enum ConvertOutcome {
    Success(PathBuf),
    Failed(PathBuf, String),
}

/// Convert every markdown file in `dir`.
///
/// Inputs that map to the same output (`a.md` and `a.markdown`) are not
/// converted twice: the first in path order is, the others are reported as
/// failed.
pub fn convert_directory(dir: &Path, options: &BatchOptions) -> Result<BatchResult> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let files = collect_markdown_files(dir, options.recursive)?;
    log::info!("converting {} files in {}", files.len(), dir.display());

    if let Some(out) = &options.output_dir {
        fs::create_dir_all(out).map_err(|e| Error::io(out, e))?;
    }

    let mut result = BatchResult::default();
    let mut targets: HashMap<PathBuf, &Path> = HashMap::new();
    let mut jobs = Vec::with_capacity(files.len());
    for file in &files {
        let output = output_path(file, dir, options.output_dir.as_deref());
        match targets.entry(output) {
            Entry::Occupied(first) => {
                let error = format!(
                    "output {} is already written from {}",
                    first.key().display(),
                    first.get().display()
                );
                log::warn!("skipping {}: {error}", file.display());
                result.failed_files.push((file.clone(), error));
            }
            Entry::Vacant(slot) => {
                jobs.push((file.as_path(), slot.key().clone()));
                slot.insert(file);
            }
        }
    }

    let convert_all = || -> Vec<ConvertOutcome> {
        jobs.par_iter()
            .map(|(input, output)| convert_single_file(input, output, &options.options))
            .collect()
    };

    let outcomes = match options.parallel_jobs {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(convert_all),
            Err(e) => {
                log::warn!("could not build a pool of {n} threads ({e}), using the default");
                convert_all()
            }
        },
        None => convert_all(),
    };

    for outcome in outcomes {
        match outcome {
            ConvertOutcome::Success(path) => {
                result.success_count += 1;
                result.output_files.push(path);
            }
            ConvertOutcome::Failed(path, error) => result.failed_files.push((path, error)),
        }
    }
    Ok(result)
}

fn convert_single_file(input: &Path, output: &Path, options: &Options) -> ConvertOutcome {
    let convert = || -> std::io::Result<()> {
        let source = fs::read_to_string(input)?;
        let html = render_with_options(&source, options);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, html)
    };

    match convert() {
        Ok(()) => {
            log::debug!("{} -> {}", input.display(), output.display());
            ConvertOutcome::Success(output.to_path_buf())
        }
        Err(e) => ConvertOutcome::Failed(input.to_path_buf(), e.to_string()),
    }
}

/// Where the HTML for `input` goes: next to it, or at the same relative
/// position under `output_dir`
pub fn output_path(input: &Path, root: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(out) => {
            let relative = input.strip_prefix(root).unwrap_or(input);
            out.join(relative).with_extension("html")
        }
        None => input.with_extension("html"),
    }
}

/// Whether `path` has one of the [`INPUT_EXTENSIONS`]
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Collect markdown files in a directory, sorted by path
pub fn collect_markdown_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() {
            if is_markdown_file(&path) {
                files.push(path);
            }
        } else if path.is_dir() && recursive {
            files.extend(collect_markdown_files(&path, recursive)?);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(Path::new("a.md")));
        assert!(is_markdown_file(Path::new("a.MARKDOWN")));
        assert!(is_markdown_file(Path::new("dir/a.text")));
        assert!(!is_markdown_file(Path::new("a.html")));
        assert!(!is_markdown_file(Path::new("README")));
    }

    #[test]
    fn test_output_path() {
        let root = Path::new("docs");
        assert_eq!(
            output_path(Path::new("docs/a/b.md"), root, None),
            PathBuf::from("docs/a/b.html")
        );
        assert_eq!(
            output_path(Path::new("docs/a/b.md"), root, Some(Path::new("site"))),
            PathBuf::from("site/a/b.html")
        );
    }

    #[test]
    fn test_convert_directory_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.md"), "# One").unwrap();
        fs::write(dir.path().join("two.markdown"), "*two*").unwrap();
        fs::write(dir.path().join("skip.txt"), "nope").unwrap();

        let result = convert_directory(dir.path(), &BatchOptions::default()).unwrap();
        assert_eq!(result.success_count, 2);
        assert!(result.failed_files.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("one.html")).unwrap(),
            "<h1 id=\"one\">One</h1>"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("two.html")).unwrap(),
            "<p><em>two</em></p>"
        );
        assert!(!dir.path().join("skip.html").exists());
    }

    #[test]
    fn test_convert_directory_recursive_to_output_dir() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("top.md"), "top").unwrap();
        fs::write(dir.path().join("nested/inner.md"), "inner").unwrap();

        let options = BatchOptions {
            output_dir: Some(out.path().to_path_buf()),
            recursive: true,
            parallel_jobs: Some(2),
            ..BatchOptions::default()
        };
        let result = convert_directory(dir.path(), &options).unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(
            fs::read_to_string(out.path().join("nested/inner.html")).unwrap(),
            "<p>inner</p>"
        );
        assert!(out.path().join("top.html").exists());
    }

    #[test]
    fn test_inputs_sharing_an_output_fail() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.markdown"), "from markdown").unwrap();
        fs::write(dir.path().join("a.md"), "from md").unwrap();
        fs::write(dir.path().join("b.md"), "b").unwrap();

        let result = convert_directory(dir.path(), &BatchOptions::default()).unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_files.len(), 1);

        let (failed, error) = &result.failed_files[0];
        assert_eq!(failed, &dir.path().join("a.md"));
        assert!(error.contains("a.markdown"));
        assert_eq!(
            fs::read_to_string(dir.path().join("a.html")).unwrap(),
            "<p>from markdown</p>"
        );
    }

    #[test]
    fn test_non_recursive_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/inner.md"), "inner").unwrap();

        let files = collect_markdown_files(dir.path(), false).unwrap();
        assert!(files.is_empty());
    }
}
