//! Error types for file-level operations

use std::path::PathBuf;

/// Errors from fixture and directory operations. Conversion itself never
/// fails; only reading and writing files can.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Fixture {} has no expected .html file", path.display())]
    MissingExpected { path: PathBuf },

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
}

/// Result type for file-level operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
