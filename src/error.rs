use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures surfaced by the generation pipeline.
///
/// Every variant is fatal for the current run; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("generator failed: {message}{}", format_stderr(stderr))]
    Subprocess { message: String, stderr: String },

    #[error("enum patch failed for {}: {message}", path.display())]
    PatchMismatch { path: PathBuf, message: String },

    #[error("invalid specification document {}: {message}", path.display())]
    Spec { path: PathBuf, message: String },
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

impl GenerateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn fs(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn mismatch(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::PatchMismatch {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn spec(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Spec {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr.trim_end())
    }
}
