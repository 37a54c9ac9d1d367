//! Global error handling for repotxt
//!
//! Per-module errors (git, tokenizer) fold into [`AnalysisError`]. Only
//! acquisition, missing input and persistence errors abort a run; read and
//! tokenizer failures are logged where they happen and the run continues.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::git::GitError;
use crate::tokenizer::TokenizerError;

/// Error type for analysis runs
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Cloning the remote source failed
    #[error("Failed to acquire repository: {0}")]
    Acquisition(#[from] GitError),

    /// Local source does not exist
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Output directory or file could not be written
    #[error("Failed to write output {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Token counting or truncation failed
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// File system errors outside of persistence
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AnalysisError {
    /// Whether the error was caused by bad caller input rather than the run itself
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::PathNotFound(_) | Self::InvalidArgument(_))
    }
}

/// Specialized Result type for repotxt operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error::AnalysisError::$error_type(format!($($arg)*)))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for tagging IO failures with the output path they touched
pub trait PersistContext<T> {
    /// Map an IO error into [`AnalysisError::Persist`] for `path`
    fn persist_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> PersistContext<T> for io::Result<T> {
    fn persist_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| AnalysisError::Persist {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        assert!(AnalysisError::PathNotFound("/nope".into()).is_caller_error());
        assert!(AnalysisError::InvalidArgument("x".into()).is_caller_error());
        assert!(!AnalysisError::Acquisition(GitError::InvalidUrl("x".into())).is_caller_error());
    }

    #[test]
    fn test_persist_context_keeps_path() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = res.persist_context("/out/file.txt").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/out/file.txt"));
        assert!(message.contains("denied"));
    }

    fn check_positive(n: i64) -> Result<i64> {
        crate::ensure!(n > 0, InvalidArgument, "expected positive, got {}", n);
        Ok(n)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(check_positive(3).unwrap(), 3);
        assert!(matches!(
            check_positive(-1),
            Err(AnalysisError::InvalidArgument(msg)) if msg.contains("-1")
        ));
    }
}
