/*!
 * Error types for Git operations
 */

use thiserror::Error;

/// Errors that can occur during Git operations
#[derive(Error, Debug)]
pub enum GitError {
    /// Invalid Git URL format
    #[error("Invalid Git URL: {0}")]
    InvalidUrl(String),

    /// Error cloning a Git repository
    #[error("Failed to clone repository: {0}")]
    CloneError(git2::Error),

    /// The credential could not be placed into the URL
    #[error("Cannot embed credential into URL: {0}")]
    CredentialError(String),

    /// IO error during Git operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Specialized Result type for Git operations
pub type GitResult<T> = Result<T, GitError>;
