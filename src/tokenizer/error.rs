//! Error types for the tokenizer module

use thiserror::Error;

/// Result type for tokenizer operations
pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Errors that can occur during tokenization
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Error from tokenizer library
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    /// Loading the vocabulary failed
    #[error("Failed to load tokenizer for {model}: {message}")]
    LoadError { model: String, message: String },

    /// Token ids could not be turned back into text
    #[error("Failed to decode tokens: {0}")]
    DecodeError(String),
}
