//! Provider implementations for different tokenizer backends

pub mod huggingface;
pub mod openai;

use crate::tokenizer::error::TokenizerResult;

/// Trait for tokenizer provider implementations
pub trait Provider: Send + Sync {
    /// Encode text into token ids
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>>;

    /// Decode token ids back into text
    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String>;

    /// Get the context window size for this model
    fn model_context_window(&self) -> usize;
}
