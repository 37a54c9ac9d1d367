//! Tokenizer module for token counting and token-budget truncation
//!
//! Handles tokenization for OpenAI (tiktoken) and HuggingFace models behind
//! one [`Tokenizer`] trait so the analysis core never depends on a backend.

mod error;
mod model;
mod provider;

// Re-exports for public API
pub use error::{TokenizerError, TokenizerResult};
pub use model::{Model, ModelProvider};

use provider::Provider;
use tracing::{debug, info};

/// How many tokens truncation may give back to land on a character boundary
const MAX_DECODE_BACKOFF: usize = 3;

/// Trait defining the interface for tokenizers
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>>;

    /// Decode token ids back into text
    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String>;

    /// Count tokens in the given text
    fn count_tokens(&self, text: &str) -> TokenizerResult<usize> {
        Ok(self.encode(text)?.len())
    }

    /// Get the context window size for this model
    fn model_context_window(&self) -> usize;
}

/// Create a tokenizer for the specified model
pub fn create_tokenizer(model: Model) -> TokenizerResult<Box<dyn Tokenizer>> {
    let provider: Box<dyn Provider> = match model.provider() {
        ModelProvider::OpenAI => Box::new(provider::openai::OpenAIProvider::new(model)?),
        ModelProvider::HuggingFace => {
            Box::new(provider::huggingface::HuggingFaceProvider::new(model))
        }
    };

    Ok(Box::new(ProviderTokenizer { provider }))
}

/// Tokenizer backed by a provider implementation
struct ProviderTokenizer {
    provider: Box<dyn Provider>,
}

impl Tokenizer for ProviderTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        self.provider.encode(text)
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        self.provider.decode(tokens)
    }

    fn model_context_window(&self) -> usize {
        self.provider.model_context_window()
    }
}

/// Cut `text` down to at most `max_tokens` tokens.
///
/// Returns `Ok(None)` when no truncation is needed, either because the
/// budget is disabled (`max_tokens <= 0`) or the text already fits.
/// Otherwise the text is re-encoded and the first `max_tokens` tokens are
/// decoded. If that cut splits a multi-byte character the decode is retried
/// with up to three fewer tokens.
pub fn truncate_to_budget(
    text: &str,
    max_tokens: i64,
    tokenizer: &dyn Tokenizer,
) -> TokenizerResult<Option<String>> {
    if max_tokens <= 0 {
        return Ok(None);
    }
    let budget = usize::try_from(max_tokens).unwrap_or(usize::MAX);

    let token_count = tokenizer.count_tokens(text)?;
    if token_count <= budget {
        return Ok(None);
    }

    info!(
        token_count,
        max_tokens = budget,
        "Content exceeds token limit, truncating"
    );
    let tokens = tokenizer.encode(text)?;

    let mut last_error = None;
    for backoff in 0..=MAX_DECODE_BACKOFF.min(budget) {
        let keep = budget - backoff;
        match tokenizer.decode(&tokens[..keep.min(tokens.len())]) {
            Ok(truncated) => {
                if backoff > 0 {
                    debug!(backoff, "Dropped trailing tokens to stay on a character boundary");
                }
                info!(max_tokens = keep, "Content truncated");
                return Ok(Some(truncated));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error
        .unwrap_or_else(|| TokenizerError::DecodeError("empty token budget".to_string())))
}
