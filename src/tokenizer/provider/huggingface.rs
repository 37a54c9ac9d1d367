//! HuggingFace tokenizer implementation

use once_cell::sync::OnceCell;
use std::sync::Mutex;
use tokenizers::Tokenizer as HfTokenizer;
use tracing::debug;

use super::Provider;
use crate::tokenizer::error::{TokenizerError, TokenizerResult};
use crate::tokenizer::model::Model;

/// HuggingFace tokenizer implementation
///
/// The vocabulary is fetched from the hub on first use.
pub struct HuggingFaceProvider {
    model: Model,
    repo_id: &'static str,
    tokenizer: OnceCell<Mutex<HfTokenizer>>,
}

impl HuggingFaceProvider {
    /// Create a new HuggingFace tokenizer
    pub fn new(model: Model) -> Self {
        Self {
            model,
            repo_id: model.model_id(),
            tokenizer: OnceCell::new(),
        }
    }

    /// Get or initialize the tokenizer
    fn get_tokenizer(&self) -> TokenizerResult<&Mutex<HfTokenizer>> {
        self.tokenizer.get_or_try_init(|| {
            debug!(repo = self.repo_id, "Loading HuggingFace tokenizer");
            let tokenizer = HfTokenizer::from_pretrained(self.repo_id, None).map_err(|e| {
                TokenizerError::LoadError {
                    model: self.repo_id.to_string(),
                    message: e.to_string(),
                }
            })?;

            Ok(Mutex::new(tokenizer))
        })
    }

    fn with_tokenizer<T>(
        &self,
        f: impl FnOnce(&HfTokenizer) -> TokenizerResult<T>,
    ) -> TokenizerResult<T> {
        let tokenizer = self
            .get_tokenizer()?
            .lock()
            .map_err(|_| TokenizerError::TokenizerError("Failed to lock tokenizer".to_string()))?;
        f(&tokenizer)
    }
}

impl Provider for HuggingFaceProvider {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        self.with_tokenizer(|tokenizer| {
            let encoding = tokenizer.encode(text, false).map_err(|e| {
                TokenizerError::TokenizerError(format!("Failed to encode text: {}", e))
            })?;

            Ok(encoding.get_ids().to_vec())
        })
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        self.with_tokenizer(|tokenizer| {
            tokenizer
                .decode(tokens, false)
                .map_err(|e| TokenizerError::DecodeError(e.to_string()))
        })
    }

    fn model_context_window(&self) -> usize {
        self.model.context_window()
    }
}
