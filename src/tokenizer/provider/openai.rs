//! OpenAI tokenizer implementation using tiktoken

use tiktoken_rs::CoreBPE;

use super::Provider;
use crate::tokenizer::error::{TokenizerError, TokenizerResult};
use crate::tokenizer::model::Model;

/// OpenAI tokenizer implementation
pub struct OpenAIProvider {
    model: Model,
    encoding: CoreBPE,
}

impl OpenAIProvider {
    /// Create a new OpenAI tokenizer
    pub fn new(model: Model) -> TokenizerResult<Self> {
        let encoding = tiktoken_rs::get_bpe_from_model(model.model_id()).map_err(|e| {
            TokenizerError::LoadError {
                model: model.model_id().to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self { model, encoding })
    }
}

impl Provider for OpenAIProvider {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        // Special-token text is encoded as ordinary text rather than rejected
        Ok(self
            .encoding
            .encode_ordinary(text)
            .into_iter()
            .map(|token| token as u32)
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        self.encoding
            .decode(tokens.iter().map(|&token| token as _).collect())
            .map_err(|e| TokenizerError::DecodeError(e.to_string()))
    }

    fn model_context_window(&self) -> usize {
        self.model.context_window()
    }
}
