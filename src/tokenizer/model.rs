//! Model definitions and metadata

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumProperty, EnumString};

/// Supported LLM models for tokenization
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    Display,
    ValueEnum,
    Serialize,
    Deserialize,
    EnumProperty,
)]
pub enum Model {
    // OpenAI models
    #[default]
    #[strum(props(model_id = "gpt-4", context_window = "8192", provider = "openai"))]
    Gpt4,

    #[strum(props(
        model_id = "gpt-4-0125-preview",
        context_window = "128000",
        provider = "openai"
    ))]
    Gpt4Turbo,

    #[strum(props(model_id = "gpt-4o", context_window = "128000", provider = "openai"))]
    Gpt4o,

    #[strum(props(
        model_id = "gpt-3.5-turbo",
        context_window = "16385",
        provider = "openai"
    ))]
    Gpt35Turbo,

    // HuggingFace models
    #[strum(props(
        model_id = "meta-llama/Llama-2-7b-hf",
        context_window = "4096",
        provider = "huggingface"
    ))]
    Llama2_7b,

    #[strum(props(
        model_id = "meta-llama/Llama-3-8b-hf",
        context_window = "8192",
        provider = "huggingface"
    ))]
    Llama3_8b,

    #[strum(props(
        model_id = "mistralai/Mistral-Small-Instruct-2409",
        context_window = "32000",
        provider = "huggingface"
    ))]
    MistralSmall,
}

impl Model {
    /// Get the context window size for this model
    pub fn context_window(&self) -> usize {
        self.get_str("context_window")
            .and_then(|window| window.parse().ok())
            .unwrap_or(0)
    }

    /// Get the provider of this model
    pub fn provider(&self) -> ModelProvider {
        let provider = self.get_str("provider").unwrap_or("unknown");
        ModelProvider::from_str(provider).unwrap_or(ModelProvider::OpenAI)
    }

    /// Get the model identifier as used by the provider
    pub fn model_id(&self) -> &'static str {
        self.get_str("model_id").unwrap_or("unknown")
    }
}

/// Model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI (tiktoken encodings)
    OpenAI,
    /// HuggingFace hub tokenizers
    HuggingFace,
}
