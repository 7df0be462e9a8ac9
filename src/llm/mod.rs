//! LLM integration.
//!
//! Provides the trait and implementations for communicating with the model
//! backend. The backend is opaque to the rest of the system: messages in,
//! a completion string out.

pub mod mock;
pub mod openai;
pub mod types;

pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};

/// Trait for LLM clients that can generate completions.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI (gpt-5-mini, etc.)
    #[default]
    OpenAi,
    /// Mock client for testing and offline use (no API key required).
    Mock,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

/// Builds an LLM client from configuration.
pub fn build_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let provider: LlmProvider = config
        .provider
        .parse()
        .map_err(ChatError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            let client = OpenAiClient::from_env(&config.model)?;
            Ok(Box::new(client))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
