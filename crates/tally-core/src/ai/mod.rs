//! Pluggable text-generation backend abstraction
//!
//! The insight pipeline only needs one capability from a language model:
//! turn a prompt into text. This module defines that seam.
//!
//! # Architecture
//!
//! - `TextGenerator` trait: the interface every backend implements
//! - `GenerationClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AiConfig::load(None)?;
//! let client = GenerationClient::from_config(&config)?;
//! let text = client.generate("Give 3 tips for saving money").await?;
//! ```

mod gemini;
mod mock;
mod openai_compatible;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply, DEFAULT_MOCK_RESPONSE};
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::ServiceError;

use async_trait::async_trait;

use crate::config::{AiConfig, BackendKind};
use crate::error::Result;

/// Interface for all text-generation backends
///
/// Backends must be Send + Sync so a single client can serve concurrent
/// requests from the web server.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt
    ///
    /// Returns the raw generated text. Transport failures, non-success
    /// statuses, timeouts, and blocked or empty responses are all errors.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete generation client
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum GenerationClient {
    /// Google Generative Language API
    Gemini(GeminiBackend),
    /// OpenAI-compatible server (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl GenerationClient {
    /// Build a client for the configured backend
    ///
    /// Fails with a configuration error when the selected backend is missing
    /// a required setting (API key for Gemini, host for OpenAI-compatible).
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let client = match config.backend {
            BackendKind::Gemini => GenerationClient::Gemini(GeminiBackend::from_config(config)?),
            BackendKind::OpenAICompatible => {
                GenerationClient::OpenAICompatible(OpenAICompatibleBackend::from_config(config)?)
            }
            BackendKind::Mock => GenerationClient::Mock(MockBackend::new()),
        };

        tracing::debug!(
            backend = %config.backend,
            model = %client.model(),
            host = %client.host(),
            "Generation client configured"
        );

        Ok(client)
    }

    /// Create a mock client for testing
    pub fn mock() -> Self {
        GenerationClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError> {
        match self {
            GenerationClient::Gemini(b) => b.generate(prompt).await,
            GenerationClient::OpenAICompatible(b) => b.generate(prompt).await,
            GenerationClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            GenerationClient::Gemini(b) => b.health_check().await,
            GenerationClient::OpenAICompatible(b) => b.health_check().await,
            GenerationClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            GenerationClient::Gemini(b) => b.model(),
            GenerationClient::OpenAICompatible(b) => b.model(),
            GenerationClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            GenerationClient::Gemini(b) => b.host(),
            GenerationClient::OpenAICompatible(b) => b.host(),
            GenerationClient::Mock(b) => b.host(),
        }
    }
}
