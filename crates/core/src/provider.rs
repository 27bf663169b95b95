//! The abstraction over the text-generation backend.
//!
//! A Provider turns a prompt into generated text and opens conversational
//! sessions bound to a fixed system instruction. The analysis pipeline treats
//! it as opaque, unreliable and possibly slow.
//!
//! Implementations: Gemini (REST), timeout wrapper, scripted test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// A single-shot generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The full prompt text
    pub text: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Nucleus sampling cutoff
    pub top_p: f32,

    /// Ask the backend to ground its answer in external search results
    #[serde(default)]
    pub use_search_grounding: bool,
}

/// A generated reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text (may be empty)
    pub text: String,

    /// Which model actually responded
    #[serde(default)]
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A conversational session opened by a provider.
///
/// The system instruction is fixed at creation time; the session keeps its
/// own turn history.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Send one user message and wait for the reply.
    async fn send(&self, message: &str) -> std::result::Result<GenerationResponse, ProviderError>;
}

/// The core Provider trait.
///
/// The orchestrator and chat sessions call these methods without knowing
/// which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Generate a complete reply for a prompt.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError>;

    /// Open a conversational session with a fixed system instruction.
    async fn create_session(
        &self,
        system_prompt: &str,
    ) -> std::result::Result<Box<dyn RemoteSession>, ProviderError>;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
