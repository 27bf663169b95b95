//! Error types for the EcoPulse domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Only local precondition violations are meant to reach callers of the
//! analysis pipeline. Remote failures (`ProviderError`) are absorbed by the
//! orchestrator and chat sessions and turned into sentinel values. A missing
//! response section is not an error at all; it resolves to `"N/A"`.

use thiserror::Error;

/// The top-level error type for all EcoPulse operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The snapshot violates a data-model invariant (e.g. empty history).
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the remote text-generation capability.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
