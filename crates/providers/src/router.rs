//! Provider router: builds the configured generation backend.

use crate::gemini::{self, GeminiProvider};
use crate::timeout::TimeoutProvider;
use ecopulse_config::AppConfig;
use ecopulse_core::error::ProviderError;
use ecopulse_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the provider named in the configuration, wrapped in a
/// [`TimeoutProvider`] when `request_timeout_secs` is non-zero.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = resolve_base_url(config)?;
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "No API key. Set GEMINI_API_KEY or run `ecopulse onboard`".into(),
        )
    })?;

    let gemini = GeminiProvider::new(&base_url, api_key, &config.model)?;
    info!(provider = %config.provider, model = %gemini.model(), base_url = %base_url, "Provider configured");
    let provider: Arc<dyn Provider> = Arc::new(gemini);

    if config.request_timeout_secs == 0 {
        return Ok(provider);
    }
    Ok(Arc::new(TimeoutProvider::new(
        provider,
        Duration::from_secs(config.request_timeout_secs),
    )))
}

/// The endpoint requests go to: `api_url` when set, else the provider's
/// default. Unknown providers are `NotConfigured`.
pub fn resolve_base_url(config: &AppConfig) -> Result<String, ProviderError> {
    let default = default_base_url(&config.provider).ok_or_else(|| {
        ProviderError::NotConfigured(format!("Unknown provider '{}'", config.provider))
    })?;
    Ok(config
        .api_url
        .clone()
        .unwrap_or_else(|| default.to_string()))
}

/// Default base URL of a supported provider.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "gemini" | "google" => Some(gemini::DEFAULT_BASE_URL),
        _ => None,
    }
}
