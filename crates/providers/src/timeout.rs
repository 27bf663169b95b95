//! Per-request deadline for a provider and the sessions it opens.
//!
//! Remote calls that outlive the deadline fail with `ProviderError::Timeout`
//! instead of leaving the caller suspended indefinitely.

use async_trait::async_trait;
use ecopulse_core::error::ProviderError;
use ecopulse_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A provider that bounds every remote call with a timeout.
pub struct TimeoutProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wrap with the default timeout (60s).
    pub fn with_default(inner: Arc<dyn Provider>) -> Self {
        Self::new(inner, Duration::from_secs(60))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn bounded<T>(
    provider: &str,
    operation: &str,
    timeout: Duration,
    call: impl std::future::Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                provider = %provider,
                operation,
                timeout_secs = timeout.as_secs_f64(),
                "Provider call timed out"
            );
            Err(ProviderError::Timeout(format!(
                "Provider '{provider}' {operation} timed out after {:.1}s",
                timeout.as_secs_f64()
            )))
        }
    }
}

#[async_trait]
impl Provider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        bounded(
            self.inner.name(),
            "generate",
            self.timeout,
            self.inner.generate(request),
        )
        .await
    }

    async fn create_session(
        &self,
        system_prompt: &str,
    ) -> std::result::Result<Box<dyn RemoteSession>, ProviderError> {
        let inner = bounded(
            self.inner.name(),
            "create_session",
            self.timeout,
            self.inner.create_session(system_prompt),
        )
        .await?;

        Ok(Box::new(TimeoutSession {
            provider: self.inner.name().to_string(),
            inner,
            timeout: self.timeout,
        }))
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        bounded(
            self.inner.name(),
            "health_check",
            self.timeout,
            self.inner.health_check(),
        )
        .await
    }
}

/// A session whose turns share the provider's timeout.
struct TimeoutSession {
    provider: String,
    inner: Box<dyn RemoteSession>,
    timeout: Duration,
}

#[async_trait]
impl RemoteSession for TimeoutSession {
    async fn send(&self, message: &str) -> std::result::Result<GenerationResponse, ProviderError> {
        bounded(&self.provider, "send", self.timeout, self.inner.send(message)).await
    }
}
