//! Gemini provider implementation.
//!
//! Talks to the Generative Language REST API (`models/{model}:generateContent`).
//!
//! Supports:
//! - Single-shot generation with temperature / topP and optional Google
//!   Search grounding
//! - Chat sessions with a fixed system instruction and client-side history
//! - Health checks via the model metadata endpoint

use async_trait::async_trait;
use ecopulse_core::error::ProviderError;
use ecopulse_core::provider::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Default endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini text-generation provider.
pub struct GeminiProvider {
    client: Arc<GeminiClient>,
}

/// Shared HTTP state, also held by every session opened from the provider.
struct GeminiClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider for `model` against a custom base URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(GeminiClient {
                name: "gemini".into(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
                api_key: api_key.into(),
                model: model.into(),
                http,
            }),
        })
    }

    /// Create a provider against the public Google endpoint.
    pub fn google(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::new(DEFAULT_BASE_URL, api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.client.model
    }

    /// Build the request body for a single-shot generation.
    fn to_api_request(request: &GenerationRequest) -> ApiRequest {
        ApiRequest {
            contents: vec![ApiContent::user(&request.text)],
            system_instruction: None,
            generation_config: Some(ApiGenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
            }),
            tools: if request.use_search_grounding {
                vec![ApiTool {
                    google_search: ApiGoogleSearch {},
                }]
            } else {
                Vec::new()
            },
        }
    }
}

impl GeminiClient {
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate_content(
        &self,
        body: &ApiRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        debug!(provider = %self.name, model = %self.model, turns = body.contents.len(), "Sending generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(map_status(status, &self.model, error_body));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let api_response: ApiResponse = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        if api_response.candidates.is_empty() {
            warn!(model = %self.model, "Gemini response contained no candidates");
        }

        Ok(GenerationResponse {
            text: api_response.text(),
            model: api_response
                .model_version
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            usage: api_response.usage_metadata.map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }
}

fn map_status(status: u16, model: &str, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.client.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let body = Self::to_api_request(&request);
        self.client.generate_content(&body).await
    }

    async fn create_session(
        &self,
        system_prompt: &str,
    ) -> std::result::Result<Box<dyn RemoteSession>, ProviderError> {
        debug!(model = %self.client.model, "Opening Gemini chat session");
        Ok(Box::new(GeminiSession {
            client: Arc::clone(&self.client),
            system_instruction: ApiContent {
                role: None,
                parts: vec![ApiPart::text(system_prompt)],
            },
            history: Mutex::new(Vec::new()),
        }))
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models/{}", self.client.base_url, self.client.model);
        let response = self
            .client
            .http
            .get(&url)
            .header("x-goog-api-key", &self.client.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// A Gemini chat session. History lives client-side and is re-sent on
/// every turn; a failed turn leaves the history untouched.
pub struct GeminiSession {
    client: Arc<GeminiClient>,
    system_instruction: ApiContent,
    history: Mutex<Vec<ApiContent>>,
}

impl GeminiSession {
    /// Number of completed turns (user + model pairs).
    #[cfg(test)]
    fn turns(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len() / 2
    }
}

#[async_trait]
impl RemoteSession for GeminiSession {
    async fn send(&self, message: &str) -> std::result::Result<GenerationResponse, ProviderError> {
        let user_turn = ApiContent::user(message);
        let mut contents = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        contents.push(user_turn.clone());

        let body = ApiRequest {
            contents,
            system_instruction: Some(self.system_instruction.clone()),
            generation_config: None,
            tools: Vec::new(),
        };
        let response = self.client.generate_content(&body).await?;

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(user_turn);
        history.push(ApiContent::model(&response.text));
        Ok(response)
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

impl ApiContent {
    fn user(text: &str) -> Self {
        Self {
            role: Some("user".into()),
            parts: vec![ApiPart::text(text)],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: Some("model".into()),
            parts: vec![ApiPart::text(text)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on reasoning parts, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl ApiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    google_search: ApiGoogleSearch,
}

#[derive(Debug, Serialize)]
struct ApiGoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

impl ApiResponse {
    /// Concatenated answer text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
