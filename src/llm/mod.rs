//! Chat-completion calls against the supported LLM providers.
//!
//! Every provider is reached with a plain `reqwest` POST and returns the raw
//! completion text. Interpreting that text is left to the caller.

mod anthropic;
mod gemini;
mod openai;

use crate::config::LlmSettings;
use crate::error::{Result, RoteiroError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Claude,
    Gemini,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 3] = [LlmProvider::OpenAI, LlmProvider::Claude, LlmProvider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Claude => "claude",
            LlmProvider::Gemini => "gemini",
        }
    }

    /// Name used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Claude => "Claude",
            LlmProvider::Gemini => "Gemini",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = RoteiroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "claude" | "anthropic" => Ok(LlmProvider::Claude),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(RoteiroError::InvalidInput(format!(
                "Unknown LLM provider: {} (expected openai, claude or gemini)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    fn from_parts(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Raw completion text plus usage, when reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Parameters shared by every provider request.
pub(crate) struct CompletionRequest<'a> {
    pub base_url: &'a str,
    pub model: &'a str,
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Something that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        provider: LlmProvider,
        model: &str,
        api_key: Option<&str>,
        prompt: &str,
    ) -> Result<LlmResponse>;
}

/// HTTP client for the hosted providers.
pub struct LlmClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RoteiroError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, settings })
    }

    fn base_url(&self, provider: LlmProvider) -> &str {
        let url = match provider {
            LlmProvider::OpenAI => &self.settings.openai_base_url,
            LlmProvider::Claude => &self.settings.anthropic_base_url,
            LlmProvider::Gemini => &self.settings.gemini_base_url,
        };
        url.trim_end_matches('/')
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    #[instrument(skip(self, api_key, prompt), fields(prompt_chars = prompt.len()))]
    async fn complete(
        &self,
        provider: LlmProvider,
        model: &str,
        api_key: Option<&str>,
        prompt: &str,
    ) -> Result<LlmResponse> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RoteiroError::MissingCredential(provider.label().to_string()))?;

        let request = CompletionRequest {
            base_url: self.base_url(provider),
            model,
            api_key,
            prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        info!("Requesting completion from {} ({})", provider.label(), model);

        let response = match provider {
            LlmProvider::OpenAI => openai::complete(&self.http, &request).await?,
            LlmProvider::Claude => anthropic::complete(&self.http, &request).await?,
            LlmProvider::Gemini => gemini::complete(&self.http, &request).await?,
        };

        if let Some(usage) = &response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }
        Ok(response)
    }
}

/// Turn a non-2xx response into a `Provider` error, preferring `error.message`.
pub(crate) async fn provider_error(provider: LlmProvider, response: reqwest::Response) -> RoteiroError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_string))
        .unwrap_or(body);

    RoteiroError::Provider {
        provider: provider.label().to_string(),
        status,
        message,
    }
}

/// Reject missing or whitespace-only completion text.
pub(crate) fn non_empty(provider: LlmProvider, content: Option<String>) -> Result<String> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| RoteiroError::EmptyResponse(provider.label().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_server;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn client_for(base_url: &str) -> LlmClient {
        LlmClient::new(LlmSettings {
            openai_base_url: base_url.to_string(),
            anthropic_base_url: base_url.to_string(),
            gemini_base_url: base_url.to_string(),
            ..LlmSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("anthropic".parse::<LlmProvider>().unwrap(), LlmProvider::Claude);
        assert_eq!("gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("mistral".parse::<LlmProvider>().is_err());
        assert_eq!(LlmProvider::Claude.to_string(), "claude");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client = client_for("http://127.0.0.1:9");

        let err = client
            .complete(LlmProvider::Claude, "claude-3-5-sonnet", None, "oi")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Claude API key not configured");

        let err = client
            .complete(LlmProvider::Gemini, "gemini-1.5-flash", Some("  "), "oi")
            .await
            .unwrap_err();
        assert!(matches!(err, RoteiroError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["messages"][0]["role"], "user");
                assert_eq!(body["max_tokens"], 4000);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "roteiro pronto"}}],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
                }))
            }),
        );
        let base = spawn_server(router).await;

        let response = client_for(&base)
            .complete(LlmProvider::OpenAI, "gpt-4o-mini", Some("sk-test"), "escreva")
            .await
            .unwrap();

        assert_eq!(response.content, "roteiro pronto");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_claude_completion() {
        let router = Router::new().route(
            "/v1/messages",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-api-key"], "claude-key");
                assert_eq!(headers["anthropic-version"], "2023-06-01");
                assert_eq!(body["messages"][0]["content"], "escreva");
                Json(json!({
                    "content": [{"type": "text", "text": "{\"title\": \"ok\"}"}],
                    "usage": {"input_tokens": 20, "output_tokens": 5}
                }))
            }),
        );
        let base = spawn_server(router).await;

        let response = client_for(&base)
            .complete(LlmProvider::Claude, "claude-3-5-sonnet", Some("claude-key"), "escreva")
            .await
            .unwrap();

        assert_eq!(response.content, "{\"title\": \"ok\"}");
        assert_eq!(response.usage, Some(TokenUsage::from_parts(20, 5)));
    }

    #[tokio::test]
    async fn test_gemini_completion() {
        let router = Router::new().fallback(post(|uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(uri.path(), "/v1beta/models/gemini-1.5-flash:generateContent");
            assert_eq!(uri.query(), None);
            assert_eq!(headers["x-goog-api-key"], "g-key");
            assert_eq!(body["contents"][0]["parts"][0]["text"], "escreva");
            assert_eq!(body["generationConfig"]["maxOutputTokens"], 4000);
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": "olá"}]}}],
                "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 2, "totalTokenCount": 9}
            }))
        }));
        let base = spawn_server(router).await;

        let response = client_for(&base)
            .complete(LlmProvider::Gemini, "gemini-1.5-flash", Some("g-key"), "escreva")
            .await
            .unwrap();

        assert_eq!(response.content, "olá");
        assert_eq!(response.usage.unwrap().total_tokens, 9);
    }

    #[tokio::test]
    async fn test_transport_errors_never_reveal_the_key() {
        let secret = "AIzaSy-very-secret-gemini-key";

        for provider in [LlmProvider::Gemini, LlmProvider::OpenAI, LlmProvider::Claude] {
            let err = client_for("http://127.0.0.1:9")
                .complete(provider, "modelo", Some(secret), "oi")
                .await
                .unwrap_err();

            assert!(matches!(err, RoteiroError::Http(_)));
            assert!(!err.to_string().contains(secret));
            assert!(!format!("{:?}", err).contains(secret));
        }
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status_and_message() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "Incorrect API key provided"}})),
                )
            }),
        );
        let base = spawn_server(router).await;

        let err = client_for(&base)
            .complete(LlmProvider::OpenAI, "gpt-4o-mini", Some("sk-bad"), "oi")
            .await
            .unwrap_err();

        match err {
            RoteiroError::Provider { status, message, .. } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { Json(json!({"content": []})) }),
        );
        let base = spawn_server(router).await;

        let err = client_for(&base)
            .complete(LlmProvider::Claude, "claude-3-5-sonnet", Some("k"), "oi")
            .await
            .unwrap_err();
        assert!(matches!(err, RoteiroError::EmptyResponse(_)));
    }
}
