//! OpenAI chat completions.

use super::{non_empty, provider_error, CompletionRequest, LlmProvider, LlmResponse, TokenUsage};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub(super) async fn complete(http: &reqwest::Client, request: &CompletionRequest<'_>) -> Result<LlmResponse> {
    let body = ChatRequest {
        model: request.model,
        messages: vec![ChatMessage {
            role: "user",
            content: request.prompt,
        }],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let response = http
        .post(format!("{}/chat/completions", request.base_url))
        .bearer_auth(request.api_key)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(provider_error(LlmProvider::OpenAI, response).await);
    }

    let parsed: ChatResponse = response.json().await?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content);

    Ok(LlmResponse {
        content: non_empty(LlmProvider::OpenAI, content)?,
        usage: parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}
