//! Anthropic messages API.

use super::{non_empty, provider_error, CompletionRequest, LlmProvider, LlmResponse, TokenUsage};
use crate::error::Result;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(super) async fn complete(http: &reqwest::Client, request: &CompletionRequest<'_>) -> Result<LlmResponse> {
    let body = MessagesRequest {
        model: request.model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages: vec![Message {
            role: "user",
            content: request.prompt,
        }],
    };

    let response = http
        .post(format!("{}/v1/messages", request.base_url))
        .header("x-api-key", request.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(provider_error(LlmProvider::Claude, response).await);
    }

    let parsed: MessagesResponse = response.json().await?;
    let content = parsed.content.into_iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text),
        ContentBlock::Other => None,
    });

    Ok(LlmResponse {
        content: non_empty(LlmProvider::Claude, content)?,
        usage: parsed
            .usage
            .map(|u| TokenUsage::from_parts(u.input_tokens, u.output_tokens)),
    })
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
