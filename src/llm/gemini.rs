//! Google Gemini `generateContent`.

use super::{non_empty, provider_error, CompletionRequest, LlmProvider, LlmResponse, TokenUsage};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub(super) async fn complete(http: &reqwest::Client, request: &CompletionRequest<'_>) -> Result<LlmResponse> {
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: request.prompt,
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        },
    };

    let response = http
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            request.base_url, request.model
        ))
        .header("x-goog-api-key", request.api_key)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(provider_error(LlmProvider::Gemini, response).await);
    }

    let parsed: GenerateResponse = response.json().await?;
    let content = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    Ok(LlmResponse {
        content: non_empty(LlmProvider::Gemini, content)?,
        usage: parsed.usage_metadata.map(|u| {
            let mut usage = TokenUsage::from_parts(u.prompt_token_count, u.candidates_token_count);
            if u.total_token_count > 0 {
                usage.total_tokens = u.total_token_count;
            }
            usage
        }),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
