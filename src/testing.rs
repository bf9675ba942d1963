//! Test doubles shared by the unit tests.

use crate::embedding::{Embedder, EmbedderFactory};
use crate::error::{Result, RoteiroError};
use crate::llm::{CompletionBackend, LlmProvider, LlmResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const VOCABULARY: [&str; 6] = ["juros", "investir", "dinheiro", "historia", "guerra", "ciencia"];

/// Embeds text as keyword counts over a small fixed vocabulary.
pub struct KeywordEmbedder {
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self {
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl KeywordEmbedder {
    /// Fails for any text containing `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(RoteiroError::Embedding("rate limited".to_string()));
            }
        }
        Ok(Self::vector_for(text))
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

/// Hands out a shared [`KeywordEmbedder`] and records the keys it was asked for.
#[derive(Default)]
pub struct KeywordEmbedderFactory {
    pub embedder: Arc<KeywordEmbedder>,
    keys: Mutex<Vec<String>>,
}

impl KeywordEmbedderFactory {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl EmbedderFactory for KeywordEmbedderFactory {
    fn for_api_key(&self, api_key: &str) -> Result<Arc<dyn Embedder>> {
        self.keys.lock().unwrap().push(api_key.to_string());
        Ok(self.embedder.clone())
    }
}

/// Embedder that blocks every call until [`GatedEmbedderFactory::open`].
#[derive(Default)]
pub struct GatedEmbedderFactory {
    embedder: Arc<GatedEmbedder>,
}

struct GatedEmbedder {
    entered: tokio::sync::Notify,
    gate: tokio::sync::Semaphore,
}

impl Default for GatedEmbedder {
    fn default() -> Self {
        Self {
            entered: tokio::sync::Notify::new(),
            gate: tokio::sync::Semaphore::new(0),
        }
    }
}

impl GatedEmbedderFactory {
    /// Wait until some embed call is blocked on the gate.
    pub async fn entered(&self) {
        self.embedder.entered.notified().await;
    }

    /// Let every pending and future embed call through.
    pub fn open(&self) {
        self.embedder.gate.add_permits(tokio::sync::Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl Embedder for GatedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.entered.notify_one();
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| RoteiroError::Embedding(e.to_string()))?;
        Ok(KeywordEmbedder::vector_for(text))
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

impl EmbedderFactory for GatedEmbedderFactory {
    fn for_api_key(&self, _api_key: &str) -> Result<Arc<dyn Embedder>> {
        Ok(self.embedder.clone())
    }
}

/// A completion request as seen by [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub provider: LlmProvider,
    pub model: String,
    pub prompt: String,
}

/// Completion backend that replies with canned text.
pub struct ScriptedBackend {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    /// Reply with `replies` in order; the last one repeats.
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        provider: LlmProvider,
        model: &str,
        api_key: Option<&str>,
        prompt: &str,
    ) -> Result<LlmResponse> {
        if api_key.map_or(true, |k| k.trim().is_empty()) {
            return Err(RoteiroError::MissingCredential(provider.label().to_string()));
        }

        self.calls.lock().unwrap().push(RecordedCall {
            provider,
            model: model.to_string(),
            prompt: prompt.to_string(),
        });

        let mut replies = self.replies.lock().unwrap();
        let content = if replies.len() > 1 {
            replies.pop().unwrap_or_default()
        } else {
            replies.last().cloned().unwrap_or_default()
        };

        Ok(LlmResponse {
            content,
            usage: None,
        })
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
