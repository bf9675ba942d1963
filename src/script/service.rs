//! Script lifecycle: generate, approve, translate.

use super::catalog::SOURCE_LANGUAGE;
use super::draft::{OriginalMetadata, ScriptDraft, TranslatedScript};
use super::prompt::{
    build_generation_prompt, build_translation_prompt, GenerationRequest, TranslationOptions,
    TranslationRequest,
};
use crate::config::Prompts;
use crate::error::{Result, RoteiroError};
use crate::llm::{CompletionBackend, LlmResponse, TokenUsage};
use crate::rag::{ContextBuilder, RetrievedChunk};
use crate::store::{Script, ScriptStatus, ScriptStore, SettingsStore, UserSettings};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Default number of library chunks used as generation context.
pub const DEFAULT_CONTEXT_CHUNKS: usize = 3;

/// Default pause between translations in a batch.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);

/// A freshly generated draft.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedScript {
    pub script: Script,
    /// Library chunks that were given to the LLM.
    pub context: Vec<RetrievedChunk>,
    pub usage: Option<TokenUsage>,
    /// False when the LLM output was not valid JSON.
    pub parsed: bool,
}

/// Outcome of a translation.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub script: Script,
    pub source_language: String,
    pub target_language: String,
    pub elapsed_ms: u64,
    pub usage: Option<TokenUsage>,
    pub parsed: bool,
}

/// Generates and manages scripts on behalf of users.
pub struct ScriptService {
    scripts: Arc<dyn ScriptStore>,
    settings: Arc<dyn SettingsStore>,
    context: Arc<ContextBuilder>,
    llm: Arc<dyn CompletionBackend>,
    prompts: Prompts,
    context_chunks: usize,
    batch_pause: Duration,
}

impl ScriptService {
    pub fn new(
        scripts: Arc<dyn ScriptStore>,
        settings: Arc<dyn SettingsStore>,
        context: Arc<ContextBuilder>,
        llm: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            scripts,
            settings,
            context,
            llm,
            prompts: Prompts::default(),
            context_chunks: DEFAULT_CONTEXT_CHUNKS,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set how many library chunks are retrieved for generation.
    pub fn with_context_chunks(mut self, context_chunks: usize) -> Self {
        self.context_chunks = context_chunks;
        self
    }

    /// Set the pause between translations in [`ScriptService::translate_many`].
    pub fn with_batch_pause(mut self, batch_pause: Duration) -> Self {
        self.batch_pause = batch_pause;
        self
    }

    async fn user_settings(&self, user_id: &str) -> Result<UserSettings> {
        Ok(self
            .settings
            .get_user_settings(user_id)
            .await?
            .unwrap_or_else(|| UserSettings::default_for(user_id)))
    }

    async fn complete(&self, user_id: &str, prompt: &str) -> Result<LlmResponse> {
        let settings = self.user_settings(user_id).await?;
        self.llm
            .complete(
                settings.llm_provider,
                &settings.llm_model,
                settings.api_key_for(settings.llm_provider),
                prompt,
            )
            .await
    }

    /// Generate a draft, retrieving library context for the theme.
    #[instrument(skip(self, request), fields(theme = %request.theme))]
    pub async fn generate(&self, user_id: &str, request: &GenerationRequest) -> Result<GeneratedScript> {
        request.validate()?;
        let context = self
            .context
            .search(&request.theme, user_id, self.context_chunks)
            .await;
        self.generate_with_context(user_id, request, context).await
    }

    /// Generate a draft using caller-supplied context.
    #[instrument(skip(self, request, context), fields(theme = %request.theme, context = context.len()))]
    pub async fn generate_with_context(
        &self,
        user_id: &str,
        request: &GenerationRequest,
        context: Vec<RetrievedChunk>,
    ) -> Result<GeneratedScript> {
        request.validate()?;

        let prompt = build_generation_prompt(request, &context, &self.prompts);
        let response = self.complete(user_id, &prompt).await?;

        let draft = ScriptDraft::parse_or_fallback(&response.content, &request.theme);
        if !draft.parsed {
            warn!("LLM response was not valid JSON, using raw text as the script");
        }

        let now = Utc::now();
        let script = Script {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: draft.title,
            theme: request.theme.clone(),
            duration_minutes: request.duration_minutes,
            language_style: request.language_style.clone(),
            environment: request.environment.clone(),
            environment_description: request.environment_description.clone(),
            target_language: SOURCE_LANGUAGE.to_string(),
            content_portuguese: draft.content,
            content_final: None,
            seo_title: draft.seo_title,
            seo_description: draft.seo_description,
            seo_tags: draft.seo_tags,
            thumbnail_prompt: draft.thumbnail_prompt,
            status: ScriptStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        self.scripts.insert_script(&script).await?;
        info!("Generated script {} ({} chars)", script.id, script.content_portuguese.len());

        Ok(GeneratedScript {
            script,
            context,
            usage: response.usage,
            parsed: draft.parsed,
        })
    }

    /// Fetch a script owned by `user_id`.
    pub async fn get(&self, user_id: &str, script_id: Uuid) -> Result<Script> {
        self.scripts
            .get_script(script_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| RoteiroError::NotFound(format!("Script {}", script_id)))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Script>> {
        self.scripts.list_scripts(user_id).await
    }

    /// Move a draft to `approved`.
    #[instrument(skip(self))]
    pub async fn approve(&self, user_id: &str, script_id: Uuid) -> Result<Script> {
        let mut script = self.get(user_id, script_id).await?;
        if script.status != ScriptStatus::Draft {
            return Err(RoteiroError::InvalidInput(format!(
                "Only draft scripts can be approved (script is {})",
                script.status
            )));
        }

        script.status = ScriptStatus::Approved;
        script.updated_at = Utc::now();
        self.scripts.update_script(&script).await?;
        info!("Approved script {}", script.id);
        Ok(script)
    }

    /// Translate the Portuguese content into `target_language` and finalize.
    #[instrument(skip(self, options))]
    pub async fn translate(
        &self,
        user_id: &str,
        script_id: Uuid,
        target_language: &str,
        options: &TranslationOptions,
    ) -> Result<TranslationResult> {
        let started = Instant::now();
        let target_language = target_language.trim();
        if target_language.is_empty() {
            return Err(RoteiroError::InvalidInput("Target language must not be empty".to_string()));
        }

        let mut script = self.get(user_id, script_id).await?;
        if script.content_portuguese.trim().is_empty() {
            return Err(RoteiroError::InvalidInput(
                "No Portuguese content found to translate".to_string(),
            ));
        }

        let request = TranslationRequest {
            content: script.content_portuguese.clone(),
            source_language: SOURCE_LANGUAGE.to_string(),
            target_language: target_language.to_string(),
            seo_title: Some(script.seo_title.clone()),
            seo_description: Some(script.seo_description.clone()),
            seo_tags: script.seo_tags.clone(),
            thumbnail_prompt: Some(script.thumbnail_prompt.clone()),
            options: options.clone(),
        };
        let prompt = build_translation_prompt(&request, &self.prompts);
        let response = self.complete(user_id, &prompt).await?;

        let original = OriginalMetadata {
            seo_title: script.seo_title.clone(),
            seo_description: script.seo_description.clone(),
            seo_tags: script.seo_tags.clone(),
            thumbnail_prompt: script.thumbnail_prompt.clone(),
        };
        let translated = TranslatedScript::parse_or_fallback(&response.content, &original);
        if !translated.parsed {
            warn!("Translation was not valid JSON, keeping original SEO metadata");
        }

        script.content_final = Some(translated.content);
        script.seo_title = translated.seo_title;
        script.seo_description = translated.seo_description;
        script.seo_tags = translated.seo_tags;
        script.thumbnail_prompt = translated.thumbnail_prompt;
        script.target_language = target_language.to_string();
        script.status = ScriptStatus::Final;
        script.updated_at = Utc::now();
        self.scripts.update_script(&script).await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!("Translated script {} to {} in {}ms", script.id, target_language, elapsed_ms);

        Ok(TranslationResult {
            script,
            source_language: SOURCE_LANGUAGE.to_string(),
            target_language: target_language.to_string(),
            elapsed_ms,
            usage: response.usage,
            parsed: translated.parsed,
        })
    }

    /// Translate several scripts one after another.
    ///
    /// A failure is recorded against its script and the batch carries on.
    #[instrument(skip(self, script_ids, options), fields(count = script_ids.len()))]
    pub async fn translate_many(
        &self,
        user_id: &str,
        script_ids: &[Uuid],
        target_language: &str,
        options: &TranslationOptions,
    ) -> Vec<(Uuid, Result<TranslationResult>)> {
        let mut results = Vec::with_capacity(script_ids.len());

        for (i, &script_id) in script_ids.iter().enumerate() {
            if i > 0 && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }

            let result = self
                .translate(user_id, script_id, target_language, options)
                .await;
            if let Err(e) = &result {
                warn!("Translation of script {} failed: {}", script_id, e);
            }
            results.push((script_id, result));
        }

        let succeeded = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Translated {}/{} scripts to {}", succeeded, results.len(), target_language);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TextChunk;
    use crate::llm::LlmProvider;
    use crate::store::{Document, LibraryStore, MemoryStore};
    use crate::testing::{KeywordEmbedder, KeywordEmbedderFactory, ScriptedBackend};

    const DRAFT_JSON: &str = r#"{"title": "Juros que trabalham", "content": "Olá, pessoal! Hoje falamos de juros.", "seo_title": "Juros compostos", "seo_description": "Aprenda juros", "seo_tags": ["juros", "dinheiro"], "thumbnail_prompt": "moedas crescendo"}"#;
    const TRANSLATION_JSON: &str = r#"{"content": "Hi everyone! Today we talk about interest.", "seo_title": "Compound interest", "seo_description": "Learn interest", "seo_tags": ["interest"], "thumbnail_prompt": "growing coins"}"#;

    fn request() -> GenerationRequest {
        GenerationRequest {
            theme: "juros e dinheiro".to_string(),
            duration_minutes: 5,
            language_style: "descontraida".to_string(),
            environment: "educativo".to_string(),
            environment_description: None,
        }
    }

    async fn service(replies: &[&str]) -> (ScriptService, Arc<MemoryStore>, Arc<ScriptedBackend>) {
        let store = Arc::new(MemoryStore::new());

        let mut settings = UserSettings::default_for("user-1");
        settings.llm_provider = LlmProvider::Claude;
        settings.llm_model = "claude-3-5-sonnet".to_string();
        settings.openai_api_key = Some("sk-embed".to_string());
        settings.claude_api_key = Some("claude-key".to_string());
        store.save_user_settings(&settings).await.unwrap();

        let doc = Document::new(
            "Finanças".to_string(),
            None,
            "1-financas.txt".to_string(),
            "txt".to_string(),
            10,
            "admin".to_string(),
        );
        store.insert_document(&doc).await.unwrap();
        let mut chunk = TextChunk::new(0, "Juros sobre juros fazem o dinheiro crescer.".to_string());
        chunk.embedding = Some(KeywordEmbedder::vector_for(&chunk.content));
        store.replace_chunks(doc.id, &[chunk]).await.unwrap();

        let context = Arc::new(ContextBuilder::new(
            store.clone(),
            store.clone(),
            Arc::new(KeywordEmbedderFactory::default()),
        ));
        let backend = Arc::new(ScriptedBackend::replying(replies));
        let service = ScriptService::new(store.clone(), store.clone(), context, backend.clone())
            .with_batch_pause(Duration::ZERO);
        (service, store, backend)
    }

    #[tokio::test]
    async fn test_generate_uses_context_and_user_provider() {
        let (service, _, backend) = service(&[DRAFT_JSON]).await;

        let generated = service.generate("user-1", &request()).await.unwrap();

        assert!(generated.parsed);
        assert_eq!(generated.context.len(), 1);
        assert_eq!(generated.script.status, ScriptStatus::Draft);
        assert_eq!(generated.script.title, "Juros que trabalham");
        assert_eq!(generated.script.target_language, "pt-BR");

        let calls = backend.calls();
        assert_eq!(calls[0].provider, LlmProvider::Claude);
        assert_eq!(calls[0].model, "claude-3-5-sonnet");
        assert!(calls[0].prompt.contains("Juros sobre juros fazem o dinheiro crescer."));
        assert!(calls[0].prompt.contains("880 palavras"));

        let listed = service.list("user-1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_prose() {
        let (service, _, _) = service(&["Roteiro sem JSON nenhum"]).await;

        let generated = service.generate("user-1", &request()).await.unwrap();

        assert!(!generated.parsed);
        assert_eq!(generated.script.title, "juros e dinheiro");
        assert_eq!(generated.script.content_portuguese, "Roteiro sem JSON nenhum");
    }

    #[tokio::test]
    async fn test_generate_without_key_fails() {
        let (service, _, backend) = service(&[DRAFT_JSON]).await;

        let err = service.generate("stranger", &request()).await.unwrap_err();

        assert!(matches!(err, RoteiroError::MissingCredential(_)));
        assert!(backend.calls().is_empty());
        assert!(service.list("stranger").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approve_then_translate() {
        let (service, _, backend) = service(&[DRAFT_JSON, TRANSLATION_JSON]).await;
        let generated = service.generate("user-1", &request()).await.unwrap();
        let id = generated.script.id;

        let approved = service.approve("user-1", id).await.unwrap();
        assert_eq!(approved.status, ScriptStatus::Approved);
        assert!(service.approve("user-1", id).await.is_err());

        let result = service
            .translate("user-1", id, "en", &TranslationOptions::default())
            .await
            .unwrap();
        assert!(result.parsed);
        assert_eq!(result.source_language, "pt-BR");
        assert_eq!(result.script.status, ScriptStatus::Final);
        assert_eq!(result.script.target_language, "en");
        assert_eq!(
            result.script.content_final.as_deref(),
            Some("Hi everyone! Today we talk about interest.")
        );
        assert_eq!(result.script.seo_title, "Compound interest");
        assert_eq!(
            result.script.content_portuguese,
            "Olá, pessoal! Hoje falamos de juros."
        );

        let stored = service.get("user-1", id).await.unwrap();
        assert_eq!(stored, result.script);
        let prompt = &backend.calls()[1].prompt;
        assert!(prompt.contains("to English"));
        assert!(prompt.contains("Adapt idioms and cultural references"));
        assert!(prompt.contains("Translate for a general audience"));
    }

    #[tokio::test]
    async fn test_translation_options_reach_the_prompt() {
        let (service, _, backend) = service(&[DRAFT_JSON, TRANSLATION_JSON]).await;
        let id = service.generate("user-1", &request()).await.unwrap().script.id;

        let options = TranslationOptions {
            preserve_formatting: false,
            adapt_idioms: false,
            maintain_tone: true,
            target_audience: "young investors".to_string(),
        };
        service.translate("user-1", id, "es", &options).await.unwrap();

        let prompt = &backend.calls()[1].prompt;
        assert!(prompt.contains("to Español"));
        assert!(prompt.contains("Restructure paragraphs and formatting"));
        assert!(prompt.contains("Keep idioms as close to the original as possible"));
        assert!(prompt.contains("Preserve the original tone and style"));
        assert!(prompt.contains("Translate for a young investors audience"));
    }

    #[tokio::test]
    async fn test_translate_many_keeps_going_past_failures() {
        let (service, _, backend) =
            service(&[DRAFT_JSON, DRAFT_JSON, TRANSLATION_JSON, TRANSLATION_JSON]).await;
        let first = service.generate("user-1", &request()).await.unwrap().script.id;
        let second = service.generate("user-1", &request()).await.unwrap().script.id;
        let missing = Uuid::new_v4();

        let results = service
            .translate_many(
                "user-1",
                &[first, missing, second],
                "en",
                &TranslationOptions::default(),
            )
            .await;

        let ids: Vec<Uuid> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![first, missing, second]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(RoteiroError::NotFound(_))));
        assert!(results[2].1.is_ok());

        for id in [first, second] {
            let script = service.get("user-1", id).await.unwrap();
            assert_eq!(script.status, ScriptStatus::Final);
            assert_eq!(script.target_language, "en");
        }
        assert_eq!(backend.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_scripts_are_private_to_their_owner() {
        let (service, _, _) = service(&[DRAFT_JSON]).await;
        let generated = service.generate("user-1", &request()).await.unwrap();

        let err = service.get("user-2", generated.script.id).await.unwrap_err();
        assert!(matches!(err, RoteiroError::NotFound(_)));
        assert!(service
            .translate("user-2", generated.script.id, "en", &TranslationOptions::default())
            .await
            .is_err());
    }
}
