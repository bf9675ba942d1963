//! Prompt construction for script generation and translation.

use super::catalog::{environment_description, language_name, style_description};
use super::size::calculate_script_size;
use crate::config::Prompts;
use crate::error::{Result, RoteiroError};
use crate::rag::{format_context_for_prompt, RetrievedChunk};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest video a script can be generated for, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 60;

/// What the user asked to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub theme: String,
    pub duration_minutes: u32,
    pub language_style: String,
    pub environment: String,
    #[serde(default)]
    pub environment_description: Option<String>,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.theme.trim().is_empty() {
            return Err(RoteiroError::InvalidInput("Theme must not be empty".to_string()));
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(RoteiroError::InvalidInput(format!(
                "Duration must be between 1 and {} minutes",
                MAX_DURATION_MINUTES
            )));
        }
        Ok(())
    }
}

/// How a translation should treat the source script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationOptions {
    pub preserve_formatting: bool,
    pub adapt_idioms: bool,
    pub maintain_tone: bool,
    pub target_audience: String,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            adapt_idioms: true,
            maintain_tone: true,
            target_audience: "general".to_string(),
        }
    }
}

/// A script body and its metadata to translate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationRequest {
    pub content: String,
    pub source_language: String,
    pub target_language: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_tags: Vec<String>,
    pub thumbnail_prompt: Option<String>,
    pub options: TranslationOptions,
}

/// Build the prompt that asks the LLM for a Portuguese script as JSON.
pub fn build_generation_prompt(
    request: &GenerationRequest,
    context: &[RetrievedChunk],
    prompts: &Prompts,
) -> String {
    let size = calculate_script_size(request.duration_minutes);

    let environment_details = request
        .environment_description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("\nDESCRIÇÃO DO AMBIENTE: {}", d))
        .unwrap_or_default();

    let context_section = if context.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nCONTEÚDO RELEVANTE DOS LIVROS:\n{}",
            format_context_for_prompt(context)
        )
    };

    let mut vars = HashMap::new();
    vars.insert("theme".to_string(), request.theme.trim().to_string());
    vars.insert("duration".to_string(), request.duration_minutes.to_string());
    vars.insert("style".to_string(), request.language_style.clone());
    vars.insert(
        "style_description".to_string(),
        style_description(&request.language_style).to_string(),
    );
    vars.insert("environment".to_string(), request.environment.clone());
    vars.insert(
        "environment_description".to_string(),
        environment_description(&request.environment).to_string(),
    );
    vars.insert("environment_details".to_string(), environment_details);
    vars.insert("words".to_string(), size.words.to_string());
    vars.insert("characters".to_string(), size.characters.to_string());
    vars.insert("context_section".to_string(), context_section);

    prompts.render_with_custom(&prompts.generation.template, &vars)
}

/// Build the prompt that asks the LLM to translate a script and its metadata.
pub fn build_translation_prompt(request: &TranslationRequest, prompts: &Prompts) -> String {
    let mut metadata = Vec::new();
    if let Some(title) = request.seo_title.as_deref().filter(|t| !t.is_empty()) {
        metadata.push(format!("SEO title: {}", title));
    }
    if let Some(description) = request.seo_description.as_deref().filter(|d| !d.is_empty()) {
        metadata.push(format!("SEO description: {}", description));
    }
    if !request.seo_tags.is_empty() {
        metadata.push(format!("SEO tags: {}", request.seo_tags.join(", ")));
    }
    if let Some(thumbnail) = request.thumbnail_prompt.as_deref().filter(|t| !t.is_empty()) {
        metadata.push(format!("Thumbnail prompt: {}", thumbnail));
    }

    let metadata_section = if metadata.is_empty() {
        String::new()
    } else {
        format!("\n\nMETADATA TO TRANSLATE:\n{}", metadata.join("\n"))
    };

    let mut vars = HashMap::new();
    vars.insert(
        "source_language".to_string(),
        language_name(&request.source_language),
    );
    vars.insert(
        "target_language".to_string(),
        language_name(&request.target_language),
    );
    vars.insert("content".to_string(), request.content.clone());
    vars.insert("metadata_section".to_string(), metadata_section);

    let options = &request.options;
    let formatting = if options.preserve_formatting {
        "Maintain the original script structure and formatting"
    } else {
        "Restructure paragraphs and formatting where it reads better"
    };
    let idioms = if options.adapt_idioms {
        "Adapt idioms and cultural references to the target language"
    } else {
        "Keep idioms as close to the original as possible"
    };
    let tone = if options.maintain_tone {
        "Preserve the original tone and style"
    } else {
        "Adapt the tone to the target culture"
    };
    let audience = match options.target_audience.trim() {
        "" => "general",
        audience => audience,
    };
    vars.insert("formatting_instruction".to_string(), formatting.to_string());
    vars.insert("idioms_instruction".to_string(), idioms.to_string());
    vars.insert("tone_instruction".to_string(), tone.to_string());
    vars.insert("target_audience".to_string(), audience.to_string());

    prompts.render_with_custom(&prompts.translation.template, &vars)
}
