//! Script generation and translation.
//!
//! Prompts are built from the request, the target length for the duration,
//! and library context; the LLM's answer is parsed leniently and stored.

pub mod catalog;
mod draft;
pub mod prompt;
mod service;
mod size;

pub use catalog::{language_by_code, language_name, Language, SOURCE_LANGUAGE, SUPPORTED_LANGUAGES};
pub use draft::{OriginalMetadata, ScriptDraft, TranslatedScript};
pub use prompt::{
    build_generation_prompt, build_translation_prompt, GenerationRequest, TranslationOptions,
    TranslationRequest,
};
pub use service::{
    GeneratedScript, ScriptService, TranslationResult, DEFAULT_BATCH_PAUSE, DEFAULT_CONTEXT_CHUNKS,
};
pub use size::{calculate_script_size, ScriptSize};
