//! Configuration module for Roteiro.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GenerationPrompts, Prompts, TranslationPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, ProcessingSettings,
    PromptSettings, SearchSettings, Settings, StorageSettings,
};
