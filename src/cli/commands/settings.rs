//! Per-user settings command implementation.

use crate::app::App;
use crate::cli::{mask_key, Output, SettingsAction};
use crate::llm::LlmProvider;
use crate::store::{SettingsStore, UserSettings};
use anyhow::Result;

/// Run the settings command.
pub async fn run_settings(action: &SettingsAction, user_id: &str, app: &App) -> Result<()> {
    let mut settings = app
        .store
        .get_user_settings(user_id)
        .await?
        .unwrap_or_else(|| UserSettings::default_for(user_id));

    match action {
        SettingsAction::Show => print_settings(&settings),

        SettingsAction::Set {
            provider,
            model,
            openai_key,
            claude_key,
            gemini_key,
        } => {
            if let Some(provider) = provider {
                settings.llm_provider = provider.parse()?;
            }
            if let Some(model) = model {
                settings.llm_model = model.trim().to_string();
            }
            for (provider, key) in [
                (LlmProvider::OpenAI, openai_key),
                (LlmProvider::Claude, claude_key),
                (LlmProvider::Gemini, gemini_key),
            ] {
                if let Some(key) = key {
                    settings.set_api_key(provider, Some(key.clone()));
                }
            }

            app.store.save_user_settings(&settings).await?;
            Output::success(&format!("Saved settings for '{}'", user_id));
            print_settings(&settings);
        }
    }

    Ok(())
}

fn print_settings(settings: &UserSettings) {
    Output::header(&format!("Settings for {}", settings.user_id));
    Output::kv("Provider", settings.llm_provider.label());
    Output::kv("Model", &settings.llm_model);
    Output::kv("OpenAI key", &mask_key(settings.openai_api_key.as_deref()));
    Output::kv("Claude key", &mask_key(settings.claude_api_key.as_deref()));
    Output::kv("Gemini key", &mask_key(settings.gemini_api_key.as_deref()));

    if settings.api_key_for(settings.llm_provider).is_none() {
        Output::warning(&format!(
            "No {} key set; script generation will fail.",
            settings.llm_provider.label()
        ));
    }
}
