//! Translate command implementation.

use super::parse_id;
use super::scripts::print_script;
use crate::app::App;
use crate::cli::Output;
use crate::script::{language_by_code, language_name, TranslationOptions, SUPPORTED_LANGUAGES};
use anyhow::Result;

/// Run the translate command for one script, or a batch when several ids are given.
pub async fn run_translate(
    ids: &[String],
    language: &str,
    options: &TranslationOptions,
    user_id: &str,
    app: &App,
) -> Result<()> {
    let ids = ids.iter().map(|id| parse_id(id)).collect::<Result<Vec<_>>>()?;

    if language_by_code(language).is_none() {
        let known: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|l| l.code).collect();
        Output::warning(&format!(
            "'{}' is not a listed language ({}); translating anyway.",
            language,
            known.join(", ")
        ));
    }

    if let [id] = ids.as_slice() {
        let spinner = Output::spinner(&format!("Translating to {}...", language_name(language)));
        let result = app.scripts.translate(user_id, *id, language, options).await;
        spinner.finish_and_clear();

        let translation = match result {
            Ok(translation) => translation,
            Err(e) => {
                Output::error(&format!("Translation failed: {}", e));
                return Err(e.into());
            }
        };

        print_script(&translation.script);

        println!();
        Output::kv(
            "Languages",
            &format!("{} -> {}", translation.source_language, translation.target_language),
        );
        Output::kv("Time", &format!("{:.1}s", translation.elapsed_ms as f64 / 1000.0));
        if !translation.parsed {
            Output::warning("The model did not return structured output; metadata was kept untranslated.");
        }
        Output::success("Script marked as final.");
        return Ok(());
    }

    let spinner = Output::spinner(&format!(
        "Translating {} scripts to {}...",
        ids.len(),
        language_name(language)
    ));
    let results = app
        .scripts
        .translate_many(user_id, &ids, language, options)
        .await;
    spinner.finish_and_clear();

    let mut failed = 0;
    for (id, result) in &results {
        match result {
            Ok(translation) => Output::success(&format!(
                "{}  {} ({:.1}s)",
                id,
                translation.script.title,
                translation.elapsed_ms as f64 / 1000.0
            )),
            Err(e) => {
                failed += 1;
                Output::error(&format!("{}  {}", id, e));
            }
        }
    }

    println!();
    Output::kv(
        "Translated",
        &format!("{}/{}", results.len() - failed, results.len()),
    );
    if failed > 0 {
        anyhow::bail!("{} of {} translations failed", failed, results.len());
    }
    Ok(())
}
