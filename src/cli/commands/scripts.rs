//! Script listing, display, and approval.

use super::parse_id;
use crate::app::App;
use crate::cli::Output;
use crate::store::Script;
use anyhow::Result;

/// Run the scripts command: list all, or show one.
pub async fn run_scripts(id: Option<&str>, user_id: &str, app: &App) -> Result<()> {
    if let Some(id) = id {
        let script = app.scripts.get(user_id, parse_id(id)?).await?;
        print_script(&script);
        return Ok(());
    }

    let scripts = app.scripts.list(user_id).await?;
    if scripts.is_empty() {
        Output::info("No scripts yet. Use 'roteiro generate <theme>' to create one.");
        return Ok(());
    }

    Output::header(&format!("Scripts ({})", scripts.len()));
    println!();
    for script in &scripts {
        Output::script_info(script);
    }
    Ok(())
}

/// Run the approve command.
pub async fn run_approve(id: &str, user_id: &str, app: &App) -> Result<()> {
    let script = app.scripts.approve(user_id, parse_id(id)?).await?;
    Output::success(&format!("Approved \"{}\"", script.title));
    Ok(())
}

/// Print a script with its metadata and content.
pub(super) fn print_script(script: &Script) {
    Output::header(&script.title);
    Output::kv("Id", &script.id.to_string());
    Output::kv("Status", script.status.as_str());
    Output::kv("Theme", &script.theme);
    Output::kv("Duration", &format!("{} min", script.duration_minutes));
    Output::kv("Style", &script.language_style);
    Output::kv("Environment", &script.environment);
    Output::kv("Language", &script.target_language);

    Output::header("SEO");
    Output::kv("Title", &script.seo_title);
    Output::kv("Description", &script.seo_description);
    Output::kv("Tags", &script.seo_tags.join(", "));
    Output::kv("Thumbnail", &script.thumbnail_prompt);

    Output::header("Roteiro (pt-BR)");
    println!("{}", script.content_portuguese);

    if let Some(content) = &script.content_final {
        Output::header(&format!("Final ({})", script.target_language));
        println!("{}", content);
    }
}
