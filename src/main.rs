//! Roteiro CLI entry point.

use anyhow::Result;
use clap::Parser;
use roteiro::app::App;
use roteiro::cli::{commands, Cli, Commands};
use roteiro::config::Settings;
use roteiro::script::{GenerationRequest, TranslationOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("roteiro={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    if let Commands::Config { action } = &cli.command {
        return commands::run_config(action, config_path, settings);
    }

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.bucket_dir())?;

    let user = cli
        .user
        .clone()
        .unwrap_or_else(|| settings.general.default_user.clone());
    let app = App::new(settings)?;

    // Execute command
    match cli.command {
        Commands::Upload {
            file,
            title,
            author,
            process,
        } => {
            commands::run_upload(&file, title.as_deref(), author.as_deref(), process, &user, &app)
                .await?;
        }

        Commands::Process { id } => {
            commands::run_process(&id, &app).await?;
        }

        Commands::Sweep => {
            commands::run_sweep(&app).await?;
        }

        Commands::List => {
            commands::run_list(&app).await?;
        }

        Commands::Delete { id } => {
            commands::run_delete(&id, &app).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(&query, limit, &user, &app).await?;
        }

        Commands::Generate {
            theme,
            duration,
            style,
            environment,
            environment_description,
            json,
        } => {
            let request = GenerationRequest {
                theme,
                duration_minutes: duration,
                language_style: style,
                environment,
                environment_description,
            };
            commands::run_generate(request, json, &user, &app).await?;
        }

        Commands::Translate {
            ids,
            language,
            audience,
            no_preserve_formatting,
            no_adapt_idioms,
            no_maintain_tone,
        } => {
            let options = TranslationOptions {
                preserve_formatting: !no_preserve_formatting,
                adapt_idioms: !no_adapt_idioms,
                maintain_tone: !no_maintain_tone,
                target_audience: audience,
            };
            commands::run_translate(&ids, &language, &options, &user, &app).await?;
        }

        Commands::Approve { id } => {
            commands::run_approve(&id, &user, &app).await?;
        }

        Commands::Scripts { id } => {
            commands::run_scripts(id.as_deref(), &user, &app).await?;
        }

        Commands::Settings { action } => {
            commands::run_settings(&action, &user, &app).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, app).await?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
