//! CLI module for Roteiro.

pub mod commands;
mod output;

pub use output::{mask_key, Output};

use clap::{Parser, Subcommand};

/// Roteiro - YouTube script generation grounded in your book library
///
/// Upload books, index them into searchable chunks, and generate video
/// scripts in Portuguese that can be translated for other audiences.
#[derive(Parser, Debug)]
#[command(name = "roteiro")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// User id to act as (defaults to general.default_user)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a book (pdf, txt, doc, docx) to the library
    Upload {
        /// Path to the file
        file: String,

        /// Book title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Book author
        #[arg(short, long)]
        author: Option<String>,

        /// Process the document right after uploading
        #[arg(short, long)]
        process: bool,
    },

    /// Extract, chunk and embed an uploaded document
    Process {
        /// Document id
        id: String,
    },

    /// Retry documents stuck in processing
    Sweep,

    /// List library documents
    List,

    /// Delete a document, its chunks and its stored file
    Delete {
        /// Document id
        id: String,
    },

    /// Search the library for passages related to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Generate a Portuguese script draft
    Generate {
        /// Video theme
        theme: String,

        /// Video duration in minutes (1-60)
        #[arg(short, long, default_value = "10")]
        duration: u32,

        /// Language style (formal, descontraida, narrativa, inspiracional)
        #[arg(short, long, default_value = "descontraida")]
        style: String,

        /// Environment (calmo, suspense, motivacional, educativo)
        #[arg(short, long, default_value = "educativo")]
        environment: String,

        /// Free-form description of the setting
        #[arg(long)]
        environment_description: Option<String>,

        /// Print the stored script as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate scripts and mark them final
    Translate {
        /// Script ids, translated one after another
        #[arg(required = true)]
        ids: Vec<String>,

        /// Target language code (en, es, fr, ...)
        #[arg(short, long)]
        language: String,

        /// Audience the translation is written for
        #[arg(short, long, default_value = "general")]
        audience: String,

        /// Allow restructuring the script's formatting
        #[arg(long)]
        no_preserve_formatting: bool,

        /// Keep idioms close to the Portuguese original
        #[arg(long)]
        no_adapt_idioms: bool,

        /// Adapt the tone to the target culture
        #[arg(long)]
        no_maintain_tone: bool,
    },

    /// Approve a draft script
    Approve {
        /// Script id
        id: String,
    },

    /// List scripts, or show one in full
    Scripts {
        /// Script id to show
        id: Option<String>,
    },

    /// Show or change the LLM provider, model and API keys
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show the current user's settings (keys are masked)
    Show,

    /// Update the current user's settings
    Set {
        /// LLM provider (openai, claude, gemini)
        #[arg(long)]
        provider: Option<String>,

        /// Model name for the provider
        #[arg(long)]
        model: Option<String>,

        /// OpenAI API key (also used for embeddings); empty to clear
        #[arg(long)]
        openai_key: Option<String>,

        /// Anthropic API key; empty to clear
        #[arg(long)]
        claude_key: Option<String>,

        /// Google Gemini API key; empty to clear
        #[arg(long)]
        gemini_key: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["roteiro", "generate", "Juros compostos"]).unwrap();
        match cli.command {
            Commands::Generate {
                theme,
                duration,
                style,
                environment,
                environment_description,
                json,
            } => {
                assert_eq!(theme, "Juros compostos");
                assert_eq!(duration, 10);
                assert_eq!(style, "descontraida");
                assert_eq!(environment, "educativo");
                assert!(environment_description.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_user_after_subcommand() {
        let cli = Cli::try_parse_from(["roteiro", "scripts", "--user", "ana", "-vv"]).unwrap();
        assert_eq!(cli.user.as_deref(), Some("ana"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Scripts { id: None }));
    }

    #[test]
    fn test_parses_translate_options() {
        let cli = Cli::try_parse_from(["roteiro", "translate", "a", "-l", "en"]).unwrap();
        match cli.command {
            Commands::Translate {
                ids,
                audience,
                no_preserve_formatting,
                no_adapt_idioms,
                no_maintain_tone,
                ..
            } => {
                assert_eq!(ids, vec!["a"]);
                assert_eq!(audience, "general");
                assert!(!no_preserve_formatting && !no_adapt_idioms && !no_maintain_tone);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "roteiro",
            "translate",
            "a",
            "b",
            "-l",
            "es",
            "--audience",
            "kids",
            "--no-adapt-idioms",
            "--no-maintain-tone",
        ])
        .unwrap();
        match cli.command {
            Commands::Translate {
                ids,
                language,
                audience,
                no_preserve_formatting,
                no_adapt_idioms,
                no_maintain_tone,
            } => {
                assert_eq!(ids, vec!["a", "b"]);
                assert_eq!(language, "es");
                assert_eq!(audience, "kids");
                assert!(!no_preserve_formatting);
                assert!(no_adapt_idioms && no_maintain_tone);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["roteiro", "translate", "-l", "en"]).is_err());
    }

    #[test]
    fn test_settings_set_requires_subcommand() {
        assert!(Cli::try_parse_from(["roteiro", "settings"]).is_err());
        let cli =
            Cli::try_parse_from(["roteiro", "settings", "set", "--provider", "claude"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Settings {
                action: SettingsAction::Set { provider: Some(_), .. }
            }
        ));
    }
}
