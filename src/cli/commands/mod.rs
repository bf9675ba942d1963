//! CLI command implementations.

mod config;
mod delete;
mod generate;
mod list;
mod process;
mod scripts;
mod search;
mod serve;
mod settings;
mod translate;
mod upload;

pub use config::run_config;
pub use delete::run_delete;
pub use generate::run_generate;
pub use list::run_list;
pub use process::{run_process, run_sweep};
pub use scripts::{run_approve, run_scripts};
pub use search::run_search;
pub use serve::{router, run_serve};
pub use settings::run_settings;
pub use translate::run_translate;
pub use upload::run_upload;

use anyhow::Context;
use uuid::Uuid;

/// Parse a document or script id given on the command line.
fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("'{}' is not a valid id", id))
}
