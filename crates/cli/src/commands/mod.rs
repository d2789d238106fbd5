pub mod create;
pub mod pkg;
pub mod remove;
pub mod run;
pub mod runners;

pub use create::create_command;
pub use pkg::pkg_command;
pub use remove::remove_command;
pub use run::{RunArgs, run_command};
pub use runners::runners_command;

use anyhow::{Context, Result};
use envrunner_core::Settings;

/// Settings for the current directory
pub(crate) fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Settings::load(&cwd).context("Failed to load settings")
}
