use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{Error, Result},
    runners::{RunnerOptions, StandardRunner},
    types::RunOptions,
};

/// File names searched in each directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["envrunner.json", ".envrunner.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Settings {
    /// Runner kind used when none is requested
    pub runner: String,
    pub check: bool,
    pub capture_output: bool,
    pub poll_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_output: Option<usize>,
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runner: StandardRunner::NAME.to_string(),
            check: true,
            capture_output: true,
            poll_interval_ms: 50,
            inline_output: None,
            show_progress: true,
        }
    }
}

impl Settings {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Nearest config file above `start_path` (defaults when none), then env overrides
    pub fn load(start_path: &Path) -> Result<Self> {
        let mut settings = match Self::find_config_file(start_path) {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(runner) = env_value("ENVRUNNER_RUNNER") {
            self.runner = runner;
        }
        if let Some(value) = env_value("ENVRUNNER_CHECK") {
            self.check = parse_bool("ENVRUNNER_CHECK", &value)?;
        }
        if let Some(value) = env_value("ENVRUNNER_CAPTURE") {
            self.capture_output = parse_bool("ENVRUNNER_CAPTURE", &value)?;
        }
        if let Some(value) = env_value("ENVRUNNER_POLL_MS") {
            self.poll_interval_ms = parse_number("ENVRUNNER_POLL_MS", &value)?;
        }
        if let Some(value) = env_value("ENVRUNNER_INLINE_OUTPUT") {
            let lines: usize = parse_number("ENVRUNNER_INLINE_OUTPUT", &value)?;
            self.inline_output = (lines > 0).then_some(lines);
        }
        if let Some(value) = env_value("ENVRUNNER_SHOW_PROGRESS") {
            self.show_progress = parse_bool("ENVRUNNER_SHOW_PROGRESS", &value)?;
        }
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::new()
            .with_check(self.check)
            .with_capture_output(self.capture_output)
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            inline_output: self.inline_output,
            show_progress: self.show_progress,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key} must be a boolean, got '{value}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}
