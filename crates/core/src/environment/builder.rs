//! Creating environment directory layouts on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::interpreter;
use crate::error::{Error, Result};

/// Produces the directory layout an [`Environment`](super::Environment) describes
pub trait EnvBuilder: Send + Sync {
    /// Create (or, with `clear`, recreate) the environment rooted at `root`
    fn create(&self, root: &Path, clear: bool) -> Result<()>;
}

/// Builds environments with `python -m venv`
#[derive(Debug, Clone)]
pub struct VenvBuilder {
    /// Interpreter used to run `venv`; defaults to the ambient interpreter
    pub interpreter: Option<PathBuf>,
    pub with_pip: bool,
    pub upgrade_deps: bool,
    pub system_site_packages: bool,
}

impl Default for VenvBuilder {
    fn default() -> Self {
        Self {
            interpreter: None,
            with_pip: true,
            upgrade_deps: false,
            system_site_packages: false,
        }
    }
}

impl VenvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    pub fn without_pip(mut self) -> Self {
        self.with_pip = false;
        self
    }

    pub fn with_upgrade_deps(mut self) -> Self {
        self.upgrade_deps = true;
        self
    }

    /// Arguments passed to the interpreter
    pub fn venv_args(&self, root: &Path, clear: bool) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "venv".to_string()];
        if clear {
            args.push("--clear".to_string());
        }
        if !self.with_pip {
            args.push("--without-pip".to_string());
        }
        if self.upgrade_deps {
            args.push("--upgrade-deps".to_string());
        }
        if self.system_site_packages {
            args.push("--system-site-packages".to_string());
        }
        args.push(root.display().to_string());
        args
    }
}

impl EnvBuilder for VenvBuilder {
    fn create(&self, root: &Path, clear: bool) -> Result<()> {
        fs::create_dir_all(root).map_err(|e| Error::EnvironmentCreation {
            root: root.to_path_buf(),
            reason: format!("Create environment dir: {e}"),
        })?;

        let python = self
            .interpreter
            .clone()
            .unwrap_or_else(interpreter::ambient_interpreter);
        let args = self.venv_args(root, clear);
        debug!("Creating environment: {} {}", python.display(), args.join(" "));

        let out = Command::new(&python)
            .args(&args)
            .output()
            .map_err(|e| Error::EnvironmentCreation {
                root: root.to_path_buf(),
                reason: format!("Failed to run {}: {e}", python.display()),
            })?;
        if !out.status.success() {
            return Err(Error::EnvironmentCreation {
                root: root.to_path_buf(),
                reason: format!("venv failed: {}", String::from_utf8_lossy(&out.stderr).trim()),
            });
        }

        info!("Created virtual environment at {}", root.display());
        Ok(())
    }
}
