//! Launcher options, as requested by callers and as finalised by command preparation

use std::path::{Path, PathBuf};

/// Options a caller passes to `Runner::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Capture stdout/stderr into the result instead of inheriting them
    pub capture_output: bool,
    /// Strict mode: a non-zero exit becomes `Error::CommandFailed`
    pub check: bool,
    pub working_dir: Option<PathBuf>,
    /// Extra variables for the child process only
    pub env: Vec<(String, String)>,
    /// Requested shell mode; command preparation always decides the final value
    pub shell: Option<bool>,
    /// Requested executable; command preparation always decides the final value
    pub executable: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture_output: true,
            check: true,
            working_dir: None,
            env: Vec::new(),
            shell: None,
            executable: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn non_strict(self) -> Self {
        self.with_check(false)
    }

    pub fn with_capture_output(mut self, capture_output: bool) -> Self {
        self.capture_output = capture_output;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Fields command preparation controls regardless of what the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOverrides {
    pub shell: bool,
    pub executable: Option<PathBuf>,
}

/// Final launcher options for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub shell: bool,
    pub executable: Option<PathBuf>,
    pub capture_output: bool,
    pub check: bool,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl LaunchOptions {
    /// Merge preparation overrides over caller options.
    ///
    /// Caller values win for everything except `shell` and `executable`.
    pub fn merge(overrides: LaunchOverrides, caller: &RunOptions) -> Self {
        if caller.shell.is_some_and(|shell| shell != overrides.shell) {
            tracing::debug!(
                "Ignoring requested shell={:?}, command preparation selected shell={}",
                caller.shell,
                overrides.shell
            );
        }
        Self {
            shell: overrides.shell,
            executable: overrides.executable,
            capture_output: caller.capture_output,
            check: caller.check,
            working_dir: caller.working_dir.clone(),
            env: caller.env.clone(),
        }
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}
