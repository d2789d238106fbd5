use std::io;
use std::path::PathBuf;

/// Errors that can occur during envrunner operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No command provided")]
    EmptyCommand,

    #[error("Unknown runner type: {kind}. Available types: {}", .available.join(", "))]
    UnknownRunnerKind { kind: String, available: Vec<String> },

    #[error("Environment {active} is already active, cannot activate {requested}")]
    AlreadyActive { active: String, requested: String },

    #[error(
        "Command `{command}` failed with exit code {exit_code}{}",
        format_output(.stdout.as_deref(), .stderr.as_deref())
    )]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: Option<String>,
        stderr: Option<String>,
    },

    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove environment at {}: {reason}", .path.display())]
    Removal { path: PathBuf, reason: String },

    #[error("Runner '{runner}' not configured with an environment manager")]
    RunnerNotBound { runner: &'static str },

    #[error("Failed to create environment at {}: {reason}", .root.display())]
    EnvironmentCreation { root: PathBuf, reason: String },

    #[error("At least one package must be specified")]
    NoPackages,

    #[error("{primary} (cleanup also failed: {secondary})")]
    Cleanup {
        primary: Box<Error>,
        secondary: Box<Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Exit code of the failed child process, if this error came from one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::CommandFailed { exit_code, .. } => Some(*exit_code),
            Error::Cleanup { primary, .. } => primary.exit_code(),
            _ => None,
        }
    }
}

fn format_output(stdout: Option<&str>, stderr: Option<&str>) -> String {
    let mut out = String::new();
    for (label, text) in [("stdout", stdout), ("stderr", stderr)] {
        if let Some(text) = text.map(str::trim_end).filter(|t| !t.is_empty()) {
            out.push_str(&format!("\n--- {label} ---\n{text}"));
        }
    }
    out
}

/// Result type alias for envrunner operations
pub type Result<T> = std::result::Result<T, Error>;
