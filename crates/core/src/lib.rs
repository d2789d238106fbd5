//! envrunner - Run commands inside isolated Python environments
//!
//! This crate provides functionality to:
//! - Describe environment layouts and create them through a pluggable builder
//! - Activate an environment process-wide and restore the previous state exactly
//! - Prepare shell-safe invocations for POSIX and Windows activation models
//! - Execute commands through standard, progress-reporting and local runners
pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod package;
pub mod progress;
pub mod runners;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

// Re-export main API components
pub use command::{Invocation, PreparedCommand, to_tokens};
pub use config::Settings;
pub use environment::{EnvBuilder, Environment, VenvBuilder};
pub use lifecycle::{ActivationGuard, EnvManager};
pub use package::{InstallOptions, PackageManager, TemporaryInstall};
pub use progress::{ProgressMode, ProgressState, estimate_progress};
pub use runners::{
    LocalRunner, ProgressRunner, Runner, RunnerOptions, RunnerRegistry, StandardRunner,
};
