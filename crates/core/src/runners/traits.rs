//! Core trait for execution strategies

use std::sync::Arc;

use crate::{
    error::Result,
    lifecycle::EnvManager,
    types::{CommandResult, RunOptions},
};

/// A strategy that executes logical commands under a failure policy
pub trait Runner: Send + Sync {
    /// Name this runner is registered under
    fn name(&self) -> &'static str;

    /// Attach the lifecycle manager whose environment commands run in
    fn bind(self: Box<Self>, manager: Arc<EnvManager>) -> Box<dyn Runner>;

    fn manager(&self) -> Option<&Arc<EnvManager>>;

    /// Run `command` to completion.
    ///
    /// Fails with `RunnerNotBound` before [`bind`](Runner::bind), and with
    /// `CommandFailed` on a non-zero exit when `options.check` is set.
    fn run(&self, command: &[String], options: &RunOptions) -> Result<CommandResult>;
}
