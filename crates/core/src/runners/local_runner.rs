use std::sync::Arc;

use super::common::{self, InvocationPhase, PhaseTracker};
use super::traits::Runner;
use crate::{
    command,
    error::Result,
    lifecycle::EnvManager,
    types::{CommandResult, RunOptions},
};

/// Runs commands in the caller's own context, escaping any active environment
///
/// The interpreter token resolves to the base interpreter the active environment was
/// created from. The bound manager is never activated.
#[derive(Debug, Default, Clone)]
pub struct LocalRunner {
    manager: Option<Arc<EnvManager>>,
}

impl LocalRunner {
    pub const NAME: &'static str = "local";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Runner for LocalRunner {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn bind(self: Box<Self>, manager: Arc<EnvManager>) -> Box<dyn Runner> {
        Box::new(Self {
            manager: Some(manager),
        })
    }

    fn manager(&self) -> Option<&Arc<EnvManager>> {
        self.manager.as_ref()
    }

    fn run(&self, command: &[String], options: &RunOptions) -> Result<CommandResult> {
        let mut tracker = PhaseTracker::new(Self::NAME);
        common::require_manager(Self::NAME, self.manager.as_ref())?;

        tracker.advance(InvocationPhase::Preparing);
        let prepared =
            command::prepare_local(command, options).map_err(|e| tracker.fail(e))?;

        common::execute_blocking(&prepared, &mut tracker)
    }
}
