use std::sync::Arc;

use super::common::{self, InvocationPhase, PhaseTracker};
use super::traits::Runner;
use crate::{
    error::Result,
    lifecycle::EnvManager,
    types::{CommandResult, RunOptions},
};

/// Runs commands synchronously inside the bound environment
#[derive(Debug, Default, Clone)]
pub struct StandardRunner {
    manager: Option<Arc<EnvManager>>,
}

impl StandardRunner {
    pub const NAME: &'static str = "standard";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Runner for StandardRunner {
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
        let manager = common::require_manager(Self::NAME, self.manager.as_ref())?;

        tracker.advance(InvocationPhase::Preparing);
        let prepared = manager
            .prepare_command(command, options)
            .map_err(|e| tracker.fail(e))?;

        common::execute_blocking(&prepared, &mut tracker)
    }
}
