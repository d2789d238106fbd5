use std::fmt;

use super::EnvManager;

/// Keeps an environment active for the guard's lifetime.
///
/// Dropping the guard deactivates the environment on every exit path: normal scope
/// end, `?` early return, or unwinding. A guard created while its environment was
/// already active leaves it active, so nested scopes only release at the outermost one.
#[must_use = "the environment is deactivated as soon as the guard is dropped"]
pub struct ActivationGuard<'a> {
    manager: &'a EnvManager,
    owns_activation: bool,
}

impl<'a> ActivationGuard<'a> {
    pub(super) fn new(manager: &'a EnvManager, owns_activation: bool) -> Self {
        Self {
            manager,
            owns_activation,
        }
    }

    pub fn manager(&self) -> &'a EnvManager {
        self.manager
    }

    /// Whether dropping this guard will deactivate the environment
    pub fn owns_activation(&self) -> bool {
        self.owns_activation
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        if self.owns_activation {
            self.owns_activation = false;
            self.manager.deactivate();
        }
    }
}

impl fmt::Debug for ActivationGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationGuard")
            .field("environment", &self.manager.environment().name())
            .field("owns_activation", &self.owns_activation)
            .finish()
    }
}
