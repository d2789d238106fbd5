//! The single process-wide activation slot
//!
//! `PATH` and the isolation marker are process globals, so the record of who changed
//! them is one as well. Nothing outside this module writes either variable.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::environment::{Environment, ISOLATION_MARKER};
use crate::error::{Error, Result};

const PATH_VAR: &str = "PATH";

static SLOT: Mutex<LifecycleState> = Mutex::new(LifecycleState::new());

/// Lock the activation slot.
///
/// A panic while holding the lock cannot leave the variables half-written (each
/// transition writes them after all fallible work), so a poisoned lock is recovered.
pub(crate) fn slot() -> MutexGuard<'static, LifecycleState> {
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Environment-variable overrides currently installed into the process
#[derive(Debug, Default)]
pub struct LifecycleState {
    saved_path: Option<OsString>,
    saved_isolation_var: Option<OsString>,
    is_active: bool,
    owner: Option<String>,
}

impl LifecycleState {
    pub const fn new() -> Self {
        Self {
            saved_path: None,
            saved_isolation_var: None,
            is_active: false,
            owner: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Identity (root path) of the active environment
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn is_owned_by(&self, env: &Environment) -> bool {
        self.is_active && self.owner.as_deref() == Some(env.identity().as_str())
    }

    /// Install `env` into the process.
    ///
    /// Returns `Ok(true)` when variables were changed, `Ok(false)` for a no-op
    /// (already active, or a root-less environment).
    pub(crate) fn activate(&mut self, env: &Environment) -> Result<bool> {
        let identity = env.identity();
        if self.is_active {
            let owner = self.owner.clone().unwrap_or_default();
            if owner == identity {
                return Ok(false);
            }
            return Err(Error::AlreadyActive {
                active: owner,
                requested: identity,
            });
        }

        let (Some(root), Some(bin)) = (env.root(), env.bin()) else {
            return Ok(false);
        };

        let saved_path = std::env::var_os(PATH_VAR);
        let saved_isolation_var = std::env::var_os(ISOLATION_MARKER);

        let existing = saved_path
            .as_deref()
            .map(|path| std::env::split_paths(path).collect::<Vec<_>>())
            .unwrap_or_default();
        let new_path = std::env::join_paths(std::iter::once(bin.to_path_buf()).chain(existing))
            .map_err(|e| {
                Error::Config(format!("Cannot add {} to {PATH_VAR}: {e}", bin.display()))
            })?;

        // SAFETY: the process environment is written only while holding the
        // activation slot lock, and only by `activate`/`deactivate`.
        unsafe {
            std::env::set_var(PATH_VAR, &new_path);
            std::env::set_var(ISOLATION_MARKER, root);
        }

        self.saved_path = saved_path;
        self.saved_isolation_var = saved_isolation_var;
        self.is_active = true;
        self.owner = Some(identity);
        Ok(true)
    }

    /// Restore the snapshot taken by `activate`. Returns `false` when nothing was active.
    pub(crate) fn deactivate(&mut self) -> bool {
        if !self.is_active {
            return false;
        }

        restore(PATH_VAR, self.saved_path.take().as_deref());
        restore(ISOLATION_MARKER, self.saved_isolation_var.take().as_deref());

        self.is_active = false;
        self.owner = None;
        true
    }
}

fn restore(key: &str, value: Option<&OsStr>) {
    // SAFETY: see `LifecycleState::activate`; restoration happens under the same lock.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}
