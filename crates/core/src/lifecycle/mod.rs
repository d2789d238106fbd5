//! Activation lifecycle of one environment
//!
//! [`EnvManager`] is the only public way to install an environment's variables into
//! the process and to take them out again.

pub mod guard;
pub mod state;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    command::{self, PreparedCommand},
    environment::{EnvBuilder, Environment, VenvBuilder},
    error::{Error, Result},
    package::PackageManager,
    runners::{Runner, RunnerOptions, registry},
    types::RunOptions,
};

pub use guard::ActivationGuard;
pub use state::LifecycleState;

/// Lifecycle manager bound to one [`Environment`]
#[derive(Debug, Clone)]
pub struct EnvManager {
    env: Environment,
}

impl EnvManager {
    /// Bind to the environment at `root`, creating it with `builder` first.
    ///
    /// Without a builder a [`VenvBuilder`] is used. Without a root nothing is created
    /// and the manager describes the marker environment or the ambient context.
    pub fn new(root: Option<&Path>, clear: bool, builder: Option<&dyn EnvBuilder>) -> Result<Self> {
        let Some(root) = root else {
            return Ok(Self::open(None));
        };

        let manager = Self::open(Some(root));
        if manager.env.is_system_location() {
            debug!(
                "{} is a system installation, skipping creation",
                root.display()
            );
            return Ok(manager);
        }

        if manager.is_active() {
            warn!(
                "Recreating active environment at {}, other users of it may see access errors",
                manager.env.name()
            );
        }

        let default_builder;
        let builder = match builder {
            Some(builder) => builder,
            None => {
                default_builder = VenvBuilder::default();
                &default_builder
            }
        };

        // Environment::new absolutized the root; build at that path
        let target = manager.env.root().unwrap_or(root);
        builder.create(target, clear)?;
        Ok(manager)
    }

    /// Bind to an existing environment without creating anything
    pub fn open(root: Option<&Path>) -> Self {
        Self::from_environment(Environment::new(root))
    }

    pub fn from_environment(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Install this environment's `PATH` entry and isolation marker.
    ///
    /// A no-op when already active or when the environment has no root; fails with
    /// [`Error::AlreadyActive`] when another environment holds the activation slot.
    pub fn activate(&self) -> Result<&Self> {
        self.activate_inner()?;
        Ok(self)
    }

    fn activate_inner(&self) -> Result<bool> {
        if self.env.root().is_some() && self.env.is_system_location() {
            debug!("Not activating system installation {}", self.env.identity());
            return Ok(false);
        }

        let changed = state::slot().activate(&self.env)?;
        if changed {
            info!("Activated environment at {}", self.env.identity());
        }
        Ok(changed)
    }

    /// Restore the variables captured by [`activate`](Self::activate). Idempotent.
    pub fn deactivate(&self) -> &Self {
        let mut slot = state::slot();
        if !slot.is_owned_by(&self.env) {
            return self;
        }
        if slot.deactivate() {
            info!("Deactivated environment at {}", self.env.identity());
        }
        self
    }

    pub fn is_active(&self) -> bool {
        state::slot().is_owned_by(&self.env)
    }

    /// Activate until the returned guard is dropped
    pub fn scoped(&self) -> Result<ActivationGuard<'_>> {
        let owns_activation = self.activate_inner()?;
        Ok(ActivationGuard::new(self, owns_activation))
    }

    /// Run `f` with the environment active; deactivation happens even if `f` fails or panics
    pub fn with_activation<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let _guard = self.scoped()?;
        f(self)
    }

    /// Translate a logical command into a launchable invocation for this environment
    pub fn prepare_command(&self, command: &[String], options: &RunOptions) -> Result<PreparedCommand> {
        command::prepare_command(&self.env, command, options)
    }

    /// Create a runner of the given kind from the global registry, bound to this manager
    pub fn runner(self: &Arc<Self>, kind: &str, options: &RunnerOptions) -> Result<Box<dyn Runner>> {
        let runner = registry::create_runner(kind, options)?;
        Ok(runner.bind(Arc::clone(self)))
    }

    /// Package operations routed through a runner of the given kind
    pub fn package_manager(self: &Arc<Self>, kind: &str) -> Result<PackageManager> {
        Ok(PackageManager::new(self.runner(kind, &RunnerOptions::default())?))
    }

    /// Delete the environment directory. A no-op for root-less or system environments.
    pub fn remove(&self) -> Result<()> {
        let Some(root) = self.env.root() else {
            return Ok(());
        };
        if self.env.is_system_location() {
            return Ok(());
        }

        if self.is_active() {
            self.deactivate();
        }

        fs::remove_dir_all(root).map_err(|e| Error::Removal {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if root.exists() {
            return Err(Error::Removal {
                path: root.to_path_buf(),
                reason: "directory still present after removal".to_string(),
            });
        }

        info!("Removed virtual environment at {}", root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct LayoutBuilder;

    impl EnvBuilder for LayoutBuilder {
        fn create(&self, root: &Path, _clear: bool) -> Result<()> {
            let bin = root.join("bin");
            fs::create_dir_all(&bin)?;
            fs::create_dir_all(root.join("lib"))?;
            fs::write(bin.join("activate"), "# activate\n")?;
            Ok(())
        }
    }

    struct FailingBuilder;

    impl EnvBuilder for FailingBuilder {
        fn create(&self, root: &Path, _clear: bool) -> Result<()> {
            Err(Error::EnvironmentCreation {
                root: root.to_path_buf(),
                reason: "builder refused".to_string(),
            })
        }
    }

    fn snapshot() -> (Option<OsString>, Option<OsString>) {
        (std::env::var_os("PATH"), std::env::var_os("VIRTUAL_ENV"))
    }

    fn managed(temp: &TempDir, name: &str) -> EnvManager {
        EnvManager::new(Some(&temp.path().join(name)), false, Some(&LayoutBuilder)).unwrap()
    }

    #[test]
    #[serial]
    fn test_new_runs_builder() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");

        assert!(manager.environment().is_isolated());
        assert_eq!(manager.environment().name(), "app");
        assert!(!manager.is_active());
    }

    #[test]
    #[serial]
    fn test_builder_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let err = EnvManager::new(Some(&temp.path().join("app")), false, Some(&FailingBuilder))
            .unwrap_err();
        assert!(matches!(err, Error::EnvironmentCreation { .. }));
    }

    #[test]
    #[serial]
    fn test_activate_sets_path_and_marker() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let before = snapshot();

        manager.activate().unwrap();

        let root = manager.environment().root().unwrap().to_path_buf();
        let bin = manager.environment().bin().unwrap().to_path_buf();
        assert!(manager.is_active());
        assert_eq!(std::env::var_os("VIRTUAL_ENV"), Some(root.into_os_string()));
        let path = std::env::var_os("PATH").unwrap();
        assert_eq!(std::env::split_paths(&path).next(), Some(bin));

        manager.deactivate();
        assert!(!manager.is_active());
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_restores_unset_marker() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let saved = std::env::var_os("VIRTUAL_ENV");
        // SAFETY: serial test, no other thread touches the environment.
        unsafe { std::env::remove_var("VIRTUAL_ENV") };

        manager.activate().unwrap();
        manager.deactivate();
        assert_eq!(std::env::var_os("VIRTUAL_ENV"), None);

        if let Some(saved) = saved {
            // SAFETY: as above.
            unsafe { std::env::set_var("VIRTUAL_ENV", saved) };
        }
    }

    #[test]
    #[serial]
    fn test_double_activation_is_noop() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let before = snapshot();

        manager.activate().unwrap();
        let after_first = snapshot();
        manager.activate().unwrap();
        assert_eq!(snapshot(), after_first);

        manager.deactivate();
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_second_environment_is_rejected() {
        let temp = TempDir::new().unwrap();
        let first = managed(&temp, "first");
        let second = managed(&temp, "second");

        first.activate().unwrap();
        let err = second.activate().unwrap_err();
        assert!(matches!(err, Error::AlreadyActive { .. }));

        // a non-owner cannot release someone else's activation
        second.deactivate();
        assert!(first.is_active());

        first.deactivate();
        second.activate().unwrap();
        assert!(second.is_active());
        second.deactivate();
    }

    #[test]
    #[serial]
    fn test_deactivate_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let before = snapshot();

        manager.deactivate();
        manager.activate().unwrap();
        manager.deactivate();
        manager.deactivate();
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_scoped_activation_releases_on_error() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let before = snapshot();

        let result: Result<()> = manager.with_activation(|m| {
            assert!(m.is_active());
            Err(Error::EmptyCommand)
        });

        assert!(matches!(result, Err(Error::EmptyCommand)));
        assert!(!manager.is_active());
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_scoped_activation_releases_on_panic() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let before = snapshot();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = manager.scoped().unwrap();
            panic!("body failed");
        }));

        assert!(outcome.is_err());
        assert!(!manager.is_active());
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_nested_scope_releases_at_outermost() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");

        let outer = manager.scoped().unwrap();
        assert!(outer.owns_activation());
        {
            let inner = manager.scoped().unwrap();
            assert!(!inner.owns_activation());
        }
        assert!(manager.is_active());
        drop(outer);
        assert!(!manager.is_active());
    }

    #[test]
    #[serial]
    fn test_ambient_activation_is_noop() {
        let manager = EnvManager::from_environment(Environment::ambient());
        let before = snapshot();

        manager.activate().unwrap();
        assert!(!manager.is_active());
        assert_eq!(snapshot(), before);
    }

    #[test]
    #[serial]
    fn test_remove_deletes_root_and_deactivates() {
        let temp = TempDir::new().unwrap();
        let manager = managed(&temp, "app");
        let root: PathBuf = manager.environment().root().unwrap().to_path_buf();
        manager.activate().unwrap();

        manager.remove().unwrap();

        assert!(!root.exists());
        assert!(!manager.is_active());
    }

    #[test]
    #[serial]
    fn test_remove_missing_root_is_removal_error() {
        let temp = TempDir::new().unwrap();
        let manager = EnvManager::open(Some(&temp.path().join("never-created")));
        let err = manager.remove().unwrap_err();
        assert!(matches!(err, Error::Removal { .. }));
    }
}
