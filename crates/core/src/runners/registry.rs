//! Name-keyed runner constructors
//!
//! The process-global registry starts with `standard`, `progress` and `local`;
//! private registries can be built for tests or embedding.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{LocalRunner, ProgressRunner, Runner, RunnerOptions, StandardRunner};
use crate::error::{Error, Result};

/// Builds a fresh, unbound runner
pub type RunnerConstructor = Arc<dyn Fn(&RunnerOptions) -> Box<dyn Runner> + Send + Sync>;

/// Registry mapping runner kinds to constructors
#[derive(Clone)]
pub struct RunnerRegistry {
    constructors: HashMap<String, RunnerConstructor>,
}

impl std::fmt::Debug for RunnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerRegistry")
            .field("constructors", &self.list_registered())
            .finish()
    }
}

impl RunnerRegistry {
    /// Create a new registry with the default runners
    pub fn new() -> Self {
        RunnerRegistryBuilder::new().with_defaults().build()
    }

    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register `constructor` under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, constructor: RunnerConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Construct a new unbound runner of kind `name`
    pub fn create(&self, name: &str, options: &RunnerOptions) -> Result<Box<dyn Runner>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::UnknownRunnerKind {
                kind: name.to_string(),
                available: self.list_registered().into_iter().collect(),
            })?;
        Ok(constructor(options))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered kinds in sorted order
    pub fn list_registered(&self) -> BTreeSet<String> {
        self.constructors.keys().cloned().collect()
    }
}

impl Default for RunnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating custom runner registries
#[derive(Default)]
pub struct RunnerRegistryBuilder {
    constructors: HashMap<String, RunnerConstructor>,
}

impl RunnerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runner<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&RunnerOptions) -> Box<dyn Runner> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Add `standard`, `progress` and `local`
    pub fn with_defaults(self) -> Self {
        self.with_runner(StandardRunner::NAME, |_| Box::new(StandardRunner::new()))
            .with_runner(ProgressRunner::NAME, |options| {
                Box::new(ProgressRunner::new(options.clone()))
            })
            .with_runner(LocalRunner::NAME, |_| Box::new(LocalRunner::new()))
    }

    pub fn build(self) -> RunnerRegistry {
        RunnerRegistry {
            constructors: self.constructors,
        }
    }
}

static GLOBAL: LazyLock<RwLock<RunnerRegistry>> =
    LazyLock::new(|| RwLock::new(RunnerRegistry::new()));

/// Read access to the process-global registry
pub fn global() -> RwLockReadGuard<'static, RunnerRegistry> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

fn global_mut() -> RwLockWriteGuard<'static, RunnerRegistry> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
}

/// Register a runner kind in the process-global registry
pub fn register_runner<F>(name: impl Into<String>, constructor: F)
where
    F: Fn(&RunnerOptions) -> Box<dyn Runner> + Send + Sync + 'static,
{
    let name = name.into();
    tracing::debug!("Registering runner '{}'", name);
    global_mut().register(name, Arc::new(constructor));
}

/// Construct a runner from the process-global registry
pub fn create_runner(name: &str, options: &RunnerOptions) -> Result<Box<dyn Runner>> {
    global().create(name, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::EnvManager;
    use crate::types::{CommandResult, RunOptions};

    struct EchoRunner {
        manager: Option<Arc<EnvManager>>,
    }

    impl Runner for EchoRunner {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn bind(self: Box<Self>, manager: Arc<EnvManager>) -> Box<dyn Runner> {
            Box::new(EchoRunner {
                manager: Some(manager),
            })
        }

        fn manager(&self) -> Option<&Arc<EnvManager>> {
            self.manager.as_ref()
        }

        fn run(&self, command: &[String], _options: &RunOptions) -> Result<CommandResult> {
            Ok(CommandResult {
                command: command.to_vec(),
                exit_code: 0,
                stdout: Some(command.join(" ")),
                stderr: None,
            })
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = RunnerRegistry::new();

        assert!(registry.contains("standard"));
        assert!(registry.contains("progress"));
        assert!(registry.contains("local"));
        assert_eq!(
            registry.list_registered().into_iter().collect::<Vec<_>>(),
            ["local", "progress", "standard"]
        );
    }

    #[test]
    fn test_unknown_kind_lists_available() {
        let registry = RunnerRegistry::new();
        let err = registry.create("bogus", &RunnerOptions::default()).err().unwrap();

        match err {
            Error::UnknownRunnerKind { kind, available } => {
                assert_eq!(kind, "bogus");
                assert_eq!(available, ["local", "progress", "standard"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_returns_independent_instances() {
        let registry = RunnerRegistry::new();
        let first = registry.create("standard", &RunnerOptions::default()).unwrap();
        let second = registry.create("standard", &RunnerOptions::default()).unwrap();

        assert_eq!(first.name(), "standard");
        let manager = Arc::new(EnvManager::from_environment(
            crate::environment::Environment::ambient(),
        ));
        let bound = first.bind(manager);
        assert!(bound.manager().is_some());
        assert!(second.manager().is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = RunnerRegistry::new();
        assert_eq!(
            registry.create("standard", &RunnerOptions::default()).unwrap().name(),
            "standard"
        );

        registry.register("standard", Arc::new(|_: &RunnerOptions| {
            Box::new(EchoRunner { manager: None }) as Box<dyn Runner>
        }));

        let runner = registry.create("standard", &RunnerOptions::default()).unwrap();
        assert_eq!(runner.name(), "echo");
        assert_eq!(
            registry.list_registered().into_iter().collect::<Vec<_>>(),
            ["local", "progress", "standard"]
        );
    }

    #[test]
    fn test_custom_registry() {
        let registry = RunnerRegistryBuilder::new()
            .with_runner("echo", |_| Box::new(EchoRunner { manager: None }))
            .build();

        assert!(registry.contains("echo"));
        assert!(!registry.contains("standard"));
    }

    #[test]
    fn test_global_registration() {
        register_runner("test-echo", |_| Box::new(EchoRunner { manager: None }));
        assert!(global().contains("test-echo"));

        let runner = create_runner("test-echo", &RunnerOptions::default()).unwrap();
        let result = runner.run(&["a".into(), "b".into()], &RunOptions::default()).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("a b"));
    }
}
