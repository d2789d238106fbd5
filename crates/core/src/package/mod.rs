//! Package operations expressed as `pip` commands routed through a runner

pub mod temporary;

use tracing::{error, info};

use crate::{
    error::{Error, Result},
    runners::Runner,
    types::RunOptions,
};

pub use temporary::TemporaryInstall;

/// Extra arguments for `pip install`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Passed through verbatim after the package name
    pub pip_options: Vec<String>,
    /// `(key, None)` renders as `--key`, `(key, Some(v))` as `--key=v`
    pub flags: Vec<(String, Option<String>)>,
}

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pip_option(mut self, option: impl Into<String>) -> Self {
        self.pip_options.push(option.into());
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>) -> Self {
        self.flags.push((key.into(), None));
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.push((key.into(), Some(value.into())));
        self
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = self.pip_options.clone();
        for (key, value) in &self.flags {
            let key = key.replace('_', "-");
            match value {
                Some(value) => args.push(format!("--{key}={value}")),
                None => args.push(format!("--{key}")),
            }
        }
        args
    }
}

/// Installs, removes and inspects packages in the runner's environment
pub struct PackageManager {
    runner: Box<dyn Runner>,
}

impl std::fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageManager")
            .field("runner", &self.runner.name())
            .finish()
    }
}

impl PackageManager {
    pub fn new(runner: Box<dyn Runner>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    pub fn install(&self, package: &str, options: &InstallOptions) -> Result<&Self> {
        let mut command = pip(["install", package]);
        command.extend(options.to_args());

        self.runner
            .run(&command, &RunOptions::default())
            .inspect_err(|e| error!("Failed to install package {}: {}", package, e))?;
        info!("Successfully installed package: {}", package);
        Ok(self)
    }

    pub fn uninstall(&self, package: &str) -> Result<&Self> {
        self.runner
            .run(&pip(["uninstall", "-y", package]), &RunOptions::default())
            .inspect_err(|e| error!("Failed to uninstall package {}: {}", package, e))?;
        info!("Successfully uninstalled package: {}", package);
        Ok(self)
    }

    /// `pip show` exits non-zero for unknown packages
    pub fn is_installed(&self, package: &str) -> Result<bool> {
        let result = self
            .runner
            .run(&pip(["show", package]), &RunOptions::new().non_strict())?;
        Ok(result.success())
    }

    /// Names of installed packages, without versions
    pub fn list_packages(&self) -> Result<Vec<String>> {
        let result = self
            .runner
            .run(&pip(["list", "--format=freeze"]), &RunOptions::default())?;
        Ok(parse_freeze(result.stdout_lines()))
    }

    /// Install `packages` until the returned guard is finished or dropped
    pub fn install_temporarily<I, S>(
        &self,
        packages: I,
        options: &InstallOptions,
    ) -> Result<TemporaryInstall<'_>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TemporaryInstall::acquire(self, packages.into_iter().map(Into::into).collect(), options)
    }

    /// Run `f` with `packages` installed, uninstalling them afterwards whatever `f` returns
    pub fn with_packages<I, S, T>(
        &self,
        packages: I,
        options: &InstallOptions,
        f: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let guard = self.install_temporarily(packages, options)?;
        let outcome = f(self);
        let cleanup = guard.finish();

        match (outcome, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(secondary)) => Err(secondary),
            (Err(primary), Ok(())) => Err(primary),
            (Err(primary), Err(secondary)) => Err(Error::Cleanup {
                primary: Box::new(primary),
                secondary: Box::new(secondary),
            }),
        }
    }
}

fn pip<const N: usize>(args: [&str; N]) -> Vec<String> {
    std::iter::once("pip")
        .chain(args)
        .map(str::to_string)
        .collect()
}

fn parse_freeze<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split_once("==")
                .or_else(|| line.split_once(" @ "))
                .map_or(line, |(name, _)| name)
                .trim()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lifecycle::EnvManager;
    use crate::types::CommandResult;
    use std::sync::{Arc, Mutex};

    /// Records every command; commands starting with a listed prefix exit 1
    #[derive(Clone, Default)]
    pub(crate) struct RecordingRunner {
        pub calls: Arc<Mutex<Vec<Vec<String>>>>,
        pub failing: Arc<Mutex<Vec<Vec<String>>>>,
        pub stdout: String,
    }

    impl RecordingRunner {
        pub fn fail_on(&self, prefix: &[&str]) {
            let prefix = prefix.iter().map(|s| s.to_string()).collect();
            self.failing.lock().unwrap().push(prefix);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.join(" ")).collect()
        }
    }

    impl Runner for RecordingRunner {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn bind(self: Box<Self>, _manager: Arc<EnvManager>) -> Box<dyn Runner> {
            self
        }

        fn manager(&self) -> Option<&Arc<EnvManager>> {
            None
        }

        fn run(&self, command: &[String], options: &RunOptions) -> Result<CommandResult> {
            self.calls.lock().unwrap().push(command.to_vec());
            let fails = self
                .failing
                .lock()
                .unwrap()
                .iter()
                .any(|prefix| command.starts_with(prefix));
            let result = CommandResult {
                command: command.to_vec(),
                exit_code: if fails { 1 } else { 0 },
                stdout: Some(self.stdout.clone()),
                stderr: Some(String::new()),
            };
            if fails && options.check {
                return Err(Error::CommandFailed {
                    command: result.command_line(),
                    exit_code: 1,
                    stdout: result.stdout,
                    stderr: result.stderr,
                });
            }
            Ok(result)
        }
    }

    pub(crate) fn manager_with(runner: &RecordingRunner) -> PackageManager {
        PackageManager::new(Box::new(runner.clone()))
    }

    #[test]
    fn test_install_renders_options() {
        let runner = RecordingRunner::default();
        let options = InstallOptions::new()
            .with_pip_option("--quiet")
            .with_flag("no_deps")
            .with_value("index_url", "https://example.invalid/simple");

        manager_with(&runner).install("requests", &options).unwrap();

        assert_eq!(
            runner.calls(),
            ["pip install requests --quiet --no-deps --index-url=https://example.invalid/simple"]
        );
    }

    #[test]
    fn test_install_failure_propagates_command_failed() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "install"]);

        let err = manager_with(&runner)
            .install("nope", &InstallOptions::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_uninstall_and_chaining() {
        let runner = RecordingRunner::default();
        manager_with(&runner)
            .install("a", &InstallOptions::default())
            .unwrap()
            .uninstall("a")
            .unwrap();

        assert_eq!(runner.calls(), ["pip install a", "pip uninstall -y a"]);
    }

    #[test]
    fn test_is_installed_uses_exit_code() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "show", "missing"]);
        let manager = manager_with(&runner);

        assert!(manager.is_installed("present").unwrap());
        assert!(!manager.is_installed("missing").unwrap());
    }

    #[test]
    fn test_list_packages_strips_versions() {
        let runner = RecordingRunner {
            stdout: "requests==2.32.3\n# comment\nlocalpkg @ file:///src/localpkg\n\nurllib3==2.2.1\n"
                .to_string(),
            ..Default::default()
        };

        let packages = manager_with(&runner).list_packages().unwrap();
        assert_eq!(packages, ["requests", "localpkg", "urllib3"]);
    }

    #[test]
    fn test_with_packages_cleans_up_on_success() {
        let runner = RecordingRunner::default();
        let value = manager_with(&runner)
            .with_packages(["six"], &InstallOptions::default(), |_| Ok(42))
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(runner.calls(), ["pip install six", "pip uninstall -y six"]);
    }

    #[test]
    fn test_with_packages_cleans_up_on_failure() {
        let runner = RecordingRunner::default();
        let err = manager_with(&runner)
            .with_packages(["six"], &InstallOptions::default(), |_| {
                Err::<(), _>(Error::EmptyCommand)
            })
            .unwrap_err();

        assert!(matches!(err, Error::EmptyCommand));
        assert_eq!(runner.calls(), ["pip install six", "pip uninstall -y six"]);
    }

    #[test]
    fn test_with_packages_surfaces_both_failures() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "uninstall"]);

        let err = manager_with(&runner)
            .with_packages(["six"], &InstallOptions::default(), |_| {
                Err::<(), _>(Error::EmptyCommand)
            })
            .unwrap_err();

        match err {
            Error::Cleanup { primary, secondary } => {
                assert!(matches!(*primary, Error::EmptyCommand));
                assert_eq!(secondary.exit_code(), Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_with_packages_reports_cleanup_failure_after_success() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "uninstall"]);

        let err = manager_with(&runner)
            .with_packages(["six"], &InstallOptions::default(), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
