use tracing::{info, warn};

use super::{InstallOptions, PackageManager};
use crate::error::{Error, Result};

/// Packages installed for the lifetime of this guard
///
/// [`finish`](TemporaryInstall::finish) uninstalls and reports failures. Dropping an
/// unfinished guard also uninstalls, logging failures instead.
#[must_use = "packages are uninstalled as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TemporaryInstall<'a> {
    manager: &'a PackageManager,
    packages: Vec<String>,
    active: bool,
}

impl<'a> TemporaryInstall<'a> {
    pub(super) fn acquire(
        manager: &'a PackageManager,
        packages: Vec<String>,
        options: &InstallOptions,
    ) -> Result<Self> {
        if packages.is_empty() {
            return Err(Error::NoPackages);
        }

        for (installed, package) in packages.iter().enumerate() {
            if let Err(e) = manager.install(package, options) {
                // leave the environment as we found it
                for previous in packages[..installed].iter().rev() {
                    if let Err(cleanup) = manager.uninstall(previous) {
                        warn!("Failed to roll back {}: {}", previous, cleanup);
                    }
                }
                return Err(e);
            }
        }

        info!("Temporarily installed {}", packages.join(", "));
        Ok(Self {
            manager,
            packages,
            active: true,
        })
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Uninstall now; every package is attempted and the first failure is returned
    pub fn finish(mut self) -> Result<()> {
        self.active = false;
        self.uninstall_all()
    }

    fn uninstall_all(&self) -> Result<()> {
        let mut first_error = None;
        for package in self.packages.iter().rev() {
            if let Err(e) = self.manager.uninstall(package) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for TemporaryInstall<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self.uninstall_all() {
            warn!("Failed to uninstall temporary packages {:?}: {}", self.packages, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::tests::{RecordingRunner, manager_with};

    #[test]
    fn test_requires_a_package() {
        let runner = RecordingRunner::default();
        let manager = manager_with(&runner);
        let err = manager
            .install_temporarily(Vec::<String>::new(), &InstallOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoPackages));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_drop_uninstalls() {
        let runner = RecordingRunner::default();
        let manager = manager_with(&runner);
        {
            let guard = manager
                .install_temporarily(["a", "b"], &InstallOptions::default())
                .unwrap();
            assert_eq!(guard.packages(), ["a", "b"]);
        }

        assert_eq!(
            runner.calls(),
            [
                "pip install a",
                "pip install b",
                "pip uninstall -y b",
                "pip uninstall -y a"
            ]
        );
    }

    #[test]
    fn test_finish_returns_uninstall_error_once() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "uninstall", "-y", "b"]);
        let manager = manager_with(&runner);

        let guard = manager
            .install_temporarily(["a", "b"], &InstallOptions::default())
            .unwrap();
        let err = guard.finish().unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
        // "a" is still attempted, and drop does not run a second pass
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn test_failed_install_rolls_back() {
        let runner = RecordingRunner::default();
        runner.fail_on(&["pip", "install", "b"]);
        let manager = manager_with(&runner);

        let err = manager
            .install_temporarily(["a", "b"], &InstallOptions::default())
            .unwrap_err();

        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(
            runner.calls(),
            ["pip install a", "pip install b", "pip uninstall -y a"]
        );
    }
}
