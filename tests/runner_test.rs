//! End-to-end runner tests against a real shell

use envrunner::{
    EnvBuilder, EnvManager, Error, Result, RunOptions, RunnerOptions, RunnerRegistry, to_tokens,
};
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct FakeVenv;

impl EnvBuilder for FakeVenv {
    fn create(&self, root: &Path, _clear: bool) -> Result<()> {
        fs::create_dir_all(root.join("bin"))?;
        fs::write(root.join("bin/activate"), "export FAKE_VENV_ACTIVE=yes\n")?;
        Ok(())
    }
}

fn quiet() -> RunnerOptions {
    RunnerOptions::new()
        .with_show_progress(false)
        .with_poll_interval(Duration::from_millis(5))
}

#[test]
fn test_registry_rejects_unknown_kind() {
    let registry = RunnerRegistry::new();
    let err = registry.create("bogus", &quiet()).err().unwrap();
    assert!(matches!(err, Error::UnknownRunnerKind { .. }));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_strict_and_non_strict_exit_codes() {
    for kind in ["standard", "progress", "local"] {
        let manager = Arc::new(EnvManager::open(None));
        let runner = manager.runner(kind, &quiet()).unwrap();

        let ok = runner
            .run(&to_tokens(["sh", "-c", "exit 0"]), &RunOptions::default())
            .unwrap();
        assert_eq!(ok.exit_code, 0, "{kind}");

        let err = runner
            .run(&to_tokens(["sh", "-c", "exit 3"]), &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { exit_code: 3, .. }), "{kind}");

        let kept = runner
            .run(&to_tokens(["sh", "-c", "exit 3"]), &RunOptions::new().non_strict())
            .unwrap();
        assert_eq!(kept.exit_code, 3, "{kind}");
    }
}

#[cfg(unix)]
#[test]
#[serial]
fn test_isolated_command_sources_activation_script() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(
        EnvManager::new(Some(&temp.path().join("app")), false, Some(&FakeVenv)).unwrap(),
    );

    for kind in ["standard", "progress"] {
        let result = manager
            .runner(kind, &quiet())
            .unwrap()
            .run(
                &to_tokens(["sh", "-c", "echo \"$FAKE_VENV_ACTIVE\""]),
                &RunOptions::default(),
            )
            .unwrap();
        assert_eq!(result.stdout.as_deref(), Some("yes\n"), "{kind}");
    }
}

#[cfg(unix)]
#[test]
#[serial]
fn test_working_dir_and_extra_env() {
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(EnvManager::open(None));
    let options = RunOptions::new()
        .with_working_dir(temp.path())
        .with_env("ENVRUNNER_TEST_VALUE", "42");

    let result = manager
        .runner("standard", &quiet())
        .unwrap()
        .run(
            &to_tokens(["sh", "-c", "echo $ENVRUNNER_TEST_VALUE; ls"]),
            &options,
        )
        .unwrap();

    assert_eq!(result.stdout.as_deref(), Some("42\n"));
}

#[cfg(windows)]
struct FakeWindowsVenv;

#[cfg(windows)]
impl EnvBuilder for FakeWindowsVenv {
    fn create(&self, root: &Path, _clear: bool) -> Result<()> {
        fs::create_dir_all(root.join("Scripts"))?;
        fs::write(root.join("Scripts").join("activate.bat"), "@set FAKE_VENV_ACTIVE=yes\r\n")?;
        Ok(())
    }
}

#[cfg(windows)]
#[test]
#[serial]
fn test_cmd_composite_keeps_quoted_code_intact() {
    let has_python = std::process::Command::new("python")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success());
    if !has_python {
        return;
    }
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(
        EnvManager::new(Some(&temp.path().join("app")), false, Some(&FakeWindowsVenv)).unwrap(),
    );

    let result = manager
        .runner("standard", &quiet())
        .unwrap()
        .run(
            &to_tokens(["python", "-c", r#"print("a & b > c | d")"#]),
            &RunOptions::default(),
        )
        .unwrap();

    assert_eq!(result.stdout.as_deref().map(str::trim_end), Some("a & b > c | d"));
}
