//! Execution helpers shared by all runners

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    command::PreparedCommand,
    error::{Error, Result},
    lifecycle::EnvManager,
    types::CommandResult,
};

/// Where one `run` call is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
    NotStarted,
    Preparing,
    Launched,
    Reading,
    Completed,
    Failed,
}

/// Records phase transitions at debug level
#[derive(Debug)]
pub struct PhaseTracker {
    runner: &'static str,
    phase: InvocationPhase,
}

impl PhaseTracker {
    pub fn new(runner: &'static str) -> Self {
        Self {
            runner,
            phase: InvocationPhase::NotStarted,
        }
    }

    pub fn advance(&mut self, next: InvocationPhase) {
        debug!("{} runner: {:?} -> {:?}", self.runner, self.phase, next);
        self.phase = next;
    }

    pub fn phase(&self) -> InvocationPhase {
        self.phase
    }

    /// Mark the invocation failed and hand back `err`
    pub fn fail(&mut self, err: Error) -> Error {
        self.advance(InvocationPhase::Failed);
        err
    }
}

pub fn require_manager<'a>(
    runner: &'static str,
    manager: Option<&'a Arc<EnvManager>>,
) -> Result<&'a Arc<EnvManager>> {
    manager.ok_or(Error::RunnerNotBound { runner })
}

/// Launch `prepared` and block until it exits
pub fn execute_blocking(
    prepared: &PreparedCommand,
    tracker: &mut PhaseTracker,
) -> Result<CommandResult> {
    let options = prepared.options();
    let mut cmd = prepared.to_command();

    let (status, stdout, stderr) = if options.capture_output {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracker.advance(InvocationPhase::Launched);
        let output = cmd
            .output()
            .map_err(|source| tracker.fail(launch_error(prepared, source)))?;
        (
            output.status,
            Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        )
    } else {
        tracker.advance(InvocationPhase::Launched);
        let status = cmd
            .status()
            .map_err(|source| tracker.fail(launch_error(prepared, source)))?;
        (status, None, None)
    };

    tracker.advance(InvocationPhase::Completed);
    let result = CommandResult {
        command: prepared.logical().to_vec(),
        exit_code: exit_code(status),
        stdout,
        stderr,
    };
    finish(result, options.check)
}

pub fn launch_error(prepared: &PreparedCommand, source: std::io::Error) -> Error {
    Error::Launch {
        command: prepared.command_line(),
        source,
    }
}

/// Exit code of a finished child; signals map to `128 + signal` on unix
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Apply the failure policy to a finished command
pub fn finish(result: CommandResult, check: bool) -> Result<CommandResult> {
    let command = result.command_line();

    if result.success() {
        info!("Command succeeded: {}", command);
        if let Some(stdout) = result.stdout.as_deref().filter(|s| !s.trim().is_empty()) {
            debug!("stdout:\n{}", stdout.trim_end());
        }
        return Ok(result);
    }

    if !check {
        info!("Command exited with code {}: {}", result.exit_code, command);
        return Ok(result);
    }

    error!("Command failed with exit code {}: {}", result.exit_code, command);
    if let Some(stdout) = result.stdout.as_deref().filter(|s| !s.trim().is_empty()) {
        error!("stdout:\n{}", stdout.trim_end());
    }
    if let Some(stderr) = result.stderr.as_deref().filter(|s| !s.trim().is_empty()) {
        error!("stderr:\n{}", stderr.trim_end());
    }

    Err(Error::CommandFailed {
        command,
        exit_code: result.exit_code,
        stdout: result.stdout,
        stderr: result.stderr,
    })
}
