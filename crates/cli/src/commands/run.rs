use anyhow::{Context, Result};
use envrunner_core::EnvManager;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::load_settings;

/// Options of `envrunner run` after flag parsing
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub env: Option<PathBuf>,
    pub runner: Option<String>,
    pub check: bool,
    pub capture_output: bool,
    pub inline: Option<usize>,
    pub dry_run: bool,
    pub command: Vec<String>,
}

pub fn run_command(args: RunArgs) -> Result<()> {
    let settings = load_settings()?;
    let kind = args.runner.unwrap_or_else(|| settings.runner.clone());

    let mut run_options = settings.run_options();
    run_options.check = run_options.check && args.check;
    run_options.capture_output = run_options.capture_output && args.capture_output;

    let mut runner_options = settings.runner_options();
    if args.inline.is_some() {
        runner_options.inline_output = args.inline;
    }

    let manager = Arc::new(EnvManager::open(args.env.as_deref()));
    debug!(
        "Running {:?} in {} with the {} runner",
        args.command,
        manager.environment().name(),
        kind
    );

    if args.dry_run {
        let prepared = manager.prepare_command(&args.command, &run_options)?;
        println!("{}", prepared.to_shell_command());
        if let Some(dir) = prepared.working_dir() {
            println!("Working directory: {}", dir.display());
        }
        return Ok(());
    }

    let runner = manager
        .runner(&kind, &runner_options)
        .with_context(|| format!("Failed to create runner '{kind}'"))?;
    let result = runner.run(&args.command, &run_options)?;

    // captured output is replayed so the caller still sees it
    if let Some(stdout) = &result.stdout {
        std::io::stdout().write_all(stdout.as_bytes())?;
    }
    if let Some(stderr) = &result.stderr {
        std::io::stderr().write_all(stderr.as_bytes())?;
    }

    if !result.success() {
        info!("Exiting with child exit code {}", result.exit_code);
        std::io::stdout().flush()?;
        std::process::exit(result.exit_code);
    }
    Ok(())
}
