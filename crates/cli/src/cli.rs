use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    RunArgs, create_command, pkg_command, remove_command, run_command, runners_command,
};

#[derive(Parser, Debug)]
#[command(name = "envrunner")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a virtual environment
    #[command(visible_alias = "c")]
    Create {
        /// Directory of the new environment
        path: PathBuf,

        /// Delete the contents of an existing environment first
        #[arg(long)]
        clear: bool,

        /// Skip installing pip into the environment
        #[arg(long)]
        without_pip: bool,

        /// Interpreter used to create the environment
        #[arg(long)]
        python: Option<PathBuf>,
    },
    /// Run a command inside an environment
    #[command(visible_alias = "r")]
    Run {
        /// Environment directory (defaults to $VIRTUAL_ENV, then the system interpreter)
        #[arg(short, long)]
        env: Option<PathBuf>,

        /// Runner kind (standard, progress, local, ...)
        #[arg(short, long)]
        runner: Option<String>,

        /// Return the child's exit code instead of failing on non-zero exits
        #[arg(long)]
        no_check: bool,

        /// Let the child write straight to the terminal
        #[arg(long)]
        no_capture: bool,

        /// Show the last N output lines under the progress bar
        #[arg(long, value_name = "N")]
        inline: Option<usize>,

        /// Print the prepared command without executing it
        #[arg(short, long)]
        dry_run: bool,

        /// Command and arguments
        #[arg(last = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Delete an environment directory
    Remove {
        /// Environment directory
        path: PathBuf,
    },
    /// List registered runner kinds
    Runners {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage packages inside an environment
    Pkg {
        /// Environment directory
        path: PathBuf,

        #[command(subcommand)]
        action: PkgAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PkgAction {
    /// Install packages
    Install {
        #[arg(required = true)]
        packages: Vec<String>,

        /// Extra option passed to pip (repeatable)
        #[arg(long = "pip-option", allow_hyphen_values = true)]
        pip_options: Vec<String>,
    },
    /// Uninstall packages
    Uninstall {
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// List installed packages
    List,
    /// Exit 0 when a package is installed, 1 otherwise
    Check { package: String },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Create {
                path,
                clear,
                without_pip,
                python,
            } => create_command(&path, clear, without_pip, python.as_deref()),
            Commands::Run {
                env,
                runner,
                no_check,
                no_capture,
                inline,
                dry_run,
                command,
            } => run_command(RunArgs {
                env,
                runner,
                check: !no_check,
                capture_output: !no_capture,
                inline,
                dry_run,
                command,
            }),
            Commands::Remove { path } => remove_command(&path),
            Commands::Runners { json } => runners_command(json),
            Commands::Pkg { path, action } => pkg_command(&path, action),
        }
    }
}
