use std::path::{Path, PathBuf};
use std::process::Command;

use super::quote;
use crate::types::{LaunchOptions, Platform};

/// How a prepared command reaches the operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A composite line handed to a shell (`/bin/bash -c` or `cmd.exe /C`)
    Shell {
        shell: PathBuf,
        flag: &'static str,
        line: String,
        platform: Platform,
    },
    /// A program started directly with an argument vector
    Direct { program: PathBuf, args: Vec<String> },
}

/// A logical command translated for one environment, ready to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    logical: Vec<String>,
    invocation: Invocation,
    options: LaunchOptions,
}

impl PreparedCommand {
    pub fn new(logical: Vec<String>, invocation: Invocation, options: LaunchOptions) -> Self {
        Self {
            logical,
            invocation,
            options,
        }
    }

    /// Tokens as the caller wrote them
    pub fn logical(&self) -> &[String] {
        &self.logical
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn is_shell(&self) -> bool {
        matches!(self.invocation, Invocation::Shell { .. })
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.options.working_dir()
    }

    /// The shell line, or the direct argv rendered for a POSIX shell
    pub fn command_line(&self) -> String {
        match &self.invocation {
            Invocation::Shell { line, .. } => line.clone(),
            Invocation::Direct { program, args } => {
                let mut tokens = Vec::with_capacity(args.len() + 1);
                tokens.push(program.to_string_lossy().into_owned());
                tokens.extend(args.iter().cloned());
                quote::posix_join(&tokens)
            }
        }
    }

    /// Everything needed to reproduce the launch by hand
    pub fn to_shell_command(&self) -> String {
        match &self.invocation {
            Invocation::Shell {
                shell,
                flag,
                line,
                platform,
            } => {
                let quoted = match platform {
                    Platform::Posix => quote::posix_quote(line).into_owned(),
                    Platform::Windows => format!("\"{line}\""),
                };
                format!("{} {flag} {quoted}", shell.display())
            }
            Invocation::Direct { .. } => self.command_line(),
        }
    }

    /// Build the [`Command`] with working directory and extra variables applied
    pub fn to_command(&self) -> Command {
        let mut cmd = match &self.invocation {
            Invocation::Shell {
                shell,
                flag,
                line,
                platform,
            } => shell_command(shell, flag, line, *platform),
            Invocation::Direct { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        };

        if let Some(dir) = self.options.working_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.options.env {
            cmd.env(key, value);
        }
        cmd
    }
}

#[cfg(windows)]
fn shell_command(shell: &Path, flag: &str, line: &str, platform: Platform) -> Command {
    use std::os::windows::process::CommandExt;

    let mut cmd = Command::new(shell);
    match platform {
        // cmd.exe does its own parsing; /S strips exactly the outer quote pair
        Platform::Windows => {
            cmd.arg("/S").arg(flag).raw_arg(format!("\"{line}\""));
        }
        Platform::Posix => {
            cmd.arg(flag).arg(line);
        }
    }
    cmd
}

#[cfg(not(windows))]
fn shell_command(shell: &Path, flag: &str, line: &str, _platform: Platform) -> Command {
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(line);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LaunchOverrides, RunOptions};

    fn options(shell: bool) -> LaunchOptions {
        LaunchOptions::merge(
            LaunchOverrides {
                shell,
                executable: None,
            },
            &RunOptions::new().with_working_dir("/tmp").with_env("PIP_NO_INPUT", "1"),
        )
    }

    #[test]
    fn test_direct_command_line_quotes_arguments() {
        let prepared = PreparedCommand::new(
            vec!["echo".into(), "a b".into()],
            Invocation::Direct {
                program: PathBuf::from("/usr/bin/echo"),
                args: vec!["a b".into()],
            },
            options(false),
        );

        assert!(!prepared.is_shell());
        assert_eq!(prepared.command_line(), "/usr/bin/echo 'a b'");
        assert_eq!(prepared.to_shell_command(), prepared.command_line());
    }

    #[test]
    fn test_shell_command_wraps_line() {
        let prepared = PreparedCommand::new(
            vec!["pip".into(), "list".into()],
            Invocation::Shell {
                shell: PathBuf::from("/bin/bash"),
                flag: "-c",
                line: "source \"/e/bin/activate\" && pip list".into(),
                platform: Platform::Posix,
            },
            options(true),
        );

        assert!(prepared.is_shell());
        assert_eq!(
            prepared.to_shell_command(),
            "/bin/bash -c 'source \"/e/bin/activate\" && pip list'"
        );
    }

    #[test]
    fn test_to_command_applies_options() {
        let prepared = PreparedCommand::new(
            vec!["ls".into()],
            Invocation::Direct {
                program: PathBuf::from("ls"),
                args: vec!["-l".into()],
            },
            options(false),
        );

        let cmd = prepared.to_command();
        assert_eq!(cmd.get_program(), "ls");
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), ["-l"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp")));
        assert!(
            cmd.get_envs()
                .any(|(k, v)| k == "PIP_NO_INPUT" && v == Some(std::ffi::OsStr::new("1")))
        );
    }
}
