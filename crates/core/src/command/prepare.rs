use std::path::PathBuf;
use tracing::debug;

use super::invocation::{Invocation, PreparedCommand};
use super::quote;
use crate::environment::{Environment, interpreter};
use crate::error::{Error, Result};
use crate::types::{LaunchOptions, LaunchOverrides, Platform, RunOptions};

/// Translate `command` so that it runs inside `env`.
///
/// An isolated environment yields a shell composite that sources the activation
/// script first. Anything else resolves the program against `env.bin` and runs it
/// directly.
pub fn prepare_command(
    env: &Environment,
    command: &[String],
    options: &RunOptions,
) -> Result<PreparedCommand> {
    if command.is_empty() {
        return Err(Error::EmptyCommand);
    }

    let prepared = if env.is_isolated() {
        prepare_isolated(env, command, options)
    } else {
        prepare_direct(env, command, options)
    };

    debug!(
        "Prepared `{}` for {}: {}",
        command.join(" "),
        env.name(),
        prepared.to_shell_command()
    );
    Ok(prepared)
}

/// Prepare `command` for the caller's own context, ignoring any isolation.
///
/// The interpreter token maps to the base interpreter the active environment was
/// created from, so the command escapes it.
pub fn prepare_local(command: &[String], options: &RunOptions) -> Result<PreparedCommand> {
    let first = command.first().ok_or(Error::EmptyCommand)?;

    let program = if interpreter::is_interpreter_token(first) {
        interpreter::base_interpreter()
    } else {
        PathBuf::from(first)
    };
    let args = normalize_inline_code(command).split_off(1);

    let prepared = PreparedCommand::new(
        command.to_vec(),
        Invocation::Direct { program, args },
        LaunchOptions::merge(direct_overrides(), options),
    );
    debug!("Prepared local `{}`: {}", command.join(" "), prepared.command_line());
    Ok(prepared)
}

fn prepare_isolated(env: &Environment, command: &[String], options: &RunOptions) -> PreparedCommand {
    let platform = env.platform();
    let script = env
        .activation_script()
        .map(|script| script.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tokens = normalize_inline_code(command);

    let line = match platform {
        Platform::Posix => format!(
            "source {} && {}",
            quote::posix_double_quote(&script),
            quote::posix_join(&tokens)
        ),
        Platform::Windows => format!("\"{script}\" && {}", quote::cmd_join(&tokens)),
    };

    let (shell, flag) = platform.shell();
    let shell = PathBuf::from(shell);
    let overrides = LaunchOverrides {
        shell: true,
        executable: Some(shell.clone()),
    };

    PreparedCommand::new(
        command.to_vec(),
        Invocation::Shell {
            shell,
            flag,
            line,
            platform,
        },
        LaunchOptions::merge(overrides, options),
    )
}

fn prepare_direct(env: &Environment, command: &[String], options: &RunOptions) -> PreparedCommand {
    let first = &command[0];
    let program = if interpreter::is_interpreter_token(first) {
        let own = env.interpreter();
        if own.is_file() {
            own.to_path_buf()
        } else {
            interpreter::ambient_interpreter()
        }
    } else {
        env.find_executable(first)
            .unwrap_or_else(|| PathBuf::from(first))
    };
    let args = normalize_inline_code(command).split_off(1);

    PreparedCommand::new(
        command.to_vec(),
        Invocation::Direct { program, args },
        LaunchOptions::merge(direct_overrides(), options),
    )
}

fn direct_overrides() -> LaunchOverrides {
    LaunchOverrides {
        shell: false,
        executable: None,
    }
}

/// `python -c print ( 1 )` becomes `python -c "print ( 1 )"`: the code after `-c`
/// is one argument, however the caller split it.
fn normalize_inline_code(command: &[String]) -> Vec<String> {
    match command {
        [interp, flag, code @ ..]
            if flag == "-c" && !code.is_empty() && interpreter::is_interpreter_token(interp) =>
        {
            vec![interp.clone(), flag.clone(), code.join(" ")]
        }
        _ => command.to_vec(),
    }
}
