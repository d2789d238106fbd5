//! Locating interpreters outside of any managed environment

use std::fs;
use std::path::{Path, PathBuf};

use super::ISOLATION_MARKER;

const INTERPRETER_NAMES: [&str; 2] = ["python3", "python"];

/// True when a command token names the interpreter (`python`, `python3`, `python.exe`)
pub fn is_interpreter_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    let lower = lower.strip_suffix(".exe").unwrap_or(&lower);
    INTERPRETER_NAMES.contains(&lower)
}

/// The interpreter the caller's `PATH` resolves to, or the bare name when none is found
pub fn ambient_interpreter() -> PathBuf {
    INTERPRETER_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
        .unwrap_or_else(|| PathBuf::from(INTERPRETER_NAMES[0]))
}

/// The interpreter an isolated context was built from.
///
/// When the isolation marker points at an environment with a `pyvenv.cfg`, its `home`
/// key names the directory of the base installation. Otherwise this is the ambient
/// interpreter.
pub fn base_interpreter() -> PathBuf {
    std::env::var_os(ISOLATION_MARKER)
        .filter(|value| !value.is_empty())
        .and_then(|root| base_interpreter_for(Path::new(&root)))
        .unwrap_or_else(ambient_interpreter)
}

/// Resolve the base interpreter recorded in `<root>/pyvenv.cfg`
pub fn base_interpreter_for(root: &Path) -> Option<PathBuf> {
    let home = read_pyvenv_home(root)?;
    let suffix = if cfg!(windows) { ".exe" } else { "" };
    INTERPRETER_NAMES
        .iter()
        .map(|name| home.join(format!("{name}{suffix}")))
        .find(|candidate| candidate.is_file())
}

/// Read the `home = ...` entry of `<root>/pyvenv.cfg`
pub fn read_pyvenv_home(root: &Path) -> Option<PathBuf> {
    let contents = fs::read_to_string(root.join("pyvenv.cfg")).ok()?;
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if key.trim() != "home" {
            return None;
        }
        let home = PathBuf::from(value.trim());
        Some(if home.is_absolute() { home } else { root.join(home) })
    })
}
