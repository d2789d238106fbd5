//! Directory-rooted execution contexts
//!
//! An [`Environment`] only describes a layout; creating one on disk is the job of an
//! [`EnvBuilder`](builder::EnvBuilder), and installing it into the process is the job of
//! the lifecycle manager.

pub mod builder;
pub mod interpreter;

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::types::Platform;

pub use builder::{EnvBuilder, VenvBuilder};

/// Variable child processes check to know an isolated context is active
pub const ISOLATION_MARKER: &str = "VIRTUAL_ENV";

/// Name reported for the ambient (root-less) context
pub const AMBIENT_NAME: &str = "system";

static POSIX_SYSTEM_ROOTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^/usr(/local)?/?$",
        r"^/usr(/local)?/bin/?$",
        r"^/opt/homebrew(/bin)?/?$",
        r"/Library/Frameworks/Python\.framework",
        r"/(ana|mini)conda3?(/bin)?/?$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static WINDOWS_SYSTEM_ROOTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\\Python\d+\\?$",
        r"(?i)AppData\\Local\\Programs\\Python\\Python\d+",
        r"(?i)\\(Ana|Mini)conda3\\?$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Immutable descriptor of an execution context's directory layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    name: String,
    root: Option<PathBuf>,
    bin: Option<PathBuf>,
    lib: Option<PathBuf>,
    interpreter: PathBuf,
    platform: Platform,
}

impl Environment {
    /// Describe the environment rooted at `root`.
    ///
    /// Without a root, the isolation marker of the current process is used when set,
    /// otherwise the result is the ambient context.
    pub fn new(root: Option<&Path>) -> Self {
        Self::with_platform(root, Platform::current())
    }

    pub fn with_platform(root: Option<&Path>, platform: Platform) -> Self {
        let root = root.map(Path::to_path_buf).or_else(|| {
            std::env::var_os(ISOLATION_MARKER)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        match root {
            Some(root) => Self::rooted(absolutize(&root), platform),
            None => Self::ambient_with_platform(platform),
        }
    }

    /// The caller's own context: no root, ambient interpreter
    pub fn ambient() -> Self {
        Self::ambient_with_platform(Platform::current())
    }

    fn ambient_with_platform(platform: Platform) -> Self {
        Self {
            name: AMBIENT_NAME.to_string(),
            root: None,
            bin: None,
            lib: None,
            interpreter: interpreter::ambient_interpreter(),
            platform,
        }
    }

    fn rooted(root: PathBuf, platform: Platform) -> Self {
        let bin = root.join(platform.bin_dir());
        let lib = root.join(platform.lib_dir());
        let interpreter = bin.join(platform.interpreter_file());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        Self {
            name,
            root: Some(root),
            bin: Some(bin),
            lib: Some(lib),
            interpreter,
            platform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn bin(&self) -> Option<&Path> {
        self.bin.as_deref()
    }

    pub fn lib(&self) -> Option<&Path> {
        self.lib.as_deref()
    }

    /// Interpreter inside `bin`, or the ambient interpreter for a root-less context
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn activation_script(&self) -> Option<PathBuf> {
        self.bin
            .as_ref()
            .map(|bin| bin.join(self.platform.activation_script()))
    }

    /// True when a root is set and its activation script exists
    pub fn is_isolated(&self) -> bool {
        self.activation_script().is_some_and(|script| script.is_file())
    }

    /// True when the root points at a system-wide interpreter installation
    /// (`/usr`, Homebrew, Conda, `C:\Python312`, ...) rather than a private context.
    pub fn is_system_location(&self) -> bool {
        let Some(root) = self.root.as_deref() else {
            return true;
        };
        let text = root.to_string_lossy();
        let patterns = match self.platform {
            Platform::Posix => &*POSIX_SYSTEM_ROOTS,
            Platform::Windows => &*WINDOWS_SYSTEM_ROOTS,
        };
        patterns.iter().any(|pattern| pattern.is_match(&text))
    }

    /// Look for `name` (plus the platform executable suffix) inside `bin`
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let candidate = self
            .bin
            .as_ref()?
            .join(format!("{name}{}", self.platform.exe_suffix()));
        candidate.is_file().then_some(candidate)
    }

    /// Identity used by the activation slot
    pub(crate) fn identity(&self) -> String {
        match &self.root {
            Some(root) => root.display().to_string(),
            None => AMBIENT_NAME.to_string(),
        }
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
