use serde::Serialize;

/// Process execution model an environment layout is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// `bin/`, `lib/`, `bin/activate`, sourced through `/bin/bash`
    Posix,
    /// `Scripts\`, `Lib\`, `Scripts\activate.bat`, run through `cmd.exe`
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    pub fn bin_dir(self) -> &'static str {
        match self {
            Platform::Posix => "bin",
            Platform::Windows => "Scripts",
        }
    }

    pub fn lib_dir(self) -> &'static str {
        match self {
            Platform::Posix => "lib",
            Platform::Windows => "Lib",
        }
    }

    pub fn activation_script(self) -> &'static str {
        match self {
            Platform::Posix => "activate",
            Platform::Windows => "activate.bat",
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Posix => "",
            Platform::Windows => ".exe",
        }
    }

    pub fn interpreter_file(self) -> &'static str {
        match self {
            Platform::Posix => "python",
            Platform::Windows => "python.exe",
        }
    }

    /// Shell used to run activation composites, with its "run this string" flag
    pub fn shell(self) -> (&'static str, &'static str) {
        match self {
            Platform::Posix => ("/bin/bash", "-c"),
            Platform::Windows => ("cmd.exe", "/C"),
        }
    }
}
