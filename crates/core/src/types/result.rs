use serde::Serialize;

/// Normalized outcome of one command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// The logical command as the caller supplied it
    pub command: Vec<String>,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The command joined for display and error messages
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.as_deref().unwrap_or_default().lines()
    }
}
