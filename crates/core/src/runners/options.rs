use std::time::Duration;

/// Per-runner settings, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Show the last N output lines under the progress bar
    pub inline_output: Option<usize>,
    pub show_progress: bool,
    /// Upper bound on how long the progress loop waits for output before redrawing
    pub poll_interval: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            inline_output: None,
            show_progress: true,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl RunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inline_output(mut self, lines: usize) -> Self {
        self.inline_output = Some(lines);
        self
    }

    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
