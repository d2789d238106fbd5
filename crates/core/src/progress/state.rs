use super::{OutputStream, estimator::estimate_progress};

const PULSE_STEP: u8 = 5;
const SNIPPET_WIDTH: usize = 50;
const FLAGGED_SNIPPET_WIDTH: usize = 45;

/// Whether the bar shows parsed completion or a synthetic liveness pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Indeterminate,
    Measured,
}

/// Progress of one invocation, fed line by line
#[derive(Debug, Clone)]
pub struct ProgressState {
    completed_fraction: f64,
    snippet: String,
    mode: ProgressMode,
    pulse: u8,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            completed_fraction: 0.0,
            snippet: String::new(),
            mode: ProgressMode::Indeterminate,
            pulse: 0,
        }
    }

    /// Feed one line of output
    pub fn observe(&mut self, line: &str, stream: OutputStream) {
        match estimate_progress(line) {
            Some(fraction) => {
                self.completed_fraction = fraction;
                self.mode = ProgressMode::Measured;
            }
            None => self.tick(),
        }

        let trimmed = line.trim();
        if let Some(label) = flag_label(trimmed) {
            self.snippet = format!("{label}: {}", truncate(trimmed, FLAGGED_SNIPPET_WIDTH));
        } else if stream == OutputStream::Stdout && !trimmed.is_empty() {
            self.snippet = truncate(trimmed, SNIPPET_WIDTH);
        }
    }

    /// Advance the liveness pulse; a no-op once a measured value was seen
    pub fn tick(&mut self) {
        if self.mode == ProgressMode::Indeterminate {
            self.pulse = (self.pulse + PULSE_STEP) % 100;
        }
    }

    /// Force completion and replace the snippet with the outcome
    pub fn finish(&mut self, exit_code: i32) {
        self.completed_fraction = 1.0;
        self.mode = ProgressMode::Measured;
        self.snippet = if exit_code == 0 {
            "Completed".to_string()
        } else {
            format!("Failed (code {exit_code})")
        };
    }

    /// Last measured fraction; pulses never show up here
    pub fn completed_fraction(&self) -> f64 {
        self.completed_fraction
    }

    /// Fraction to draw: measured completion, or the pulse position
    pub fn display_fraction(&self) -> f64 {
        match self.mode {
            ProgressMode::Measured => self.completed_fraction,
            ProgressMode::Indeterminate => f64::from(self.pulse) / 100.0,
        }
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }
}

fn flag_label(line: &str) -> Option<&'static str> {
    let lower = line.to_lowercase();
    if lower.contains("error") {
        Some("ERROR")
    } else if lower.contains("warning") {
        Some("WARNING")
    } else {
        None
    }
}

fn truncate(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
