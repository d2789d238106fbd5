use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::VecDeque;
use std::fmt;

use super::ProgressState;

const BAR_LENGTH: u64 = 100;
const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix:.bold} [{bar:40.cyan/blue}] {percent:>3}% [{elapsed_precise}] {msg}";

/// Terminal rendering of a [`ProgressState`]
///
/// Drawn on stderr; indicatif keeps it invisible when stderr is not a terminal.
pub struct ProgressDisplay {
    bar: ProgressBar,
    recent: Option<RecentLines>,
}

impl fmt::Debug for ProgressDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressDisplay")
            .field("position", &self.bar.position())
            .field("recent", &self.recent)
            .finish()
    }
}

impl ProgressDisplay {
    pub fn new(title: &str, show_progress: bool, inline_output: Option<usize>) -> Self {
        let target = if show_progress {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(BAR_LENGTH), target);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix(title.to_string());

        Self {
            bar,
            recent: inline_output
                .filter(|&capacity| capacity > 0)
                .map(RecentLines::new),
        }
    }

    pub fn hidden() -> Self {
        Self::new("", false, None)
    }

    /// Remember `line` for the inline output block
    pub fn push_line(&mut self, line: &str) {
        if let Some(recent) = self.recent.as_mut() {
            recent.push(line);
        }
    }

    pub fn update(&self, state: &ProgressState) {
        self.bar.set_position(to_position(state.display_fraction()));
        self.bar.set_message(self.message(state.snippet()));
    }

    pub fn finish(&self, state: &ProgressState) {
        self.bar.set_position(to_position(state.display_fraction()));
        self.bar.finish_with_message(self.message(state.snippet()));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self, snippet: &str) -> String {
        match &self.recent {
            Some(recent) if !recent.is_empty() => format!("{snippet}\n{}", recent.render()),
            _ => snippet.to_string(),
        }
    }
}

fn to_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

/// The last N lines of output
#[derive(Debug, Clone)]
struct RecentLines {
    capacity: usize,
    lines: VecDeque<String>,
}

impl RecentLines {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.trim_end().to_string());
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
