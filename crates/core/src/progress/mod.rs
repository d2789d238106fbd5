//! Progress inferred from unstructured subprocess output

pub mod display;
pub mod estimator;
pub mod state;

pub use display::ProgressDisplay;
pub use estimator::estimate_progress;
pub use state::{ProgressMode, ProgressState};

/// Which pipe a line arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}
