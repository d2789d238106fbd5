//! Execution strategies and the registry that constructs them

pub mod common;
pub mod local_runner;
pub mod options;
pub mod progress_runner;
pub mod registry;
pub mod standard_runner;
pub mod traits;

pub use local_runner::LocalRunner;
pub use options::RunnerOptions;
pub use progress_runner::ProgressRunner;
pub use registry::{RunnerConstructor, RunnerRegistry, RunnerRegistryBuilder};
pub use standard_runner::StandardRunner;
pub use traits::Runner;
