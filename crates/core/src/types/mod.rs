pub mod options;
pub mod platform;
pub mod result;

// Re-export commonly used types
pub use options::{LaunchOptions, LaunchOverrides, RunOptions};
pub use platform::Platform;
pub use result::CommandResult;
