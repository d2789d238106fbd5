//! envrunner - Run commands inside isolated Python environments
//!
//! Facade over [`envrunner_core`]; see that crate for the full API.
pub use envrunner_core::*;
