//! Settings loaded from `envrunner.json` plus `ENVRUNNER_*` overrides

pub mod settings;

pub use settings::{CONFIG_FILE_NAMES, Settings};
