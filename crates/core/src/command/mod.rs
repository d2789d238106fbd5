//! Command preparation: logical tokens in, launchable invocation out

pub mod invocation;
pub mod prepare;
pub mod quote;

pub use invocation::{Invocation, PreparedCommand};
pub use prepare::{prepare_command, prepare_local};

/// Collect string-like tokens into an owned command
pub fn to_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tokens.into_iter().map(Into::into).collect()
}
