//! Shared building blocks for the spotify-token workspace
//!
//! Secret handling (redacted wrapper, secret files, environment lookup) and
//! the configuration error type used by binaries.

mod env;
mod error;
mod secret;

pub use env::non_empty_var;
pub use error::{Error, Result};
pub use secret::{Secret, read_secret_file};
