//! Shared error helpers and small utilities used across all mentionbot crates.

pub mod error;
pub mod secret;

pub use error::{Error, FromMessage, Result};
