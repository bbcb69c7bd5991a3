//! Shared utilities.
//!
//! Relative path handling and test helpers.

pub mod path;

#[cfg(all(test, unix))]
pub mod testutil;
