//! nam-inspect library - training metadata inspection for `.nam` artifacts
//!
//! Command logic lives here so it can be exercised without spawning the
//! binary.

pub mod commands;

pub use commands::{Outcome, EXIT_ERROR};
