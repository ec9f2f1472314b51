//! Shared error and logging utilities.

pub mod error;
pub mod logging;
