//! Shared runtime plumbing for the binaries: logging setup and environment checks.

pub mod env;
pub mod utils;
