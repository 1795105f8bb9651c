//! Integration tests for command execution
//!
//! These tests spawn real programs through both launchers and check exit
//! codes, captured bytes, input feeding and resource cleanup end to end.

#[cfg(unix)]
pub mod cli;
#[cfg(unix)]
pub mod fallback;
pub mod helpers;
