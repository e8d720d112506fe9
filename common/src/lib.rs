//! Shared infrastructure for the harmonization workspace.

pub mod log_setup;
pub mod parallel;
