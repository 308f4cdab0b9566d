//! CLI library components for baselab.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
