//! CLI command implementations

pub mod config;
pub mod gate;
pub mod library;
pub mod onboard;
