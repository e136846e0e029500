//! CLI library components for the catalog validator.

pub mod config;
pub mod logging;
