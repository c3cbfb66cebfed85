//! CLI command implementations.

pub mod common;
pub mod config;
pub mod freq;
pub mod measure;
pub mod program;
