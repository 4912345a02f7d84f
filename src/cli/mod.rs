//! CLI module for toolgate
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, LogFormat, Verbosity};
pub use config::Config;
