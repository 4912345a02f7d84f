//! toolgate - validated, bounded tools over a stdio channel
//!
//! Exposes shell, file, SQLite and web capabilities as uniformly callable
//! tools. Every call flows through the same pipeline:
//!
//! - **Validation**: structural path and identifier checks, schema defaults
//! - **Execution**: bounded by a time budget and byte ceilings
//! - **Result**: one `Envelope`, success payload or typed error
//!
//! # Architecture
//!
//! - `tools`: registry, dispatcher, executor and the capability backends
//! - `config` / `cli`: file config, CLI flags, immutable server config
//! - `server`: newline-delimited JSON-RPC host channel

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use config::{ServerConfig, ServerInfo};
pub use errors::{ErrorKind, Result, ToolError};
pub use server::StdioServer;
pub use tools::{Envelope, ToolRuntime};
