//! Tool execution system
//!
//! Provides validated, bounded tool execution with:
//! - 14 tools across three groups (shell, sqlite, web)
//! - Structural path and identifier validation
//! - Bounded executor (time budget, byte ceilings, process-group kill)
//! - Registry + dispatcher folding every outcome into one envelope
//! - Tool runtime coordinator

pub mod dispatcher;
pub mod envelope;
pub mod executor;
pub mod implementations;
pub mod registry;
pub mod runtime;
pub mod security;
pub mod types;

// Re-export commonly used types
pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use implementations::ToolGroup;
pub use registry::{ToolDescriptor, ToolHandler, ToolRegistry};
pub use runtime::ToolRuntime;
pub use security::{validate_identifier, validate_path};
pub use types::{Arguments, ParamSpec, ParamType, ToolContext, ToolSchema};
