//! Tool dispatcher
//!
//! Per call: look up the descriptor, apply defaults, check required
//! arguments and types, run the handler, and fold whatever happens into
//! one `Envelope`.
//!
//! ```text
//! Received -> Validated -> Executing -> Completed
//! Received -> Rejected
//! Executing -> Aborted -> Completed (error envelope)
//! ```
//!
//! There is no retry state; every failure is terminal for its call.

use crate::errors::{ErrorKind, Result, ToolError};
use crate::tools::envelope::Envelope;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::{Arguments, ToolSchema};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Lifecycle phase of a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Received,
    Validated,
    Rejected,
    Executing,
    Aborted,
    Completed,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallPhase::Received => "received",
            CallPhase::Validated => "validated",
            CallPhase::Rejected => "rejected",
            CallPhase::Executing => "executing",
            CallPhase::Aborted => "aborted",
            CallPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Stateless dispatcher over a read-only registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch one call
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Envelope {
        let call_id = Uuid::new_v4();
        let span = info_span!("tool_call", %call_id, tool = %name);

        self.dispatch_inner(name, arguments).instrument(span).await
    }

    async fn dispatch_inner(&self, name: &str, arguments: Value) -> Envelope {
        let start = Instant::now();
        debug!(phase = %CallPhase::Received);

        let Some(descriptor) = self.registry.get(name) else {
            warn!(phase = %CallPhase::Rejected, "unknown tool");
            return ToolError::UnknownTool {
                name: name.to_string(),
            }
            .into();
        };

        let args = match prepare_arguments(&descriptor.schema, arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!(phase = %CallPhase::Rejected, error = %err, "argument validation failed");
                return err.into();
            }
        };
        debug!(phase = %CallPhase::Validated, args = args.len());

        debug!(phase = %CallPhase::Executing);
        let handler = descriptor.handler.clone();
        let task = tokio::spawn(async move { handler.call(&args).await }.in_current_span());

        let envelope: Envelope = match task.await {
            Ok(result) => result.into(),
            Err(join_err) => {
                ToolError::backend(format!("Tool execution error: {}", join_err)).into()
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match envelope.kind() {
            None => info!(phase = %CallPhase::Completed, elapsed_ms, "tool call succeeded"),
            Some(kind @ (ErrorKind::TimedOut | ErrorKind::Overflow)) => {
                warn!(phase = %CallPhase::Aborted, %kind, elapsed_ms, "tool call aborted on limit");
            }
            Some(kind) => {
                info!(phase = %CallPhase::Completed, %kind, elapsed_ms, "tool call failed");
            }
        }

        envelope
    }
}

/// Apply defaults, then check required arguments and types
pub fn prepare_arguments(schema: &ToolSchema, arguments: Value) -> Result<Arguments> {
    let mut values = match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::invalid(format!(
                "arguments must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    for param in &schema.params {
        // An explicit null counts as omitted
        if values.get(&param.name).map_or(true, Value::is_null) {
            values.remove(&param.name);
            match (&param.default, param.required) {
                (Some(default), _) => {
                    values.insert(param.name.clone(), default.clone());
                }
                (None, true) => {
                    return Err(ToolError::MissingArgument {
                        name: param.name.clone(),
                    })
                }
                (None, false) => continue,
            }
        }

        if let Some(value) = values.get(&param.name) {
            if !param.param_type.accepts(value) {
                return Err(ToolError::invalid(format!(
                    "{} must be of type {}, got {}",
                    param.name,
                    param.param_type,
                    json_type_name(value)
                )));
            }
        }
    }

    Ok(Arguments::new(values))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
