//! Result envelope
//!
//! Every call produces exactly one `Envelope`: a payload or an error,
//! never both.

use crate::errors::{ErrorKind, Result, ToolError};
use serde::Serialize;
use serde_json::{json, Value};

/// Uniform outcome of a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Ok { payload: Value },
    Err { kind: ErrorKind, message: String },
}

impl Envelope {
    pub fn ok(payload: Value) -> Self {
        Envelope::Ok { payload }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Envelope::Err {
            kind,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Ok { .. })
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Error kind, if this is an error envelope
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Ok { .. } => None,
            Envelope::Err { kind, .. } => Some(*kind),
        }
    }

    /// Payload, if this is a success envelope
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Envelope::Ok { payload } => Some(payload),
            Envelope::Err { .. } => None,
        }
    }

    /// JSON value handed to the caller.
    ///
    /// Success is the bare domain result; failure is
    /// `{"error": <message>, "kind": <kind>}`.
    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Ok { payload } => payload.clone(),
            Envelope::Err { kind, message } => json!({
                "error": message,
                "kind": kind,
            }),
        }
    }

    /// Serialized text payload for the host channel
    pub fn to_text(&self) -> String {
        // Serializing a `Value` cannot fail
        serde_json::to_string(&self.to_value()).unwrap_or_else(|_| {
            String::from(r#"{"error":"result encoding failed","kind":"backend_failure"}"#)
        })
    }
}

impl From<ToolError> for Envelope {
    fn from(err: ToolError) -> Self {
        Envelope::err(err.kind(), err.to_string())
    }
}

impl From<Result<Value>> for Envelope {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(payload) => Envelope::ok(payload),
            Err(err) => err.into(),
        }
    }
}
