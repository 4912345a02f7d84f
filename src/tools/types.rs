//! Tool execution types and structures
//!
//! Core types shared by the registry, dispatcher and backends: parameter
//! specs, tool schemas, the per-runtime context, and validated arguments.

use crate::errors::{Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// Check a JSON value against this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Number => write!(f, "number"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::Array => write!(f, "array"),
            ParamType::Object => write!(f, "object"),
        }
    }
}

/// One entry of a tool's argument schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,

    /// Expected JSON type
    pub param_type: ParamType,

    /// Human-readable description
    pub description: String,

    /// Whether the caller must supply it
    pub required: bool,

    /// Value applied when the caller omits it
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Required parameter
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Optional parameter with no default
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Set a default value (implies optional)
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }
}

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Ordered parameter list
    pub params: Vec<ParamSpec>,

    /// Whether the tool only reads state (host-facing `readOnlyHint`)
    pub read_only: bool,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        read_only: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
            read_only,
        }
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema view used by the host catalog
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.to_string()));
            prop.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(json!(param.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Catalog entry: name, description, inputSchema, annotations
    pub fn catalog_entry(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
            "annotations": { "readOnlyHint": self.read_only },
        })
    }
}

/// Tool execution context with resource bounds
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative path tokens resolve against
    pub root: PathBuf,

    /// Upper bound accepted for a caller-supplied command timeout
    pub max_timeout: Duration,

    /// Ceiling on captured command output (stdout + stderr)
    pub max_output_size: usize,

    /// Ceiling on file reads
    pub max_read_size: u64,

    /// Ceiling on file writes
    pub max_write_size: usize,

    /// Budget for filesystem operations
    pub io_timeout: Duration,

    /// Budget for one database statement
    pub query_timeout: Duration,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_timeout: Duration::from_secs(300),
            max_output_size: 1_048_576, // 1MB
            max_read_size: 102_400,     // 100KB
            max_write_size: 10_485_760, // 10MB
            io_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl ToolContext {
    /// Create new tool context rooted at a directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set max accepted timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Set max output size
    pub fn with_max_output_size(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }

    /// Set max read size
    pub fn with_max_read_size(mut self, size: u64) -> Self {
        self.max_read_size = size;
        self
    }

    /// Set the database statement budget
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Resolve a token against the root
    pub fn resolve(&self, token: &str) -> PathBuf {
        self.root.join(Path::new(token))
    }
}

/// Argument bundle after defaults were applied and types checked
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Required string argument
    pub fn str(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ToolError::invalid(format!("{} must be a string", name))),
            None => Err(ToolError::MissingArgument {
                name: name.to_string(),
            }),
        }
    }

    /// Required non-negative integer argument
    pub fn u64(&self, name: &str) -> Result<u64> {
        match self.values.get(name) {
            Some(value) => value.as_u64().ok_or_else(|| {
                ToolError::invalid(format!("{} must be a non-negative integer", name))
            }),
            None => Err(ToolError::MissingArgument {
                name: name.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> ToolSchema {
        ToolSchema::new(
            "execute_command",
            "Execute a shell command",
            vec![
                ParamSpec::required("command", ParamType::String, "Shell command to execute"),
                ParamSpec::optional("working_dir", ParamType::String, "Working directory")
                    .with_default("."),
                ParamSpec::optional("timeout", ParamType::Integer, "Timeout in seconds")
                    .with_default(30),
            ],
            false,
        )
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::String.accepts(&json!("x")));
        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(!ParamType::Integer.accepts(&json!("3")));
        assert!(ParamType::Number.accepts(&json!(3.5)));
        assert!(ParamType::Boolean.accepts(&json!(false)));
        assert!(ParamType::Object.accepts(&json!({})));
        assert!(ParamType::Array.accepts(&json!([])));
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = sample_schema().input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["command"]["type"], "string");
        assert_eq!(schema["properties"]["working_dir"]["default"], ".");
        assert_eq!(schema["properties"]["timeout"]["default"], 30);
        assert_eq!(schema["required"], json!(["command"]));
    }

    #[test]
    fn test_catalog_entry_annotations() {
        let entry = sample_schema().catalog_entry();
        assert_eq!(entry["name"], "execute_command");
        assert_eq!(entry["annotations"], json!({"readOnlyHint": false}));

        let entry = ToolSchema::new("list_tables", "List", vec![], true).catalog_entry();
        assert_eq!(entry["annotations"]["readOnlyHint"], true);
    }

    #[test]
    fn test_schema_without_required_omits_field() {
        let schema = ToolSchema::new("get_environment", "Env", vec![], true);
        let value = schema.input_schema();
        assert!(value.get("required").is_none());
        assert_eq!(value["properties"], json!({}));
    }

    #[test]
    fn test_with_default_makes_optional() {
        let spec = ParamSpec::required("db_path", ParamType::String, "db").with_default("data.db");
        assert!(!spec.required);
        assert_eq!(spec.default, Some(json!("data.db")));
    }

    #[test]
    fn test_tool_context_builder() {
        let ctx = ToolContext::new("/srv/work")
            .with_max_timeout(Duration::from_secs(60))
            .with_max_output_size(1024)
            .with_max_read_size(2048);

        assert_eq!(ctx.max_timeout, Duration::from_secs(60));
        assert_eq!(ctx.max_output_size, 1024);
        assert_eq!(ctx.max_read_size, 2048);
        assert_eq!(ctx.resolve("a/b"), PathBuf::from("/srv/work/a/b"));
    }

    #[test]
    fn test_arguments_accessors() {
        let mut map = Map::new();
        map.insert("command".to_string(), json!("ls"));
        map.insert("timeout".to_string(), json!(5));
        let args = Arguments::new(map);

        assert_eq!(args.str("command").unwrap(), "ls");
        assert_eq!(args.u64("timeout").unwrap(), 5);
        assert!(matches!(
            args.str("missing"),
            Err(ToolError::MissingArgument { .. })
        ));
        assert!(matches!(
            args.str("timeout"),
            Err(ToolError::InvalidArgument(_))
        ));
    }
}
