//! Tool registry
//!
//! Maps a tool name to its schema and handler. Built once at startup, then
//! shared read-only (behind an `Arc`) by every dispatch.

use crate::errors::{Result, ToolError};
use crate::tools::types::{Arguments, ToolSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Capability behind a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with validated arguments
    async fn call(&self, args: &Arguments) -> Result<Value>;
}

/// Registered tool: schema plus handler
#[derive(Clone)]
pub struct ToolDescriptor {
    pub schema: ToolSchema,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(schema: ToolSchema, handler: Arc<dyn ToolHandler>) -> Self {
        Self { schema, handler }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Tool registry
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Descriptors in registration order
    tools: Vec<ToolDescriptor>,

    /// Name to position in `tools`
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; fails if the name is taken
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<()> {
        let name = descriptor.name().to_string();

        if self.index.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered { name });
        }

        debug!(tool = %name, "registering tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(descriptor);
        Ok(())
    }

    /// Get tool descriptor by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema.name.clone()).collect()
    }

    /// Host-facing catalog
    pub fn catalog(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.schema.catalog_entry()).collect()
    }

    /// Get total number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ParamSpec, ParamType};
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, args: &Arguments) -> Result<Value> {
            Ok(json!({ "text": args.str("text")? }))
        }
    }

    fn echo_tool(name: &str, read_only: bool) -> ToolDescriptor {
        ToolDescriptor::new(
            ToolSchema::new(
                name,
                "Echo text back",
                vec![ParamSpec::required("text", ParamType::String, "Text to echo")],
                read_only,
            ),
            Arc::new(Echo),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo", true)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert_eq!(registry.get("echo").unwrap().name(), "echo");
        assert!(registry.get("nonexistent_tool").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo", true)).unwrap();

        let result = registry.register(echo_tool("echo", false));
        assert!(matches!(result, Err(ToolError::AlreadyRegistered { .. })));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").unwrap().schema.read_only);
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(echo_tool(name, true)).unwrap();
        }

        assert_eq!(registry.tool_names(), vec!["zeta", "alpha", "mid"]);
        let catalog = registry.catalog();
        assert_eq!(catalog[1]["name"], "alpha");
        assert_eq!(catalog[1]["inputSchema"]["required"], json!(["text"]));
    }

    #[test]
    fn test_catalog_carries_read_only_hint() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("reader", true)).unwrap();
        registry.register(echo_tool("writer", false)).unwrap();

        let catalog = registry.catalog();
        assert_eq!(catalog[0]["annotations"]["readOnlyHint"], true);
        assert_eq!(catalog[1]["annotations"]["readOnlyHint"], false);
    }

    #[tokio::test]
    async fn test_handler_invocation() {
        let tool = echo_tool("echo", true);
        let mut map = serde_json::Map::new();
        map.insert("text".to_string(), json!("hi"));

        let value = tool.handler.call(&Arguments::new(map)).await.unwrap();
        assert_eq!(value, json!({"text": "hi"}));
    }
}
