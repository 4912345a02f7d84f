//! Tool runtime coordinator
//!
//! Builds the registry for the enabled tool groups from a `ServerConfig`
//! and owns the dispatcher. Everything here is immutable once built.

use crate::config::{ServerConfig, ServerInfo};
use crate::errors::Result;
use crate::tools::dispatcher::Dispatcher;
use crate::tools::envelope::Envelope;
use crate::tools::implementations::{self, ToolGroup, WebBackend};
use crate::tools::registry::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Tool runtime coordinator
#[derive(Debug, Clone)]
pub struct ToolRuntime {
    info: Arc<ServerInfo>,
    dispatcher: Dispatcher,
}

impl ToolRuntime {
    /// Build the registry for every enabled group
    pub fn new(config: ServerConfig) -> Result<Self> {
        let info = Arc::new(config.info);
        let context = Arc::new(config.context);
        let mut registry = ToolRegistry::new();

        for group in &config.groups {
            let descriptors = match group {
                ToolGroup::Shell => {
                    implementations::shell_tools(context.clone(), info.clone(), config.default_timeout)
                }
                ToolGroup::Sqlite => implementations::sqlite_tools(context.clone(), &config.default_db),
                ToolGroup::Web => {
                    implementations::web_tools(Arc::new(WebBackend::new(config.web.clone())?))
                }
            };

            for descriptor in descriptors {
                registry.register(descriptor)?;
            }
        }

        info!(
            server = %info.name,
            tools = registry.len(),
            root = %context.root.display(),
            "tool runtime ready"
        );

        Ok(Self {
            info,
            dispatcher: Dispatcher::new(Arc::new(registry)),
        })
    }

    /// Execute one tool call
    pub async fn execute(&self, tool: &str, args: Value) -> Envelope {
        self.dispatcher.dispatch(tool, args).await
    }

    /// Server identity
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get tool registry
    pub fn get_registry(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    /// Host-facing catalog
    pub fn catalog(&self) -> Vec<Value> {
        self.get_registry().catalog()
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.get_registry().tool_names()
    }

    /// Check if tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.get_registry().contains(name)
    }
}
