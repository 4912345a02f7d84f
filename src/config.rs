//! Immutable server configuration
//!
//! Built once at startup from the file-level `cli::Config` plus the
//! environment, then handed to the runtime. Nothing mutates it afterwards.

use crate::cli::Config;
use crate::errors::Result;
use crate::tools::implementations::{ToolGroup, WebOptions};
use crate::tools::types::ToolContext;
use serde::Serialize;
use std::time::Duration;

/// Environment variable holding the Brave search credential
pub const BRAVE_API_KEY_ENV: &str = "BRAVE_API_KEY";

/// Name and version reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Everything the runtime needs, resolved
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub info: ServerInfo,
    pub groups: Vec<ToolGroup>,
    pub context: ToolContext,
    pub default_timeout: u64,
    pub default_db: String,
    pub web: WebOptions,
}

impl ServerConfig {
    /// Resolve a validated file config, reading the credential from the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let brave_api_key = std::env::var(BRAVE_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::with_credential(config, brave_api_key)
    }

    /// Resolve a file config with an explicit credential
    pub fn with_credential(config: &Config, brave_api_key: Option<String>) -> Result<Self> {
        config.validate()?;

        let tools = &config.tools;
        let context = ToolContext {
            root: Config::expand_path(&tools.root_dir),
            max_timeout: Duration::from_secs(tools.max_timeout_sec),
            max_output_size: tools.max_output_bytes,
            max_read_size: tools.max_read_bytes,
            max_write_size: tools.max_write_bytes,
            io_timeout: Duration::from_secs(tools.io_timeout_sec),
            query_timeout: Duration::from_secs(config.storage.query_timeout_sec),
        };

        let web = WebOptions {
            duckduckgo_url: config.web.duckduckgo_url.clone(),
            brave_url: config.web.brave_url.clone(),
            brave_api_key,
            region: config.web.region.clone(),
            user_agent: config.web.user_agent.clone(),
            request_timeout: Duration::from_secs(config.web.request_timeout_sec),
            max_fetch_bytes: config.web.max_fetch_bytes,
        };

        Ok(Self {
            info: ServerInfo::new(&config.server.name, env!("CARGO_PKG_VERSION")),
            groups: config.enabled_groups()?,
            context,
            default_timeout: tools.default_timeout_sec,
            default_db: config.storage.default_db.clone(),
            web,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let server = ServerConfig::with_credential(&Config::default(), None).unwrap();

        assert_eq!(server.info.name, "toolgate");
        assert_eq!(server.groups, ToolGroup::ALL.to_vec());
        assert_eq!(server.default_timeout, 30);
        assert_eq!(server.default_db, "data.db");
        assert_eq!(server.context.max_read_size, 102_400);
        assert!(server.web.brave_api_key.is_none());
    }

    #[test]
    fn test_credential_is_captured() {
        let server =
            ServerConfig::with_credential(&Config::default(), Some("secret".to_string())).unwrap();
        assert_eq!(server.web.brave_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.tools.max_read_bytes = 0;
        assert!(ServerConfig::with_credential(&config, None).is_err());
    }
}
