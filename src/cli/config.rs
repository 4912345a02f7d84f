//! Configuration management for toolgate
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.toolgate/config.toml

use crate::errors::{Result, ToolError};
use crate::tools::implementations::web::{BRAVE_API_URL, DEFAULT_USER_AGENT, DUCKDUCKGO_URL};
use crate::tools::implementations::ToolGroup;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Complete configuration for toolgate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub tools: ToolsConfig,
    pub storage: StorageConfig,
    pub web: WebConfig,
}

/// Host-facing identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub name: String,
}

/// Tool execution configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub root_dir: String,
    pub enabled: Vec<String>,
    pub default_timeout_sec: u64,
    pub max_timeout_sec: u64,
    pub io_timeout_sec: u64,
    pub max_output_bytes: usize,
    pub max_read_bytes: u64,
    pub max_write_bytes: usize,
}

/// SQLite backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub default_db: String,
    pub query_timeout_sec: u64,
}

/// Web backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub duckduckgo_url: String,
    pub brave_url: String,
    pub region: String,
    pub user_agent: String,
    pub request_timeout_sec: u64,
    pub max_fetch_bytes: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: "toolgate".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
            enabled: ToolGroup::ALL.iter().map(|g| g.to_string()).collect(),
            default_timeout_sec: 30,
            max_timeout_sec: 300,
            io_timeout_sec: 10,
            max_output_bytes: 1_048_576,
            max_read_bytes: 102_400,
            max_write_bytes: 10_485_760,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_db: "data.db".to_string(),
            query_timeout_sec: 30,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            duckduckgo_url: DUCKDUCKGO_URL.to_string(),
            brave_url: BRAVE_API_URL.to_string(),
            region: "uk-en".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_sec: 10,
            max_fetch_bytes: 2_097_152,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ToolError::ConfigError(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".toolgate").join("config.toml"))
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, root: Option<&Path>, tools: Option<&[String]>) {
        if let Some(root) = root {
            self.tools.root_dir = root.display().to_string();
        }
        if let Some(groups) = tools {
            self.tools.enabled = groups.to_vec();
        }
    }

    /// Enabled groups, parsed and deduplicated in declaration order
    pub fn enabled_groups(&self) -> Result<Vec<ToolGroup>> {
        let mut groups = Vec::new();
        for name in &self.tools.enabled {
            let group: ToolGroup = name.parse()?;
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(ToolError::ConfigError("server.name cannot be empty".to_string()));
        }

        let tools = &self.tools;
        let limits = [
            ("tools.default_timeout_sec", tools.default_timeout_sec),
            ("tools.max_timeout_sec", tools.max_timeout_sec),
            ("tools.io_timeout_sec", tools.io_timeout_sec),
            ("tools.max_output_bytes", tools.max_output_bytes as u64),
            ("tools.max_read_bytes", tools.max_read_bytes),
            ("tools.max_write_bytes", tools.max_write_bytes as u64),
            ("storage.query_timeout_sec", self.storage.query_timeout_sec),
            ("web.request_timeout_sec", self.web.request_timeout_sec),
            ("web.max_fetch_bytes", self.web.max_fetch_bytes),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ToolError::ConfigError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if tools.default_timeout_sec > tools.max_timeout_sec {
            return Err(ToolError::ConfigError(
                "default_timeout_sec must not exceed max_timeout_sec".to_string(),
            ));
        }

        if self.enabled_groups()?.is_empty() {
            return Err(ToolError::ConfigError(
                "at least one tool group must be enabled".to_string(),
            ));
        }

        if self.storage.default_db.trim().is_empty() {
            return Err(ToolError::ConfigError(
                "storage.default_db cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.name, "toolgate");
        assert_eq!(config.tools.default_timeout_sec, 30);
        assert_eq!(config.storage.default_db, "data.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_limit() {
        let mut config = Config::default();
        config.web.max_fetch_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("web.max_fetch_bytes"));
    }

    #[test]
    fn test_config_validation_timeout_order() {
        let mut config = Config::default();
        config.tools.default_timeout_sec = 600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_unknown_group() {
        let mut config = Config::default();
        config.tools.enabled = vec!["shell".to_string(), "ftp".to_string()];
        assert!(config.validate().is_err());

        config.tools.enabled.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tools]
            enabled = ["sqlite"]

            [storage]
            default_db = "app.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.enabled_groups().unwrap(), vec![ToolGroup::Sqlite]);
        assert_eq!(config.storage.default_db, "app.db");
        assert_eq!(config.storage.query_timeout_sec, 30);
        assert_eq!(config.web.region, "uk-en");
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(
            Some(Path::new("/srv/data")),
            Some(&["web".to_string(), "web".to_string()][..]),
        );

        assert_eq!(config.tools.root_dir, "/srv/data");
        assert_eq!(config.enabled_groups().unwrap(), vec![ToolGroup::Web]);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nname = \"shell-mcp-server\"\n\n[storage]\nquery_timeout_sec = 5\n",
        )
        .unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.name, "shell-mcp-server");
        assert_eq!(loaded.storage.query_timeout_sec, 5);
        assert_eq!(loaded.storage.default_db, "data.db");
        assert_eq!(loaded.tools.default_timeout_sec, 30);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Config::load_from_file(Path::new("/nonexistent/toolgate.toml")).is_err());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.toolgate");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        assert_eq!(Config::expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
