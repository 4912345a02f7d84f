//! Tool implementations module
//!
//! Backends live in their own files; this module binds each operation to a
//! schema and a `ToolHandler`, grouped the way tools are enabled:
//! - shell: execute_command, read_file, write_file, list_directory, get_environment
//! - sqlite: execute_query, create_table, insert_row, get_schema, list_tables, drop_table
//! - web: search_web, fetch_page, get_search_engine

pub mod filesystem;
pub mod process;
pub mod storage;
pub mod web;

use crate::config::ServerInfo;
use crate::errors::{Result, ToolError};
use crate::tools::registry::{ToolDescriptor, ToolHandler};
use crate::tools::types::{Arguments, ParamSpec, ParamType, ToolContext, ToolSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use web::{WebBackend, WebOptions};

/// Independently enabled tool groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGroup {
    Shell,
    Sqlite,
    Web,
}

impl ToolGroup {
    pub const ALL: [ToolGroup; 3] = [ToolGroup::Shell, ToolGroup::Sqlite, ToolGroup::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolGroup::Shell => "shell",
            ToolGroup::Sqlite => "sqlite",
            ToolGroup::Web => "web",
        }
    }
}

impl fmt::Display for ToolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolGroup {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shell" => Ok(ToolGroup::Shell),
            "sqlite" => Ok(ToolGroup::Sqlite),
            "web" => Ok(ToolGroup::Web),
            other => Err(ToolError::ConfigError(format!(
                "Unknown tool group: {} (expected shell, sqlite or web)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ShellOp {
    Execute,
    Read,
    Write,
    List,
    Environment,
}

struct ShellTool {
    op: ShellOp,
    context: Arc<ToolContext>,
    info: Arc<ServerInfo>,
}

#[async_trait]
impl ToolHandler for ShellTool {
    async fn call(&self, args: &Arguments) -> Result<Value> {
        let ctx = self.context.as_ref();
        match self.op {
            ShellOp::Execute => {
                let output = process::execute_command(
                    args.str("command")?,
                    args.str("working_dir")?,
                    args.u64("timeout")?,
                    ctx,
                )
                .await?;
                Ok(serde_json::to_value(output)?)
            }
            ShellOp::Read => filesystem::read_file(args.str("path")?, ctx).await,
            ShellOp::Write => {
                filesystem::write_file(args.str("path")?, args.str("content")?, ctx).await
            }
            ShellOp::List => filesystem::list_directory(args.str("path")?, ctx).await,
            ShellOp::Environment => Ok(process::get_environment(ctx, &self.info)),
        }
    }
}

/// Shell group descriptors
pub fn shell_tools(
    context: Arc<ToolContext>,
    info: Arc<ServerInfo>,
    default_timeout: u64,
) -> Vec<ToolDescriptor> {
    let tool = |op, schema| {
        ToolDescriptor::new(
            schema,
            Arc::new(ShellTool {
                op,
                context: context.clone(),
                info: info.clone(),
            }),
        )
    };

    vec![
        tool(
            ShellOp::Execute,
            ToolSchema::new(
                "execute_command",
                "Execute a shell command with timeout. Returns stdout, stderr, and returncode.",
                vec![
                    ParamSpec::required("command", ParamType::String, "Shell command to execute"),
                    ParamSpec::optional(
                        "working_dir",
                        ParamType::String,
                        "Working directory for command execution",
                    )
                    .with_default("."),
                    ParamSpec::optional("timeout", ParamType::Integer, "Timeout in seconds")
                        .with_default(default_timeout),
                ],
                false,
            ),
        ),
        tool(
            ShellOp::Read,
            ToolSchema::new(
                "read_file",
                "Read file contents (max 100KB)",
                vec![ParamSpec::required("path", ParamType::String, "Path to file")],
                true,
            ),
        ),
        tool(
            ShellOp::Write,
            ToolSchema::new(
                "write_file",
                "Write content to file (creates or overwrites)",
                vec![
                    ParamSpec::required("path", ParamType::String, "Path to file"),
                    ParamSpec::required("content", ParamType::String, "Content to write"),
                ],
                false,
            ),
        ),
        tool(
            ShellOp::List,
            ToolSchema::new(
                "list_directory",
                "List directory contents with file metadata",
                vec![
                    ParamSpec::optional("path", ParamType::String, "Directory path")
                        .with_default("."),
                ],
                true,
            ),
        ),
        tool(
            ShellOp::Environment,
            ToolSchema::new(
                "get_environment",
                "Get system information (OS, cwd, CPU count)",
                vec![],
                true,
            ),
        ),
    ]
}

#[derive(Debug, Clone, Copy)]
enum SqliteOp {
    Query,
    CreateTable,
    InsertRow,
    Schema,
    ListTables,
    DropTable,
}

struct SqliteTool {
    op: SqliteOp,
    context: Arc<ToolContext>,
}

#[async_trait]
impl ToolHandler for SqliteTool {
    async fn call(&self, args: &Arguments) -> Result<Value> {
        let ctx = self.context.as_ref();
        let db_path = args.str("db_path")?;
        match self.op {
            SqliteOp::Query => storage::execute_query(args.str("sql")?, db_path, ctx).await,
            SqliteOp::CreateTable => {
                storage::create_table(args.str("table_name")?, args.str("schema")?, db_path, ctx)
                    .await
            }
            SqliteOp::InsertRow => {
                storage::insert_row(args.str("table_name")?, args.str("data")?, db_path, ctx).await
            }
            SqliteOp::Schema => storage::get_schema(db_path, ctx).await,
            SqliteOp::ListTables => storage::list_tables(db_path, ctx).await,
            SqliteOp::DropTable => storage::drop_table(args.str("table_name")?, db_path, ctx).await,
        }
    }
}

/// SQLite group descriptors
pub fn sqlite_tools(context: Arc<ToolContext>, default_db: &str) -> Vec<ToolDescriptor> {
    let db_param = || {
        ParamSpec::optional("db_path", ParamType::String, "Path to database file")
            .with_default(default_db)
    };
    let tool = |op, schema| {
        ToolDescriptor::new(
            schema,
            Arc::new(SqliteTool {
                op,
                context: context.clone(),
            }),
        )
    };

    vec![
        tool(
            SqliteOp::Query,
            ToolSchema::new(
                "execute_query",
                "Execute one SQL statement. Returns rows for SELECT-like statements, affected_rows otherwise.",
                vec![
                    ParamSpec::required("sql", ParamType::String, "SQL statement to execute"),
                    db_param(),
                ],
                false,
            ),
        ),
        tool(
            SqliteOp::CreateTable,
            ToolSchema::new(
                "create_table",
                "Create a new table with specified column definitions",
                vec![
                    ParamSpec::required("table_name", ParamType::String, "Name of the table to create"),
                    ParamSpec::required(
                        "schema",
                        ParamType::String,
                        "Column definitions (e.g., 'id INTEGER PRIMARY KEY, name TEXT')",
                    ),
                    db_param(),
                ],
                false,
            ),
        ),
        tool(
            SqliteOp::InsertRow,
            ToolSchema::new(
                "insert_row",
                "Insert a row into a table",
                vec![
                    ParamSpec::required("table_name", ParamType::String, "Name of the table"),
                    ParamSpec::required(
                        "data",
                        ParamType::String,
                        "JSON object of column/value pairs (e.g., '{\"name\": \"Alice\"}')",
                    ),
                    db_param(),
                ],
                false,
            ),
        ),
        tool(
            SqliteOp::Schema,
            ToolSchema::new(
                "get_schema",
                "Get column information for all tables in the database",
                vec![db_param()],
                true,
            ),
        ),
        tool(
            SqliteOp::ListTables,
            ToolSchema::new(
                "list_tables",
                "List all table names in the database",
                vec![db_param()],
                true,
            ),
        ),
        tool(
            SqliteOp::DropTable,
            ToolSchema::new(
                "drop_table",
                "Drop a table from the database (checks existence first)",
                vec![
                    ParamSpec::required("table_name", ParamType::String, "Name of the table to drop"),
                    db_param(),
                ],
                false,
            ),
        ),
    ]
}

#[derive(Debug, Clone, Copy)]
enum WebOp {
    Search,
    Fetch,
    Engine,
}

struct WebTool {
    op: WebOp,
    backend: Arc<WebBackend>,
}

#[async_trait]
impl ToolHandler for WebTool {
    async fn call(&self, args: &Arguments) -> Result<Value> {
        match self.op {
            WebOp::Search => {
                self.backend
                    .search(args.str("query")?, args.u64("max_results")?)
                    .await
            }
            WebOp::Fetch => {
                self.backend
                    .fetch_page(args.str("url")?, args.u64("max_chars")?)
                    .await
            }
            WebOp::Engine => Ok(self.backend.search_engine()),
        }
    }
}

/// Web group descriptors
pub fn web_tools(backend: Arc<WebBackend>) -> Vec<ToolDescriptor> {
    let tool = |op, schema| {
        ToolDescriptor::new(
            schema,
            Arc::new(WebTool {
                op,
                backend: backend.clone(),
            }),
        )
    };

    vec![
        tool(
            WebOp::Search,
            ToolSchema::new(
                "search_web",
                "Search the web. Uses Brave API if configured, falls back to DuckDuckGo.",
                vec![
                    ParamSpec::required("query", ParamType::String, "Search query string"),
                    ParamSpec::optional(
                        "max_results",
                        ParamType::Integer,
                        "Maximum number of results to return (1-20)",
                    )
                    .with_default(5),
                ],
                true,
            ),
        ),
        tool(
            WebOp::Fetch,
            ToolSchema::new(
                "fetch_page",
                "Fetch a webpage and extract its plain text content",
                vec![
                    ParamSpec::required("url", ParamType::String, "URL of the webpage to fetch"),
                    ParamSpec::optional(
                        "max_chars",
                        ParamType::Integer,
                        "Maximum characters to return",
                    )
                    .with_default(3000),
                ],
                true,
            ),
        ),
        tool(
            WebOp::Engine,
            ToolSchema::new(
                "get_search_engine",
                "Get the active search engine (brave or duckduckgo)",
                vec![],
                true,
            ),
        ),
    ]
}
