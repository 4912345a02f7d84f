//! Integration tests for toolgate
//!
//! Drives the full dispatch pipeline (registry, validation, backends,
//! envelope) through the public runtime, against a temporary root.

use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use toolgate::{cli::Config, ErrorKind, ServerConfig, ToolRuntime};

fn runtime_in(temp: &TempDir, groups: &[&str]) -> ToolRuntime {
    let mut config = Config::default();
    let groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
    config.apply_overrides(Some(temp.path()), Some(groups.as_slice()));
    ToolRuntime::new(ServerConfig::with_credential(&config, None).unwrap()).unwrap()
}

fn payload(envelope: &toolgate::Envelope) -> Value {
    envelope
        .payload()
        .cloned()
        .unwrap_or_else(|| panic!("expected success, got {}", envelope.to_text()))
}

#[test]
fn test_tool_registry() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell", "sqlite", "web"]);

    let tools = runtime.tool_names();
    assert_eq!(tools.len(), 14);
    for name in [
        "execute_command",
        "read_file",
        "write_file",
        "list_directory",
        "get_environment",
        "execute_query",
        "create_table",
        "insert_row",
        "get_schema",
        "list_tables",
        "drop_table",
        "search_web",
        "fetch_page",
        "get_search_engine",
    ] {
        assert!(runtime.has_tool(name), "missing {}", name);
    }
}

#[test]
fn test_catalog_shape() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["sqlite"]);

    let catalog = runtime.catalog();
    let insert = catalog.iter().find(|t| t["name"] == "insert_row").unwrap();

    assert_eq!(insert["inputSchema"]["type"], "object");
    assert_eq!(insert["inputSchema"]["required"], json!(["table_name", "data"]));
    assert_eq!(insert["inputSchema"]["properties"]["db_path"]["default"], "data.db");
    assert_eq!(insert["annotations"]["readOnlyHint"], false);

    let schema = catalog.iter().find(|t| t["name"] == "get_schema").unwrap();
    assert_eq!(schema["annotations"]["readOnlyHint"], true);
}

#[tokio::test]
async fn test_unknown_tool_skips_validation() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let envelope = runtime.execute("format_disk", json!(42)).await;
    assert_eq!(envelope.kind(), Some(ErrorKind::UnknownTool));
    assert_eq!(
        serde_json::from_str::<Value>(&envelope.to_text()).unwrap()["kind"],
        "unknown_tool"
    );
}

#[tokio::test]
async fn test_missing_and_mistyped_arguments() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let envelope = runtime.execute("execute_command", json!({})).await;
    assert_eq!(envelope.kind(), Some(ErrorKind::MissingArgument));

    let envelope = runtime
        .execute("execute_command", json!({"command": "ls", "timeout": "30"}))
        .await;
    assert_eq!(envelope.kind(), Some(ErrorKind::InvalidArgument));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_defaults_and_timeout() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let envelope = runtime.execute("execute_command", json!({"command": "pwd"})).await;
    let out = payload(&envelope);
    assert_eq!(out["returncode"], 0);
    let reported = std::fs::canonicalize(out["stdout"].as_str().unwrap().trim()).unwrap();
    assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());

    let start = Instant::now();
    let envelope = runtime
        .execute("execute_command", json!({"command": "sleep 30", "timeout": 1}))
        .await;
    let out = payload(&envelope);

    assert_eq!(out["returncode"], 124);
    assert_eq!(out["stdout"], "");
    assert_eq!(out["stderr"], "Command timed out after 1 seconds");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_working_dir_traversal_rejected() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let envelope = runtime
        .execute(
            "execute_command",
            json!({"command": "touch pwned", "working_dir": "../no/such/place"}),
        )
        .await;
    assert_eq!(envelope.kind(), Some(ErrorKind::InvalidArgument));
}

#[tokio::test]
async fn test_file_round_trip_and_listing() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let written = payload(
        &runtime
            .execute("write_file", json!({"path": "docs/readme.md", "content": "# hi"}))
            .await,
    );
    assert_eq!(written["bytes_written"], 4);

    let listing = payload(&runtime.execute("list_directory", json!({"path": "docs"})).await);
    assert_eq!(listing["entries"][0]["name"], "readme.md");
    assert_eq!(listing["entries"][0]["type"], "file");

    let envelope = runtime.execute("read_file", json!({"path": "a/../../b"})).await;
    assert_eq!(envelope.kind(), Some(ErrorKind::InvalidArgument));

    let envelope = runtime.execute("read_file", json!({"path": "docs/missing.md"})).await;
    assert_eq!(envelope.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_sqlite_flow() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["sqlite"]);

    for _ in 0..2 {
        let created = payload(
            &runtime
                .execute(
                    "create_table",
                    json!({"table_name": "people", "schema": "id INTEGER PRIMARY KEY, name TEXT"}),
                )
                .await,
        );
        assert_eq!(created["message"], "Table 'people' created successfully");
    }

    let inserted = payload(
        &runtime
            .execute(
                "insert_row",
                json!({"table_name": "people", "data": "{\"name\": \"O'Brien\"}"}),
            )
            .await,
    );
    assert_eq!(inserted["row_id"], 1);

    let rows = payload(
        &runtime
            .execute("execute_query", json!({"sql": "SELECT id, name FROM people"}))
            .await,
    );
    assert_eq!(rows["rows"], json!([{"id": 1, "name": "O'Brien"}]));
    assert!(temp.path().join("data.db").exists());

    let envelope = runtime
        .execute("drop_table", json!({"table_name": "users; DROP TABLE people"}))
        .await;
    assert_eq!(envelope.kind(), Some(ErrorKind::InvalidArgument));

    let envelope = runtime.execute("drop_table", json!({"table_name": "ghost"})).await;
    assert_eq!(envelope.kind(), Some(ErrorKind::NotFound));

    let tables = payload(&runtime.execute("list_tables", json!({})).await);
    assert_eq!(tables["tables"], json!(["people"]));
}

#[tokio::test]
async fn test_sqlite_custom_db_path() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["sqlite"]);

    let envelope = runtime
        .execute(
            "execute_query",
            json!({"sql": "CREATE TABLE t (x)", "db_path": "dbs/../../escape.db"}),
        )
        .await;
    assert_eq!(envelope.kind(), Some(ErrorKind::InvalidArgument));

    std::fs::create_dir(temp.path().join("dbs")).unwrap();
    let result = payload(
        &runtime
            .execute(
                "execute_query",
                json!({"sql": "CREATE TABLE t (x)", "db_path": "dbs/app.db"}),
            )
            .await,
    );
    assert_eq!(result["affected_rows"], 0);
    assert!(temp.path().join("dbs/app.db").exists());
}

#[tokio::test]
async fn test_get_environment() {
    let temp = TempDir::new().unwrap();
    let runtime = runtime_in(&temp, &["shell"]);

    let env = payload(&runtime.execute("get_environment", Value::Null).await);
    assert_eq!(env["server"]["name"], "toolgate");
    assert_eq!(env["arch"], std::env::consts::ARCH);
}
