//! SQLite tool implementations
//!
//! Each call opens its own connection, runs on the blocking pool under the
//! query budget, and closes the connection when the work returns. On budget
//! expiry the running statement is interrupted through the connection's
//! interrupt handle.
//!
//! Table and column names are validated identifiers and always quoted;
//! values only ever travel as bound parameters.

use crate::errors::{Result, ToolError};
use crate::tools::executor::{run_blocking, Limits};
use crate::tools::security::{validate_identifier, validate_path};
use crate::tools::types::ToolContext;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Leading keywords whose statements produce rows
const ROW_KEYWORDS: [&str; 5] = ["SELECT", "WITH", "VALUES", "PRAGMA", "EXPLAIN"];

/// A database file resolved for one call
struct Store {
    path: PathBuf,
    limits: Limits,
}

impl Store {
    fn open(db_path: &str, context: &ToolContext) -> Result<Self> {
        if !validate_path(db_path) {
            return Err(ToolError::invalid(format!("Invalid db_path: {}", db_path)));
        }

        Ok(Self {
            path: context.resolve(db_path),
            limits: Limits::time(context.query_timeout),
        })
    }

    /// Run `work` against a fresh connection under the query budget
    async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Connection::open(&self.path).map_err(|e| {
            ToolError::backend(format!("Database connection failed: {}", e))
        })?;
        let interrupt = conn.get_interrupt_handle();
        debug!(db = %self.path.display(), "database opened");

        run_blocking(move || work(&conn), &self.limits, move || interrupt.interrupt()).await
    }
}

/// Execute one SQL statement
pub async fn execute_query(sql: &str, db_path: &str, context: &ToolContext) -> Result<Value> {
    let statement = single_statement(sql)?.to_string();
    if skip_trivia(&statement).is_empty() {
        return Err(ToolError::invalid("SQL cannot be empty"));
    }

    let keyword_rows = ROW_KEYWORDS.contains(&leading_keyword(&statement).as_str());
    let store = Store::open(db_path, context)?;

    store
        .run(move |conn| {
            let mut stmt = conn.prepare(&statement)?;

            // `INSERT ... RETURNING` and friends produce rows despite the keyword
            if !keyword_rows && stmt.column_count() == 0 {
                let affected = stmt.execute([])?;
                return Ok(json!({ "rows": [], "affected_rows": affected }));
            }

            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();

            while let Some(row) = rows.next()? {
                let mut record = Map::new();
                for (i, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), column_value(row.get_ref(i)?));
                }
                out.push(Value::Object(record));
            }

            Ok(json!({ "rows": out }))
        })
        .await
}

/// Create a table if it does not exist yet
pub async fn create_table(
    table_name: &str,
    schema: &str,
    db_path: &str,
    context: &ToolContext,
) -> Result<Value> {
    check_table_name(table_name)?;
    if schema.trim().is_empty() {
        return Err(ToolError::invalid("schema cannot be empty"));
    }

    let sql = format!("CREATE TABLE IF NOT EXISTS \"{}\" ({})", table_name, schema);
    let statement = single_statement(&sql)?.to_string();
    let store = Store::open(db_path, context)?;
    let name = table_name.to_string();

    store
        .run(move |conn| {
            conn.execute(&statement, [])?;
            Ok(json!({
                "success": true,
                "message": format!("Table '{}' created successfully", name),
            }))
        })
        .await
}

/// Insert one row; `data` is a JSON object of column to scalar value
pub async fn insert_row(
    table_name: &str,
    data: &str,
    db_path: &str,
    context: &ToolContext,
) -> Result<Value> {
    check_table_name(table_name)?;

    let parsed: Value = serde_json::from_str(data)
        .map_err(|e| ToolError::invalid(format!("Invalid JSON in data: {}", e)))?;
    let Value::Object(fields) = parsed else {
        return Err(ToolError::invalid("data must be a JSON object"));
    };

    let mut columns = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for (column, value) in &fields {
        if !validate_identifier(column) {
            return Err(ToolError::invalid(format!("Invalid column name: {}", column)));
        }
        columns.push(format!("\"{}\"", column));
        values.push(bind_value(column, value)?);
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO \"{}\" DEFAULT VALUES", table_name)
    } else {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table_name,
            columns.join(", "),
            placeholders
        )
    };

    let store = Store::open(db_path, context)?;
    let name = table_name.to_string();

    store
        .run(move |conn| {
            if !table_exists(conn, &name)? {
                return Err(missing_table(&name));
            }

            conn.execute(&sql, params_from_iter(values))?;
            Ok(json!({
                "success": true,
                "message": format!("Row inserted into '{}'", name),
                "row_id": conn.last_insert_rowid(),
            }))
        })
        .await
}

/// Describe every user table and its columns
pub async fn get_schema(db_path: &str, context: &ToolContext) -> Result<Value> {
    let store = Store::open(db_path, context)?;

    store
        .run(|conn| {
            let mut schema = Vec::new();
            let mut columns_stmt =
                conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)")?;

            for table in table_names(conn)? {
                let columns = columns_stmt
                    .query_map([&table], |row| {
                        Ok(json!({
                            "name": row.get::<_, String>(0)?,
                            "type": row.get::<_, String>(1)?,
                            "not_null": row.get::<_, i64>(2)? != 0,
                            "primary_key": row.get::<_, i64>(3)? != 0,
                        }))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                schema.push(json!({ "table": table, "columns": columns }));
            }

            Ok(json!({ "schema": schema }))
        })
        .await
}

/// List user table names, sorted
pub async fn list_tables(db_path: &str, context: &ToolContext) -> Result<Value> {
    let store = Store::open(db_path, context)?;
    store
        .run(|conn| Ok(json!({ "tables": table_names(conn)? })))
        .await
}

/// Drop an existing table
pub async fn drop_table(table_name: &str, db_path: &str, context: &ToolContext) -> Result<Value> {
    check_table_name(table_name)?;
    let store = Store::open(db_path, context)?;
    let name = table_name.to_string();

    store
        .run(move |conn| {
            if !table_exists(conn, &name)? {
                return Err(missing_table(&name));
            }

            conn.execute(&format!("DROP TABLE \"{}\"", name), [])?;
            Ok(json!({
                "success": true,
                "message": format!("Table '{}' dropped successfully", name),
            }))
        })
        .await
}

fn check_table_name(name: &str) -> Result<()> {
    if validate_identifier(name) {
        Ok(())
    } else {
        Err(ToolError::invalid(format!(
            "Invalid table name: {}. Use alphanumeric and underscore only.",
            name
        )))
    }
}

fn missing_table(name: &str) -> ToolError {
    ToolError::NotFound(format!("Table '{}' does not exist", name))
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        // NaN and infinities have no JSON form
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::String(BASE64.encode(blob)),
    }
}

fn bind_value(column: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| ToolError::invalid(format!("Unsupported number for {}", column))),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(ToolError::invalid(format!(
            "Nested value for column {} is not supported",
            column
        ))),
    }
}

/// Skip leading whitespace and comments
fn skip_trivia(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]);
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]);
        } else {
            return trimmed;
        }
    }
}

fn leading_keyword(sql: &str) -> String {
    skip_trivia(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Return the statement text, rejecting anything after the first
/// top-level `;` other than whitespace and comments.
fn single_statement(sql: &str) -> Result<&str> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    let skip_until = |from: usize, end: &[u8]| -> usize {
        bytes[from..]
            .windows(end.len())
            .position(|w| w == end)
            .map_or(len, |p| from + p + end.len())
    };

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => i = skip_until(i + 1, &[quote]),
            b'[' => i = skip_until(i + 1, b"]"),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_until(i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_until(i + 2, b"*/"),
            b';' => {
                if !skip_trivia(&sql[i + 1..]).is_empty() {
                    return Err(ToolError::invalid(
                        "Multiple SQL statements are not allowed",
                    ));
                }
                return Ok(&sql[..i]);
            }
            _ => i += 1,
        }
    }

    Ok(sql)
}
