//! Filesystem tool implementations
//!
//! - read_file: read a UTF-8 file under the read ceiling
//! - write_file: create or overwrite a file, creating parents
//! - list_directory: list entries with metadata
//!
//! Every path token passes `validate_path` before it is resolved against
//! the context root. Directory tokens additionally accept an existing path
//! as an override (see `resolve_directory`).

use crate::errors::{Result, ToolError};
use crate::tools::executor::{read_capped, run_bounded, Limits};
use crate::tools::security::validate_path;
use crate::tools::types::ToolContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// One row of a directory listing
#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub size: Option<u64>,
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resolve a directory token.
///
/// `.` is always accepted. Any other token must pass the path validator,
/// unless it already exists on disk.
pub fn resolve_directory(token: &str, context: &ToolContext) -> Result<PathBuf> {
    let resolved = context.resolve(token);

    if token == "." || validate_path(token) {
        return Ok(resolved);
    }

    if resolved.exists() {
        debug!(path = %token, "unvalidated directory accepted because it exists");
        return Ok(resolved);
    }

    Err(ToolError::invalid(format!("Invalid path: {}", token)))
}

/// Read file contents
pub async fn read_file(path: &str, context: &ToolContext) -> Result<Value> {
    if !validate_path(path) {
        return Err(ToolError::invalid(format!("Invalid path: {}", path)));
    }

    let full_path = context.resolve(path);
    let limits = Limits::time(context.io_timeout).with_size(context.max_read_size);

    run_bounded(
        async {
            let metadata = stat(&full_path, path, "File").await?;
            if !metadata.is_file() {
                return Err(ToolError::invalid(format!("Path is not a file: {}", path)));
            }
            limits.check_size(metadata.len())?;

            // The file may grow between stat and read
            let file = fs::File::open(&full_path).await?;
            let bytes = read_capped(file, context.max_read_size).await?;

            let content = String::from_utf8(bytes).map_err(|_| {
                ToolError::backend(format!("File is not valid UTF-8 text: {}", path))
            })?;

            Ok(json!({ "content": content }))
        },
        &limits,
    )
    .await
}

/// Write content to file (creates or overwrites)
pub async fn write_file(path: &str, content: &str, context: &ToolContext) -> Result<Value> {
    if !validate_path(path) {
        return Err(ToolError::invalid(format!("Invalid path: {}", path)));
    }

    let limits = Limits::time(context.io_timeout).with_size(context.max_write_size as u64);
    limits.check_size(content.len() as u64)?;

    let full_path = context.resolve(path);

    run_bounded(
        async {
            if let Some(parent) = full_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }

            fs::write(&full_path, content.as_bytes()).await?;
            let absolute = fs::canonicalize(&full_path).await?;

            Ok(json!({
                "success": true,
                "path": absolute.display().to_string(),
                "bytes_written": content.len(),
            }))
        },
        &limits,
    )
    .await
}

/// List contents of a directory
pub async fn list_directory(path: &str, context: &ToolContext) -> Result<Value> {
    let dir_path = resolve_directory(path, context)?;
    let limits = Limits::time(context.io_timeout);

    run_bounded(
        async {
            let metadata = stat(&dir_path, path, "Directory").await?;
            if !metadata.is_dir() {
                return Err(ToolError::invalid(format!(
                    "Path is not a directory: {}",
                    path
                )));
            }

            let mut entries = Vec::new();
            let mut read_dir = fs::read_dir(&dir_path).await?;

            while let Some(entry) = read_dir.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();

                let row = match entry.metadata().await {
                    Ok(meta) => DirEntry {
                        name,
                        entry_type: if meta.is_dir() { "dir" } else { "file" },
                        size: meta.is_file().then(|| meta.len()),
                        modified: meta
                            .modified()
                            .ok()
                            .map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
                        error: None,
                    },
                    Err(_) => DirEntry {
                        name,
                        entry_type: match entry.file_type().await {
                            Ok(ft) if ft.is_dir() => "dir",
                            _ => "file",
                        },
                        size: None,
                        modified: None,
                        error: Some("Permission denied or inaccessible".to_string()),
                    },
                };
                entries.push(row);
            }

            entries.sort_by(|a, b| a.name.cmp(&b.name));

            let absolute = fs::canonicalize(&dir_path)
                .await
                .unwrap_or_else(|_| dir_path.clone());
            Ok(json!({
                "path": absolute.display().to_string(),
                "entries": entries,
            }))
        },
        &limits,
    )
    .await
}

async fn stat(full_path: &Path, token: &str, what: &str) -> Result<std::fs::Metadata> {
    match fs::metadata(full_path).await {
        Ok(metadata) => Ok(metadata),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ToolError::NotFound(format!("{} not found: {}", what, token)))
        }
        Err(e) => Err(e.into()),
    }
}
