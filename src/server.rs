//! Stdio host channel
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout. Requests are handled
//! one at a time in arrival order; EOF ends the loop. Messages without an
//! `id` are notifications and never get a reply.

use crate::errors::Result;
use crate::tools::runtime::ToolRuntime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Protocol revision reported when the client does not ask for one
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC front end over a tool runtime
pub struct StdioServer {
    runtime: ToolRuntime,
}

impl StdioServer {
    pub fn new(runtime: ToolRuntime) -> Self {
        Self { runtime }
    }

    /// Serve on the process's stdin/stdout until EOF
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve on any line reader / writer pair until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.runtime.info().name, "serving on stdio");
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line).await,
                Err(e) => {
                    warn!(error = %e, "message is not valid UTF-8");
                    to_value(Response::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: invalid UTF-8: {}", e),
                    ))
                }
            };

            if let Some(reply) = reply {
                let mut encoded = serde_json::to_vec(&reply)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }

        info!("input closed, shutting down");
        Ok(())
    }

    /// Handle one raw message; `None` means no reply is due
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return to_value(Response::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };

        let request: Request = match serde_json::from_value(message.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = message.get("id").cloned().unwrap_or(Value::Null);
                return to_value(Response::error(id, INVALID_REQUEST, format!("Invalid request: {}", e)));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        let response = match self.handle_request(&request.method, request.params).await {
            Ok(result) => Response::result(id, result),
            Err((code, message)) => Response::error(id, code, message),
        };
        to_value(response)
    }

    async fn handle_request(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Value, (i64, String)> {
        debug!(method, "request");
        match method {
            "initialize" => {
                let version = params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(PROTOCOL_VERSION);
                Ok(json!({
                    "protocolVersion": version,
                    "capabilities": { "tools": {} },
                    "serverInfo": self.runtime.info(),
                }))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.runtime.catalog() })),
            "tools/call" => {
                let call: CallParams = serde_json::from_value(params)
                    .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?;

                let envelope = self.runtime.execute(&call.name, call.arguments).await;
                Ok(json!({
                    "content": [{ "type": "text", "text": envelope.to_text() }],
                    "isError": envelope.is_err(),
                }))
            }
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        }
    }
}

fn to_value(response: Response) -> Option<Value> {
    serde_json::to_value(response).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Config;
    use crate::config::ServerConfig;
    use tempfile::TempDir;

    fn setup() -> (StdioServer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.apply_overrides(
            Some(temp_dir.path()),
            Some(&["shell".to_string(), "sqlite".to_string()][..]),
        );
        let runtime = ToolRuntime::new(ServerConfig::with_credential(&config, None).unwrap()).unwrap();
        (StdioServer::new(runtime), temp_dir)
    }

    #[tokio::test]
    async fn test_initialize() {
        let (server, _temp) = setup();
        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();

        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(reply["result"]["serverInfo"]["name"], "toolgate");
        assert_eq!(reply["result"]["capabilities"], json!({"tools": {}}));
    }

    #[tokio::test]
    async fn test_notification_gets_no_reply() {
        let (server, _temp) = setup();
        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let (server, _temp) = setup();
        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = reply["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert_eq!(tools[0]["name"], "execute_command");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["command"]));
    }

    #[tokio::test]
    async fn test_tools_call_success_and_error() {
        let (server, _temp) = setup();

        let reply = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_tables","arguments":{}}}"#,
            )
            .await
            .unwrap();
        assert_eq!(reply["result"]["isError"], false);
        assert_eq!(reply["result"]["content"][0]["text"], r#"{"tables":[]}"#);

        let reply = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(reply["result"]["isError"], true);
        let text: Value =
            serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["kind"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (server, _temp) = setup();

        let reply = server.handle_line("{not json").await.unwrap();
        assert_eq!(reply["error"]["code"], PARSE_ERROR);
        assert_eq!(reply["id"], Value::Null);

        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);

        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], INVALID_PARAMS);

        let reply = server.handle_line(r#"{"jsonrpc":"2.0","id":6}"#).await.unwrap();
        assert_eq!(reply["error"]["code"], INVALID_REQUEST);
        assert_eq!(reply["id"], 6);
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let (server, _temp) = setup();
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.extend_from_slice(b"\n\xff\xfe\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.extend_from_slice(b"\n");
        let mut output = Vec::new();

        server.serve(&input[..], &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], Value::Null);
        assert_eq!(replies[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(replies[2]["id"], 2);
        assert_eq!(replies[2]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_serve_loop_until_eof() {
        let (server, _temp) = setup();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"], json!({}));
    }
}
