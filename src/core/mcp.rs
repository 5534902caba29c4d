use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::{ToolMetadata, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPTool {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<ToolMetadata> for MCPTool {
    fn from(metadata: ToolMetadata) -> Self {
        Self {
            input_schema: metadata.input_schema(),
            name: metadata.name,
            description: Some(metadata.description),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MCPRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct MCPResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

impl MCPResponse {
    fn reply(id: Value, outcome: std::result::Result<Value, MCPError>) -> Self {
        match outcome {
            Ok(result) => Self {
                jsonrpc: "2.0",
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                jsonrpc: "2.0",
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct MCPError {
    code: i32,
    message: String,
}

impl MCPError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Line-delimited JSON-RPC server exposing the tool registry over MCP
pub struct MCPServer {
    registry: Arc<ToolRegistry>,
}

impl MCPServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one incoming line. Notifications produce no reply.
    pub async fn handle_message(&self, line: &str) -> Option<Value> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(Self::encode(MCPResponse::reply(
                    Value::Null,
                    Err(MCPError::new(PARSE_ERROR, format!("Parse error: {}", e))),
                )));
            }
        };

        let request: MCPRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return Some(Self::encode(MCPResponse::reply(
                    Value::Null,
                    Err(MCPError::new(INVALID_REQUEST, format!("Invalid request: {}", e))),
                )));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!("Notification: {}", request.method);
            return None;
        };

        let outcome = self.dispatch(&request.method, request.params).await;
        Some(Self::encode(MCPResponse::reply(id, outcome)))
    }

    async fn dispatch(&self, method: &str, params: Value) -> std::result::Result<Value, MCPError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools: Vec<MCPTool> = self
                    .registry
                    .list_tools()
                    .into_iter()
                    .map(MCPTool::from)
                    .collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| MCPError::new(INVALID_PARAMS, "'name' is required"))?;
                let arguments = match params.get("arguments") {
                    None | Some(Value::Null) => json!({}),
                    Some(args) => args.clone(),
                };

                tracing::info!(tool = name, "Tool call");
                let result = self.registry.call(name, arguments).await;
                Ok(json!({
                    "content": [{ "type": "text", "text": result.text() }],
                    "isError": !result.success
                }))
            }
            other => Err(MCPError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }

    fn encode(response: MCPResponse) -> Value {
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    /// Serve until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_message(&line).await {
                let json = serde_json::to_string(&reply)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        tracing::info!(
            "MCP server listening on stdio with {} tools",
            self.registry.tool_names().len()
        );
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        tracing::info!("MCP client closed stdin, shutting down");
        Ok(())
    }
}
