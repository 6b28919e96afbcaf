//! MCP client over line-delimited JSON-RPC on stdio.

use super::protocol::*;
use crate::config::McpSettings;
use crate::error::{Result, TrellisError};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

struct Transport {
    reader: Reader,
    writer: Writer,
}

/// Client connected to a single MCP server.
pub struct McpClient {
    transport: Mutex<Transport>,
    next_id: AtomicI64,
    timeout: Duration,
    child: Option<Mutex<Child>>,
    server_info: Option<ServerInfo>,
}

impl McpClient {
    /// Launch the configured MCP server as a child process.
    pub fn spawn(settings: &McpSettings) -> Result<Self> {
        let mut command = Command::new(&settings.command);
        command
            .args(&settings.args)
            .envs(&settings.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrellisError::ToolNotFound(settings.command.clone())
            } else {
                TrellisError::Mcp(format!("Failed to start '{}': {}", settings.command, e))
            }
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrellisError::Mcp("MCP server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrellisError::Mcp("MCP server stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "trellis::mcp::server", "{}", line);
                }
            });
        }

        info!(
            "Started MCP server: {} {}",
            settings.command,
            settings.args.join(" ")
        );

        let mut client = Self::from_transport(
            stdout,
            stdin,
            Duration::from_secs(settings.request_timeout_secs),
        );
        client.child = Some(Mutex::new(child));
        Ok(client)
    }

    /// Build a client over an arbitrary reader/writer pair.
    pub fn from_transport<R, W>(reader: R, writer: W, timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            transport: Mutex::new(Transport {
                reader: BufReader::new(Box::new(reader) as Box<dyn AsyncRead + Send + Unpin>),
                writer: Box::new(writer),
            }),
            next_id: AtomicI64::new(1),
            timeout,
            child: None,
            server_info: None,
        }
    }

    /// Server name and version reported during initialization.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Perform the initialize handshake.
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        self.notify("notifications/initialized").await?;

        if result.protocol_version != PROTOCOL_VERSION {
            warn!(
                "MCP server speaks protocol {}, client expects {}",
                result.protocol_version, PROTOCOL_VERSION
            );
        }
        if let Some(server) = &result.server_info {
            info!("Connected to MCP server {} {}", server.name, server.version);
        }
        self.server_info = result.server_info.clone();
        Ok(result)
    }

    /// List every tool the server offers, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ToolsListResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!("MCP server offers {} tools", tools.len());
        Ok(tools)
    }

    /// Call a tool by name.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments,
        })?;
        self.request("tools/call", Some(params)).await
    }

    /// Close the connection and stop the server process.
    pub async fn shutdown(mut self) -> Result<()> {
        {
            // Dropping the writer closes the server's stdin.
            let mut transport = self.transport.lock().await;
            let _ = transport.writer.shutdown().await;
            transport.writer = Box::new(tokio::io::sink());
        }

        if let Some(child) = self.child.take() {
            let mut child = child.into_inner();
            match tokio::time::timeout(Duration::from_secs(2), child.wait()).await {
                Ok(_) => {}
                Err(_) => {
                    debug!("MCP server did not exit, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let mut transport = self.transport.lock().await;
        write_message(&mut transport.writer, &JsonRpcRequest::notification(method)).await
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::request(id, method, params);

        let mut transport = self.transport.lock().await;
        let exchange = async {
            write_message(&mut transport.writer, &request).await?;
            read_response(&mut *transport, id).await
        };

        let message = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                TrellisError::Mcp(format!(
                    "Request '{}' timed out after {:?}",
                    method, self.timeout
                ))
            })??;

        if let Some(error) = message.error {
            return Err(TrellisError::Mcp(format!(
                "'{}' failed ({}): {}",
                method, error.code, error.message
            )));
        }

        let result = message.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| TrellisError::Mcp(format!("Invalid '{}' response: {}", method, e)))
    }
}

async fn write_message<T: serde::Serialize>(writer: &mut Writer, message: &T) -> Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read until the response to `id` arrives, answering server requests on the way.
async fn read_response(transport: &mut Transport, id: i64) -> Result<JsonRpcMessage> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = transport.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(TrellisError::Mcp("MCP server closed the connection".to_string()));
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let message: JsonRpcMessage = match serde_json::from_str(trimmed) {
            Ok(m) => m,
            Err(e) => {
                warn!("Ignoring unparsable MCP message: {}", e);
                continue;
            }
        };

        match message.kind() {
            MessageKind::Response if message.response_id() == Some(id) => return Ok(message),
            MessageKind::Response => {
                debug!("Ignoring response for unknown id {:?}", message.id);
            }
            MessageKind::Notification => {
                debug!("MCP notification: {:?}", message.method);
            }
            MessageKind::Request => {
                let request_id = message.id.clone().unwrap_or(Value::Null);
                let reply = match message.method.as_deref() {
                    Some("ping") => JsonRpcReply::success(request_id, json!({})),
                    other => JsonRpcReply::error(
                        request_id,
                        METHOD_NOT_FOUND,
                        &format!("Method not supported by client: {}", other.unwrap_or("")),
                    ),
                };
                write_message(&mut transport.writer, &reply).await?;
            }
        }
    }
}
