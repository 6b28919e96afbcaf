//! MCP protocol types (JSON-RPC 2.0), client side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "trellis";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC request or notification sent to the server.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn request(id: i64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    pub fn notification(method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: method.to_string(),
            params: None,
        }
    }
}

/// JSON-RPC response sent back for a server-initiated request.
#[derive(Debug, Serialize)]
pub struct JsonRpcReply {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcReply {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any message read from the server.
#[derive(Debug, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// What kind of message the server sent.
#[derive(Debug, PartialEq)]
pub enum MessageKind {
    /// The server is calling us and expects a reply.
    Request,
    /// Fire-and-forget message from the server.
    Notification,
    /// Reply to one of our requests.
    Response,
}

impl JsonRpcMessage {
    pub fn kind(&self) -> MessageKind {
        match (&self.method, &self.id) {
            (Some(_), Some(_)) => MessageKind::Request,
            (Some(_), None) => MessageKind::Notification,
            (None, _) => MessageKind::Response,
        }
    }

    /// Numeric id of a response, if it has one.
    pub fn response_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(Value::as_i64)
    }
}

/// MCP initialize request params.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP initialize response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Tool advertised by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// Tools list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsListResult {
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Tool call request params.
#[derive(Debug, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// Tool call response.
#[derive(Debug, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "mimeType", default)]
        mime_type: String,
    },
    Audio {
        #[serde(rename = "mimeType", default)]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
    ResourceLink {
        uri: String,
    },
    #[serde(other)]
    Unknown,
}

impl ToolCallResult {
    /// Flatten the content blocks into text for the model.
    pub fn to_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ToolContent::Text { text } => Some(text.clone()),
                ToolContent::Image { mime_type } => Some(format!("[image: {}]", mime_type)),
                ToolContent::Audio { mime_type } => Some(format!("[audio: {}]", mime_type)),
                // Blob resources are reduced to their URI.
                ToolContent::Resource { resource } => {
                    match resource.get("text").and_then(Value::as_str) {
                        Some(text) => Some(text.to_string()),
                        None => resource
                            .get("uri")
                            .and_then(Value::as_str)
                            .map(|uri| format!("[resource: {}]", uri)),
                    }
                }
                ToolContent::ResourceLink { uri } => Some(format!("[resource: {}]", uri)),
                ToolContent::Unknown => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::request(3, "tools/list", None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}));

        let note = JsonRpcRequest::notification("notifications/initialized");
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_message_kind() {
        let msg: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Response);
        assert_eq!(msg.response_id(), Some(1));

        let msg: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/message"}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Notification);

        let msg: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"s1","method":"ping"}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Request);
    }

    #[test]
    fn test_initialize_params() {
        let value = serde_json::to_value(InitializeParams::default()).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["clientInfo"]["name"], "trellis");
    }

    #[test]
    fn test_tool_result_to_text() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Page title: Pydantic"},
                {"type": "image", "data": "AAAA", "mimeType": "image/png"},
                {"type": "resource", "resource": {"uri": "file:///a", "text": "snapshot"}},
                {"type": "resource", "resource": {"uri": "file:///shot.png", "mimeType": "image/png", "blob": "iVBORw0KGgoAAAANSUhEUg"}},
                {"type": "something_new"}
            ]
        }))
        .unwrap();

        assert!(!result.is_error);
        assert_eq!(
            result.to_text(),
            "Page title: Pydantic\n[image: image/png]\nsnapshot\n[resource: file:///shot.png]"
        );
        assert!(!result.to_text().contains("iVBOR"));
    }

    #[test]
    fn test_tools_list_parsing() {
        let result: ToolsListResult = serde_json::from_value(json!({
            "tools": [
                {"name": "browser_navigate", "description": "Navigate", "inputSchema": {"type": "object", "properties": {"url": {"type": "string"}}}},
                {"name": "browser_close", "inputSchema": {"type": "object"}}
            ],
            "nextCursor": "page2"
        }))
        .unwrap();

        assert_eq!(result.tools.len(), 2);
        assert!(result.tools[1].description.is_none());
        assert_eq!(result.next_cursor.as_deref(), Some("page2"));
    }
}
