//! JSON-RPC 2.0 message types for the MCP wire protocol.
//!
//! Messages travel as single-line JSON over a provider's stdio. Requests
//! carry a numeric id and expect a response with the same id; notifications
//! carry no id and expect nothing back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request expecting a correlated response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A one-way message with no response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A response carrying either a result or an error, never both.
///
/// The id is optional because providers may emit notifications or
/// malformed frames on the same stream; those parse with `id: None`
/// and are dropped by the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// The error object of a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_with_version_and_id() {
        let req = JsonRpcRequest::new(7, "tools/list", Some(json!({})));
        let text = serde_json::to_string(&req).unwrap();
        assert!(text.contains(r#""jsonrpc":"2.0""#));
        assert!(text.contains(r#""id":7"#));
        assert!(text.contains(r#""method":"tools/list""#));
    }

    #[test]
    fn request_omits_absent_params() {
        let req = JsonRpcRequest::new(1, "shutdown", None);
        let text = serde_json::to_string(&req).unwrap();
        assert!(!text.contains("params"));
    }

    #[test]
    fn notification_has_no_id() {
        let note = JsonRpcNotification::new("notifications/initialized", Some(json!({})));
        let text = serde_json::to_string(&note).unwrap();
        assert!(!text.contains(r#""id""#));
    }

    #[test]
    fn response_parses_result() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#).unwrap();
        assert_eq!(resp.id, Some(3));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn response_parses_error() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "method not found");
    }

    #[test]
    fn notification_frame_parses_with_no_id() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/progress"}"#).unwrap();
        assert_eq!(resp.id, None);
    }
}
