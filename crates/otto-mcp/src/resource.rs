//! Resource types exposed by MCP providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resource listed by `resources/list`.
///
/// Every field defaults so that one sparsely-described resource cannot
/// sink the whole listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpResource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// The payload returned by `resources/read`.
///
/// Text resources fill `text`; binary resources carry base64 in `blob`.
/// Some providers wrap the payload in a `contents` list instead, so both
/// shapes are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceContent {
    #[serde(default)]
    pub uri: String,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blob: Option<String>,
    #[serde(default)]
    pub contents: Vec<ResourceContentItem>,
}

impl ResourceContent {
    /// Best-effort text of this payload, checking the flat field first
    /// and then the wrapped list.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.contents.iter().find_map(|item| item.text.as_deref()))
    }
}

/// One entry of a wrapped `contents` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceContentItem {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// A parameterized resource listed by `resources/templates/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTemplate {
    #[serde(default, rename = "uriTemplate")]
    pub uri_template: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

/// Expand `{placeholder}` segments of a URI template.
///
/// String arguments substitute verbatim; other JSON values substitute
/// as their compact JSON text. Placeholders with no matching argument
/// are left in place.
pub fn resolve_uri_template(template: &str, args: &serde_json::Map<String, Value>) -> String {
    let mut uri = template.to_string();
    for (key, value) in args {
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        uri = uri.replace(&format!("{{{key}}}"), &rendered);
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_parses_with_camel_case_mime_type() {
        let resource: McpResource = serde_json::from_value(json!({
            "uri": "file:///notes.txt",
            "name": "notes",
            "mimeType": "text/plain",
        }))
        .unwrap();
        assert_eq!(resource.uri, "file:///notes.txt");
        assert_eq!(resource.mime_type.as_deref(), Some("text/plain"));
        assert!(resource.description.is_empty());
    }

    #[test]
    fn content_text_prefers_flat_field() {
        let content: ResourceContent = serde_json::from_value(json!({
            "uri": "file:///a",
            "text": "flat",
            "contents": [{"type": "text", "text": "wrapped"}],
        }))
        .unwrap();
        assert_eq!(content.text(), Some("flat"));
    }

    #[test]
    fn content_text_falls_back_to_wrapped_list() {
        let content: ResourceContent = serde_json::from_value(json!({
            "contents": [{"type": "text", "text": "wrapped"}],
        }))
        .unwrap();
        assert_eq!(content.text(), Some("wrapped"));
    }

    #[test]
    fn template_resolves_string_and_number_args() {
        let mut args = serde_json::Map::new();
        args.insert("user".into(), json!("ada"));
        args.insert("page".into(), json!(3));
        let uri = resolve_uri_template("app://users/{user}/posts/{page}", &args);
        assert_eq!(uri, "app://users/ada/posts/3");
    }

    #[test]
    fn template_keeps_unmatched_placeholders() {
        let args = serde_json::Map::new();
        let uri = resolve_uri_template("app://users/{user}", &args);
        assert_eq!(uri, "app://users/{user}");
    }
}
