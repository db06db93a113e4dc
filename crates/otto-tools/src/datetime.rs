//! Date/time tool — reports the current local time.

use std::future::Future;
use std::pin::Pin;

use chrono::Local;
use otto_types::{Tool, ToolError};
use serde_json::Value;

/// Tool that returns the current local date and time. Takes no parameters.
pub struct DateTimeTool;

impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "datetime"
    }

    fn description(&self) -> &str {
        "Returns the current date and time. Takes no parameters."
    }

    fn execute(
        &self,
        _params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let now = Local::now();
            Ok(format!("Current time: {}", now.format("%Y-%m-%d %H:%M:%S")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    #[tokio::test]
    async fn reports_parseable_local_time() {
        let output = DateTimeTool.execute(json!({})).await.unwrap();
        let stamp = output.strip_prefix("Current time: ").unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[tokio::test]
    async fn ignores_parameters() {
        let output = DateTimeTool
            .execute(json!({"unexpected": true}))
            .await
            .unwrap();
        assert!(output.starts_with("Current time: "));
    }

    #[tokio::test]
    async fn default_schema_is_empty_object() {
        let schema = DateTimeTool.parameter_schema().await;
        assert_eq!(schema, json!({}));
    }
}
