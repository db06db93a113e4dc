//! Calculator tool — basic arithmetic on two operands.

use std::future::Future;
use std::pin::Pin;

use otto_types::{Tool, ToolError};
use serde::Deserialize;
use serde_json::Value;

/// Tool for add/subtract/multiply/divide/power on two numbers.
///
/// Operands may arrive as JSON numbers or numeric strings; models are
/// not reliable about quoting.
pub struct CalculatorTool;

#[derive(Deserialize)]
struct CalculatorInput {
    a: Value,
    b: Value,
    operation: String,
}

fn to_number(value: &Value, field: &str) -> Result<f64, ToolError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| ToolError::InvalidInput {
            tool: "calculator".into(),
            message: format!("'{field}' is not representable as a number"),
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| ToolError::InvalidInput {
            tool: "calculator".into(),
            message: format!("'{field}' is not a number: {s:?}"),
        }),
        other => Err(ToolError::InvalidInput {
            tool: "calculator".into(),
            message: format!("'{field}' must be a number, got {other}"),
        }),
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Performs basic arithmetic. Parameters: a, b (numbers), operation \
         (add, subtract, multiply, divide, power)."
    }

    fn parameter_schema(&self) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(std::future::ready(serde_json::json!({
            "type": "object",
            "required": ["a", "b", "operation"],
            "properties": {
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" },
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide", "power"]
                }
            }
        })))
    }

    fn execute(
        &self,
        params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let input: CalculatorInput =
                serde_json::from_value(params).map_err(|e| ToolError::InvalidInput {
                    tool: "calculator".into(),
                    message: e.to_string(),
                })?;

            let a = to_number(&input.a, "a")?;
            let b = to_number(&input.b, "b")?;
            let operation = input.operation.to_lowercase();

            let result = match operation.as_str() {
                "add" => a + b,
                "subtract" => a - b,
                "multiply" => a * b,
                // Division by zero yields NaN rather than an error.
                "divide" if b == 0.0 => f64::NAN,
                "divide" => a / b,
                "power" => a.powf(b),
                other => {
                    return Err(ToolError::InvalidInput {
                        tool: "calculator".into(),
                        message: format!("unknown operation: {other}"),
                    });
                }
            };

            Ok(format!("{a:.2} {operation} {b:.2} = {result:.4}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn adds_two_numbers() {
        let output = CalculatorTool
            .execute(json!({"a": 2, "b": 2, "operation": "add"}))
            .await
            .unwrap();
        assert_eq!(output, "2.00 add 2.00 = 4.0000");
    }

    #[tokio::test]
    async fn operation_is_case_insensitive() {
        let output = CalculatorTool
            .execute(json!({"a": 3, "b": 4, "operation": "Multiply"}))
            .await
            .unwrap();
        assert_eq!(output, "3.00 multiply 4.00 = 12.0000");
    }

    #[tokio::test]
    async fn accepts_numeric_strings() {
        let output = CalculatorTool
            .execute(json!({"a": "10", "b": " 4 ", "operation": "subtract"}))
            .await
            .unwrap();
        assert_eq!(output, "10.00 subtract 4.00 = 6.0000");
    }

    #[tokio::test]
    async fn divide_by_zero_yields_nan() {
        let output = CalculatorTool
            .execute(json!({"a": 1, "b": 0, "operation": "divide"}))
            .await
            .unwrap();
        assert_eq!(output, "1.00 divide 0.00 = NaN");
    }

    #[tokio::test]
    async fn power_raises() {
        let output = CalculatorTool
            .execute(json!({"a": 2, "b": 10, "operation": "power"}))
            .await
            .unwrap();
        assert_eq!(output, "2.00 power 10.00 = 1024.0000");
    }

    #[tokio::test]
    async fn unknown_operation_is_invalid_input() {
        let err = CalculatorTool
            .execute(json!({"a": 1, "b": 2, "operation": "modulo"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn missing_operand_is_invalid_input() {
        let err = CalculatorTool
            .execute(json!({"a": 1, "operation": "add"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn non_numeric_operand_is_invalid_input() {
        let err = CalculatorTool
            .execute(json!({"a": true, "b": 2, "operation": "add"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn schema_lists_operations() {
        let schema = CalculatorTool.parameter_schema().await;
        assert_eq!(schema["properties"]["operation"]["enum"][0], "add");
    }
}
