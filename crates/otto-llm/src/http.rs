//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint speaking the `/chat/completions` shape,
//! which covers OpenAI itself, Ollama, vLLM, and most local gateways.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use otto_types::LlmError;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::model::CompletionModel;
use crate::retry::{RetryConfig, is_retryable};

/// Completion model backed by an HTTP chat-completions endpoint.
#[derive(Clone)]
pub struct HttpCompletionModel {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    retry_config: RetryConfig,
}

impl HttpCompletionModel {
    /// Create a client for `model` served at `base_url` (the prefix before
    /// `/chat/completions`, e.g. `http://localhost:11434/v1`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2000,
            retry_config: RetryConfig::default(),
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the retry behavior for transient errors (429, 5xx, network).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    async fn complete_inner(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let body = serde_json::to_string(&ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
        .map_err(|e| LlmError::BadRequest {
            message: format!("failed to serialize request: {e}"),
        })?;

        for attempt in 0..=self.retry_config.max_retries {
            tracing::debug!(
                "POST {url} (attempt {}/{})",
                attempt + 1,
                self.retry_config.max_retries + 1
            );

            let mut request = self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| LlmError::Network(e.to_string()))?;
                        return extract_content(&text);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body_text = response.text().await.unwrap_or_default();
                    let err = classify_error(status.as_u16(), &body_text, retry_after);

                    if !is_retryable(&err) || attempt == self.retry_config.max_retries {
                        return Err(err);
                    }

                    let delay = self.retry_config.delay_for(attempt, retry_after);
                    tracing::warn!(
                        "retryable completion error (attempt {}/{}): {err}, retrying in {delay}ms",
                        attempt + 1,
                        self.retry_config.max_retries,
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        LlmError::Timeout
                    } else {
                        LlmError::Network(e.to_string())
                    };

                    if attempt == self.retry_config.max_retries {
                        return Err(err);
                    }

                    let delay = self.retry_config.delay_for(attempt, None);
                    tracing::warn!(
                        "retryable network error (attempt {}/{}): {err}, retrying in {delay}ms",
                        attempt + 1,
                        self.retry_config.max_retries,
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }

        // Unreachable: the loop always returns on the last attempt
        unreachable!("retry loop should have returned")
    }
}

impl CompletionModel for HttpCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.complete_inner(prompt))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a completion response body.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("unparseable response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response carried no choices".to_string()))
}

/// Parse the `retry-after` header value as seconds, in milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed [`LlmError`].
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> LlmError {
    let message = error_message(body).unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => LlmError::Auth { message },
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after,
        },
        400..=499 => LlmError::BadRequest { message },
        _ => LlmError::Server { status, message },
    }
}

/// Best-effort extraction of the error message from a response body.
///
/// OpenAI-style bodies nest `{"error": {"message": ...}}`; Ollama puts a
/// plain string under `error`. Both are accepted.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorField>,
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Detail(ErrorDetail),
        Text(String),
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error? {
        ErrorField::Detail(detail) => detail.message,
        ErrorField::Text(text) => Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn extract_content_reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Final Answer: 4"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Final Answer: 4");
    }

    #[test]
    fn extract_content_rejects_empty_choices() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn extract_content_rejects_invalid_json() {
        let err = extract_content("not json").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn parse_retry_after_integer_and_float() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(parse_retry_after(&headers), Some(5000));

        headers.insert("retry-after", HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(1500));
    }

    #[test]
    fn parse_retry_after_missing_or_invalid() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn classify_error_by_status() {
        assert!(matches!(
            classify_error(401, r#"{"error":{"message":"bad key"}}"#, None),
            LlmError::Auth { .. }
        ));
        assert!(matches!(
            classify_error(404, r#"{"error":"model not found"}"#, None),
            LlmError::BadRequest { .. }
        ));
        assert!(matches!(
            classify_error(429, "{}", Some(3000)),
            LlmError::RateLimited {
                retry_after_ms: Some(3000),
            }
        ));
        assert!(matches!(
            classify_error(503, "overloaded", None),
            LlmError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn error_message_handles_both_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"nested"}}"#),
            Some("nested".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"plain"}"#),
            Some("plain".to_string())
        );
        assert_eq!(error_message("…"), None);
    }
}
