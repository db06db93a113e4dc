//! Integration tests for `HttpCompletionModel` against a raw TCP server.
//!
//! The server plays back one canned HTTP response per connection, which
//! is enough to exercise success, retry, and classification paths
//! without any external endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use otto_llm::{CompletionModel, HttpCompletionModel, RetryConfig};
use otto_types::LlmError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ---------------------------------------------------------------------------
// Canned responses
// ---------------------------------------------------------------------------

fn http_200_completion(content: &str) -> String {
    let body = format!(
        r#"{{"id":"cmpl-1","choices":[{{"index":0,"message":{{"role":"assistant","content":"{content}"}},"finish_reason":"stop"}}]}}"#
    );
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_500_response() -> String {
    let body = r#"{"error":{"message":"internal error"}}"#;
    format!(
        "HTTP/1.1 500 Internal Server Error\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_429_response() -> String {
    let body = r#"{"error":{"message":"rate limited"}}"#;
    format!(
        "HTTP/1.1 429 Too Many Requests\r\n\
         Content-Type: application/json\r\n\
         Retry-After: 0.01\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_401_response() -> String {
    let body = r#"{"error":{"message":"invalid api key"}}"#;
    format!(
        "HTTP/1.1 401 Unauthorized\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_200_garbage() -> String {
    let body = "definitely not json";
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

// ---------------------------------------------------------------------------
// Test server
// ---------------------------------------------------------------------------

/// Serve one pre-configured response per incoming connection. Returns the
/// base URL and the connection counter, or `None` when the sandbox does
/// not allow binding a local socket.
async fn start_test_server(responses: Vec<String>) -> Option<(String, Arc<AtomicUsize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);

    tokio::spawn(async move {
        let responses = Arc::new(responses);
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let idx = counter_clone.fetch_add(1, Ordering::SeqCst);
            let responses = Arc::clone(&responses);

            tokio::spawn(async move {
                // Consume the request so the client is not left hanging.
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;

                let response = responses
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(http_500_response);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Some((format!("http://{addr}/v1"), counter))
}

fn fast_retries() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay_ms: 10,
        max_delay_ms: 100,
        backoff_factor: 2.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completion_extracts_message_content() {
    let Some((base_url, counter)) =
        start_test_server(vec![http_200_completion("Final Answer: 42")]).await
    else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model").unwrap();
    let text = model.complete("what is six times seven?").await.unwrap();

    assert_eq!(text, "Final Answer: 42");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let Some((base_url, counter)) =
        start_test_server(vec![http_500_response(), http_200_completion("recovered")]).await
    else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model")
        .unwrap()
        .with_retry_config(fast_retries());
    let text = model.complete("hello").await.unwrap();

    assert_eq!(text, "recovered");
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rate_limit_respects_retry_after_header() {
    let Some((base_url, counter)) =
        start_test_server(vec![http_429_response(), http_200_completion("after wait")]).await
    else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model")
        .unwrap()
        .with_retry_config(fast_retries());
    let text = model.complete("hello").await.unwrap();

    assert_eq!(text, "after wait");
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let Some((base_url, counter)) = start_test_server(vec![http_401_response()]).await else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model")
        .unwrap()
        .with_api_key("bogus")
        .with_retry_config(fast_retries());
    let err = model.complete("hello").await.unwrap_err();

    match err {
        LlmError::Auth { message } => assert_eq!(message, "invalid api key"),
        other => panic!("Expected Auth, got: {other:?}"),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_retries_return_last_error() {
    let Some((base_url, counter)) = start_test_server(vec![
        http_500_response(),
        http_500_response(),
        http_500_response(),
    ])
    .await
    else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model")
        .unwrap()
        .with_retry_config(fast_retries());
    let err = model.complete("hello").await.unwrap_err();

    assert!(matches!(err, LlmError::Server { status: 500, .. }));
    // One initial attempt plus two retries.
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unparseable_success_body_is_malformed() {
    let Some((base_url, _counter)) = start_test_server(vec![http_200_garbage()]).await else {
        return;
    };

    let model = HttpCompletionModel::new(base_url, "test-model").unwrap();
    let err = model.complete("hello").await.unwrap_err();

    assert!(matches!(err, LlmError::MalformedResponse(_)));
}
