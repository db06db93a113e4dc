//! Stdio transport for MCP provider communication.
//!
//! Spawns a provider process and manages async communication over its
//! stdin/stdout using newline-delimited JSON-RPC messages. A writer task
//! serializes all outbound frames, a reader task correlates inbound
//! responses with waiting callers by request id, and a third task drains
//! stderr so the child can never block on a full pipe.

use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};

/// Request ids stay within a fixed non-negative 32-bit range so they
/// remain small and unambiguous for the lifetime of a connection.
const REQUEST_ID_MASK: u64 = 0xFFFF_FFFF;

/// How long a closing transport waits for the child to exit on its own.
const GRACEFUL_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One in-flight request: when it was sent and the slot its response
/// will be delivered into.
struct PendingRequest {
    sent_at: Instant,
    tx: oneshot::Sender<JsonRpcResponse>,
}

/// Async stdio transport for one MCP provider process.
pub struct StdioTransport {
    name: String,
    next_id: AtomicU64,
    running: AtomicBool,
    write_tx: Mutex<Option<mpsc::Sender<String>>>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    child: Mutex<Child>,
    timeout_ms: u64,
}

impl StdioTransport {
    /// Spawn the provider process and start the background I/O tasks.
    pub fn spawn(
        name: &str,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout_ms: u64,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: name.to_string(),
            source: e,
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let pending: Arc<Mutex<HashMap<u64, PendingRequest>>> =
            Arc::new(Mutex::new(HashMap::new()));

        // Writer task: the single owner of child stdin. Every outbound
        // frame funnels through this channel, so concurrent callers can
        // never interleave partial lines.
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        // Reader task: parses stdout lines and routes each response to
        // the caller waiting on its id. Exits on end-of-stream once the
        // child is gone.
        let pending_for_reader = Arc::clone(&pending);
        let reader_name = name.to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if !trimmed.starts_with('{') {
                    // Providers sometimes print banners or logs to stdout.
                    tracing::debug!("provider '{reader_name}' noise on stdout: {trimmed}");
                    continue;
                }
                let resp: JsonRpcResponse = match serde_json::from_str(trimmed) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("unparseable frame from provider '{reader_name}': {e}");
                        continue;
                    }
                };
                if let Some(id) = resp.id {
                    let mut pending = pending_for_reader.lock().await;
                    if let Some(entry) = pending.remove(&id) {
                        let _ = entry.tx.send(resp);
                    } else {
                        // Response to a request that already timed out.
                        tracing::debug!(
                            "provider '{reader_name}' answered orphaned request {id}"
                        );
                    }
                }
                // Frames without an id are provider notifications; ignored.
            }
        });

        // Stderr drain: keeps the pipe from filling and surfaces provider
        // diagnostics at debug level.
        let stderr_name = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                tracing::debug!("provider '{stderr_name}' stderr: {line}");
            }
        });

        Ok(Self {
            name: name.to_string(),
            next_id: AtomicU64::new(1),
            running: AtomicBool::new(true),
            write_tx: Mutex::new(Some(write_tx)),
            pending,
            child: Mutex::new(child),
            timeout_ms,
        })
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) & REQUEST_ID_MASK
    }

    /// Whether the transport still accepts requests.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    async fn send_line(&self, line: String) -> Result<(), McpError> {
        let tx = { self.write_tx.lock().await.clone() };
        let Some(tx) = tx else {
            return Err(McpError::NotRunning {
                name: self.name.clone(),
            });
        };
        tx.send(line).await.map_err(|_| McpError::Protocol {
            name: self.name.clone(),
            message: "writer channel closed".to_string(),
        })
    }

    /// Send a JSON-RPC request and wait for its correlated response.
    ///
    /// On timeout the pending entry is removed, so a response arriving
    /// late finds no waiter and is dropped by the reader.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        if !self.is_running() {
            return Err(McpError::NotRunning {
                name: self.name.clone(),
            });
        }

        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, method, params);
        let serialized = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(
                id,
                PendingRequest {
                    sent_at: Instant::now(),
                    tx,
                },
            );
        }

        if let Err(e) = self.send_line(serialized).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(McpError::Protocol {
                name: self.name.clone(),
                message: "response channel dropped".to_string(),
            }),
            Err(_) => {
                // Orphan the request so the reader drops any late answer.
                if let Some(entry) = self.pending.lock().await.remove(&id) {
                    tracing::warn!(
                        "request {id} ({method}) to provider '{}' timed out after {:?}",
                        self.name,
                        entry.sent_at.elapsed()
                    );
                }
                Err(McpError::Timeout {
                    name: self.name.clone(),
                    method: method.to_string(),
                    timeout_ms: self.timeout_ms,
                })
            }
        }
    }

    /// Send a JSON-RPC notification (fire-and-forget, no response expected).
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        if !self.is_running() {
            return Err(McpError::NotRunning {
                name: self.name.clone(),
            });
        }
        let notification = JsonRpcNotification::new(method, params);
        let serialized = serde_json::to_string(&notification)?;
        self.send_line(serialized).await
    }

    /// Close the transport and terminate the provider process.
    ///
    /// Safe to call more than once; later calls return immediately. The
    /// shutdown and exit notifications are best effort, then dropping
    /// the write channel sends EOF to child stdin. A child that does not
    /// exit within the grace period is killed. The reader tasks exit on
    /// their own once the child is gone.
    pub async fn close(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("closing transport for provider '{}'", self.name);

        for method in ["shutdown", "notifications/exit"] {
            let note = JsonRpcNotification::new(method, Some(serde_json::json!({})));
            if let Ok(serialized) = serde_json::to_string(&note) {
                let tx = { self.write_tx.lock().await.clone() };
                if let Some(tx) = tx {
                    let _ = tx.send(serialized).await;
                }
            }
        }

        // Dropping the only sender lets the writer drain and exit, which
        // closes child stdin.
        self.write_tx.lock().await.take();

        let graceful = tokio::time::timeout(GRACEFUL_EXIT_TIMEOUT, async {
            let mut child = self.child.lock().await;
            let _ = child.wait().await;
        })
        .await;

        if graceful.is_err() {
            tracing::warn!(
                "provider '{}' ignored shutdown, killing process",
                self.name
            );
            let mut child = self.child.lock().await;
            let _ = child.kill().await;
        }
    }
}
