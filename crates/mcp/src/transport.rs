//! Stdio transport: spawn a child process and exchange newline-delimited
//! JSON-RPC over its stdin/stdout.

use std::{
    collections::HashMap,
    process::Stdio,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        process::{Child, ChildStdin, ChildStdout, Command},
        sync::{Mutex, oneshot},
        task::JoinHandle,
    },
    tracing::{debug, info, trace, warn},
};

use crate::{
    error::{Error, McpTransportError, ProtocolError, Result},
    traits::McpTransport,
    types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse},
};

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<JsonRpcResponse>>>>;

/// Stdio-based transport for an MCP server process.
///
/// The child is killed when the transport is closed or dropped.
pub struct StdioTransport {
    command: String,
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    /// Set by the reader once stdout is gone, before `pending` is cleared.
    exited: Arc<AtomicBool>,
    next_id: AtomicU64,
    timeout: Duration,
    reader: JoinHandle<()>,
    stderr_reader: Option<JoinHandle<()>>,
}

impl StdioTransport {
    /// Spawn the server process and start the reader loop.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        info!(command, ?args, "spawning MCP server process");

        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpTransportError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpTransportError::Stdio {
                command: command.to_string(),
            }
            .into());
        };

        let stderr_reader = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        warn!(stderr = %trimmed, "MCP server stderr");
                    }
                }
            })
        });

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let exited = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_responses(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&exited),
        ));

        Ok(Self {
            command: command.to_string(),
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            pending,
            exited,
            next_id: AtomicU64::new(1),
            timeout,
            reader,
            stderr_reader,
        })
    }

    async fn write_line(&self, payload: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(payload.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }
}

/// Route each response line to the request waiting on its id.
///
/// Lines carrying a `method` are server-initiated requests or notifications
/// and are ignored. When stdout closes every waiter is released and `exited`
/// stays set, so later requests fail fast.
async fn read_responses(stdout: ChildStdout, pending: PendingMap, exited: Arc<AtomicBool>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                trace!(raw = %trimmed, "MCP server -> client");

                let value = match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!(error = %e, line = %trimmed, "MCP server sent non-JSON line");
                        continue;
                    },
                };
                if value.get("method").is_some() {
                    debug!("ignoring server-initiated message");
                    continue;
                }
                match serde_json::from_value::<JsonRpcResponse>(value) {
                    Ok(resp) => {
                        let key = resp.id.to_string();
                        if let Some(tx) = pending.lock().await.remove(&key) {
                            let _ = tx.send(resp);
                        } else {
                            warn!(id = %key, "received response for unknown request id");
                        }
                    },
                    Err(e) => debug!(error = %e, "MCP server sent non-response message"),
                }
            },
            Ok(None) => {
                debug!("MCP server stdout closed");
                break;
            },
            Err(e) => {
                warn!(error = %e, "error reading from MCP server stdout");
                break;
            },
        }
    }
    exited.store(true, Ordering::SeqCst);
    pending.lock().await.clear();
}

#[async_trait::async_trait]
impl McpTransport for StdioTransport {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let req = JsonRpcRequest::new(id, method, params);
        let id_key = req.id.to_string();

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id_key.clone(), tx);
        if self.exited.load(Ordering::SeqCst) {
            self.pending.lock().await.remove(&id_key);
            return Err(McpTransportError::Closed {
                method: method.to_string(),
            }
            .into());
        }

        let payload = serde_json::to_string(&req)?;
        debug!(method, id, command = %self.command, "client -> MCP server");

        if let Err(e) = self.write_line(&payload).await {
            self.pending.lock().await.remove(&id_key);
            return Err(e);
        }

        let resp = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => {
                return Err(McpTransportError::Closed {
                    method: method.to_string(),
                }
                .into());
            },
            Err(_) => {
                self.pending.lock().await.remove(&id_key);
                return Err(McpTransportError::Timeout {
                    method: method.to_string(),
                    secs: self.timeout.as_secs(),
                }
                .into());
            },
        };

        if let Some(err) = &resp.error {
            return Err(ProtocolError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message.clone(),
            }
            .into());
        }

        Ok(resp)
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<()> {
        let payload = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        trace!(method, "client -> MCP server (notification)");
        self.write_line(&payload).await
    }

    async fn close(&self) {
        self.reader.abort();
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            debug!(command = %self.command, error = %e, "MCP server already exited");
        }
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.reader.abort();
        if let Some(handle) = &self.stderr_reader {
            handle.abort();
        }
    }
}
