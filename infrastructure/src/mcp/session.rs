//! MCP tool session over a duplex byte stream.
//!
//! [`StdioToolSession`] owns one connection to one MCP server. A single
//! background reader task owns the read half exclusively and routes every
//! incoming frame:
//!
//! - responses are correlated with pending requests through `oneshot` senders
//! - server requests are answered directly (`ping`) or rejected
//! - notifications are logged
//!
//! Writes are serialized through a `Mutex`, independent of the reader. When
//! the stream ends, every pending request observes a closed channel.
//!
//! Sessions are normally spawned as child processes
//! ([`StdioToolSession::spawn`]) but can run over any `AsyncRead`/`AsyncWrite`
//! pair ([`StdioToolSession::connect`]).

use super::error::{McpError, Result};
use super::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut,
    ListResourcesResult, ListToolsResult, METHOD_NOT_FOUND, ReadResourceResult, cursor_params,
};
use super::transport::{MessageKind, classify_message, encode_line};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toolhost_application::{ToolSession, ToolSessionError};
use toolhost_domain::{
    BackendSpec, ResourceContents, ResourceDescriptor, ToolCallResult, ToolDescriptor,
};
use tracing::{debug, info, trace, warn};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type SharedWriter = Arc<Mutex<Option<BufWriter<BoxedWriter>>>>;
type PendingMap = Arc<RwLock<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Timeouts and client identity used by a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Limit for the `initialize` handshake
    pub startup_timeout: Duration,
    /// Limit for every later request
    pub request_timeout: Duration,
    /// Time a server gets to exit after its stdin is closed
    pub shutdown_grace: Duration,
    pub client_info: Implementation,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(180),
            shutdown_grace: Duration::from_millis(2000),
            client_info: Implementation {
                name: "toolhost".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// One open MCP session
pub struct StdioToolSession {
    name: String,
    options: SessionOptions,
    writer: SharedWriter,
    pending: PendingMap,
    server: OnceLock<InitializeResult>,
    reader_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
    /// Child process, when the session owns one
    child: Mutex<Option<Child>>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl StdioToolSession {
    /// Spawn the backend process and perform the handshake.
    pub async fn spawn(name: &str, spec: &BackendSpec, options: SessionOptions) -> Result<Self> {
        debug!(backend = %name, command = %spec, "Spawning MCP server");

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| McpError::Spawn {
            command: spec.command.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Io(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Io(std::io::Error::other("Failed to capture stdout")))?;

        let session = Self::start(name, Box::new(stdout), Box::new(stdin), Some(child), options);
        if let Some(stderr) = session.take_stderr().await {
            session.forward_stderr(stderr);
        }
        session.handshake().await
    }

    /// Run a session over an already connected stream pair.
    pub async fn connect<R, W>(name: &str, reader: R, writer: W, options: SessionOptions) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::start(name, Box::new(reader), Box::new(writer), None, options)
            .handshake()
            .await
    }

    fn start(
        name: &str,
        reader: BoxedReader,
        writer: BoxedWriter,
        child: Option<Child>,
        options: SessionOptions,
    ) -> Self {
        let writer: SharedWriter = Arc::new(Mutex::new(Some(BufWriter::new(writer))));
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let cancel = CancellationToken::new();

        let reader_handle = tokio::spawn(Self::reader_loop(
            name.to_string(),
            BufReader::new(reader),
            Arc::clone(&pending),
            Arc::clone(&writer),
            cancel.clone(),
        ));

        Self {
            name: name.to_string(),
            options,
            writer,
            pending,
            server: OnceLock::new(),
            reader_handle: std::sync::Mutex::new(Some(reader_handle)),
            child: Mutex::new(child),
            cancel,
            closed: AtomicBool::new(false),
        }
    }

    async fn take_stderr(&self) -> Option<tokio::process::ChildStderr> {
        self.child
            .lock()
            .await
            .as_mut()
            .and_then(|child| child.stderr.take())
    }

    /// Forward the server's stderr to the diagnostic log, line by line.
    fn forward_stderr(&self, stderr: tokio::process::ChildStderr) {
        let name = self.name.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => debug!(backend = %name, "stderr: {}", line),
                        _ => break,
                    },
                }
            }
        });
    }

    /// `initialize` request followed by the `initialized` notification.
    ///
    /// On failure the session is closed before the error is returned.
    async fn handshake(self) -> Result<Self> {
        let params = serde_json::to_value(InitializeParams::new(self.options.client_info.clone()))?;

        let result = self
            .request_with_timeout::<InitializeResult>(
                "initialize",
                Some(params),
                Some(self.options.startup_timeout),
            )
            .await;

        let init = match result {
            Ok(init) => init,
            Err(error) => {
                let _ = self.shutdown().await;
                return Err(error);
            }
        };

        if let Err(error) = self.notify("notifications/initialized", None).await {
            let _ = self.shutdown().await;
            return Err(error);
        }

        info!(
            backend = %self.name,
            server = init.server_info.as_ref().map(|s| s.name.as_str()).unwrap_or("unknown"),
            protocol = %init.protocol_version,
            resources = init.capabilities.resources.is_some(),
            "MCP session ready"
        );
        let _ = self.server.set(init);
        Ok(self)
    }

    /// Background reader loop, single owner of the read half.
    ///
    /// Runs until the stream closes, an I/O error occurs or the session is
    /// cancelled. On exit every pending sender is dropped so that waiting
    /// requests fail with [`McpError::TransportClosed`].
    async fn reader_loop(
        name: String,
        mut reader: BufReader<BoxedReader>,
        pending: PendingMap,
        writer: SharedWriter,
        cancel: CancellationToken,
    ) {
        let mut line = String::new();

        loop {
            line.clear();
            let read = tokio::select! {
                _ = cancel.cancelled() => break,
                read = reader.read_line(&mut line) => read,
            };
            match read {
                Ok(0) => {
                    debug!(backend = %name, "Reader loop: stream closed");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(backend = %name, "Reader loop: read error: {}", e);
                    break;
                }
            }

            let frame = line.trim();
            if frame.is_empty() {
                continue;
            }
            trace!(backend = %name, "Received: {}", frame);

            let json_value: Value = match serde_json::from_str(frame) {
                Ok(v) => v,
                Err(e) => {
                    warn!(backend = %name, "Reader loop: failed to parse JSON: {}", e);
                    continue;
                }
            };

            match classify_message(&json_value) {
                MessageKind::Response => {
                    let response: JsonRpcResponse = match serde_json::from_value(json_value) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!(backend = %name, "Reader loop: failed to parse response: {}", e);
                            continue;
                        }
                    };
                    let Some(id) = response.id else {
                        debug!(backend = %name, "Reader loop: response without numeric id");
                        continue;
                    };
                    let sender = pending.write().await.remove(&id);
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => debug!(backend = %name, "Reader loop: no pending request for id={}", id),
                    }
                }

                MessageKind::IncomingRequest { id } => {
                    let method = json_value
                        .get("method")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    let reply = if method == "ping" {
                        JsonRpcResponseOut::result(id, json!({}))
                    } else {
                        warn!(backend = %name, method = %method, "Rejecting unsupported server request");
                        JsonRpcResponseOut::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
                    };
                    if let Err(e) = write_frame(&writer, &reply).await {
                        warn!(backend = %name, "Reader loop: failed to answer server request: {}", e);
                    }
                }

                MessageKind::Notification => {
                    let method = json_value
                        .get("method")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    match method {
                        "notifications/message" => {
                            debug!(backend = %name, "Server log: {}", json_value["params"]);
                        }
                        "notifications/tools/list_changed" => {
                            info!(backend = %name, "Server tool list changed, catalog is kept as loaded");
                        }
                        other => trace!(backend = %name, "Notification: {}", other),
                    }
                }
            }
        }

        pending.write().await.clear();
    }

    /// Send a request and wait for its response, bounded by the request
    /// timeout (or `timeout` when given).
    async fn request_with_timeout<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<T> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::Closed);
        }

        let request = JsonRpcRequest::new(method, params);
        let request_id = request.id;
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(request_id, tx);

        if let Err(e) = write_frame(&self.writer, &request).await {
            // Clean up the pending entry to prevent leaks
            self.pending.write().await.remove(&request_id);
            return Err(e);
        }

        let limit = timeout.unwrap_or(self.options.request_timeout);
        let response = match tokio::time::timeout(limit, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(McpError::TransportClosed),
            Err(_) => {
                self.pending.write().await.remove(&request_id);
                return Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout: limit,
                });
            }
        };

        let result = response.into_result().map_err(|e| McpError::Rpc {
            code: e.code,
            message: e.message,
        })?;
        serde_json::from_value(result).map_err(|e| McpError::InvalidResponse {
            method: method.to_string(),
            message: e.to_string(),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        self.request_with_timeout(method, params, None).await
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        write_frame(&self.writer, &JsonRpcNotification::new(method, params)).await
    }

    /// Whether the server advertised resource support
    pub fn supports_resources(&self) -> bool {
        self.server
            .get()
            .is_some_and(|init| init.capabilities.resources.is_some())
    }

    pub async fn fetch_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: ListToolsResult = self
                .request("tools/list", cursor_params(cursor.as_deref()))
                .await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams { name, arguments })?;
        self.request("tools/call", Some(params)).await
    }

    pub async fn fetch_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        let mut resources = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: ListResourcesResult = self
                .request("resources/list", cursor_params(cursor.as_deref()))
                .await?;
            resources.extend(page.resources);
            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(resources)
    }

    pub async fn fetch_resource(&self, uri: &str) -> Result<Vec<ResourceContents>> {
        let result: ReadResourceResult = self
            .request("resources/read", Some(json!({ "uri": uri })))
            .await?;
        Ok(result.contents)
    }

    /// Tear down the channel exactly once.
    ///
    /// Closes the server's stdin, waits up to the grace period for the
    /// process to exit and kills it otherwise. Later calls return `Ok(())`.
    pub async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(backend = %self.name, "Closing MCP session");

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = writer.shutdown().await;
        }

        let mut outcome = Ok(());
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            match tokio::time::timeout(self.options.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => debug!(backend = %self.name, %status, "MCP server exited"),
                Ok(Err(e)) => outcome = Err(McpError::Io(e)),
                Err(_) => {
                    warn!(backend = %self.name, "MCP server did not exit, killing it");
                    if let Err(e) = child.kill().await {
                        outcome = Err(McpError::Io(e));
                    }
                }
            }
        }

        self.cancel.cancel();
        let handle = self
            .reader_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.pending.write().await.clear();

        outcome
    }
}

/// Serialize `message` and write it as one line.
async fn write_frame<T: Serialize>(writer: &SharedWriter, message: &T) -> Result<()> {
    let line = encode_line(message)?;
    trace!("Sending: {}", line.trim_end());

    let mut guard = writer.lock().await;
    let writer = guard.as_mut().ok_or(McpError::Closed)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl ToolSession for StdioToolSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolSessionError> {
        self.fetch_tools()
            .await
            .map_err(McpError::into_session_error)
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<ToolCallResult, ToolSessionError> {
        match self.call_tool(name, arguments).await {
            Ok(result) if result.is_error => {
                let message = ToolCallResult::new(result.content).render_text();
                Err(ToolSessionError::ToolExecution(message))
            }
            Ok(result) => Ok(ToolCallResult::new(result.content)),
            // The server rejected the call itself (unknown tool, bad params)
            Err(McpError::Rpc { message, .. }) => Err(ToolSessionError::ToolExecution(message)),
            Err(error) => Err(error.into_session_error()),
        }
    }

    async fn list_resources(&self) -> std::result::Result<Vec<ResourceDescriptor>, ToolSessionError> {
        if !self.supports_resources() {
            return Ok(Vec::new());
        }
        self.fetch_resources()
            .await
            .map_err(McpError::into_session_error)
    }

    async fn read_resource(
        &self,
        uri: &str,
    ) -> std::result::Result<Vec<ResourceContents>, ToolSessionError> {
        match self.fetch_resource(uri).await {
            Err(McpError::Rpc { message, .. }) => Err(ToolSessionError::ToolExecution(message)),
            other => other.map_err(McpError::into_session_error),
        }
    }

    async fn close(&self) -> std::result::Result<(), ToolSessionError> {
        self.shutdown()
            .await
            .map_err(McpError::into_session_error)
    }
}

impl Drop for StdioToolSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(mut guard) = self.child.try_lock()
            && let Some(child) = guard.as_mut()
        {
            debug!(backend = %self.name, "StdioToolSession dropping, killing MCP server");
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};
    use tokio::sync::mpsc;

    type Handler = Box<dyn Fn(&str, &Value) -> Option<std::result::Result<Value, (i64, String)>> + Send>;

    /// In-memory MCP server. `handler` returns `None` to leave a request
    /// unanswered. Every frame the server receives is forwarded to the
    /// returned channel.
    fn fake_server(
        stream: DuplexStream,
        capabilities: Value,
        handler: Handler,
    ) -> mpsc::UnboundedReceiver<Value> {
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        let (read, mut write): (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>) = split(stream);
        tokio::spawn(async move {
            let mut lines = BufReader::new(read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let frame: Value = serde_json::from_str(&line).unwrap();
                let _ = seen_tx.send(frame.clone());
                let (Some(id), Some(method)) = (frame.get("id"), frame["method"].as_str()) else {
                    // notification or response to a server request
                    if frame["method"] == "notifications/initialized" {
                        let ping = json!({"jsonrpc": "2.0", "id": "srv-ping", "method": "ping"});
                        let _ = write.write_all(format!("{}\n", ping).as_bytes()).await;
                    }
                    continue;
                };
                let reply = if method == "initialize" {
                    Some(Ok(json!({
                        "protocolVersion": "2024-11-05",
                        "capabilities": capabilities.clone(),
                        "serverInfo": {"name": "fake", "version": "1.0"}
                    })))
                } else {
                    handler(method, &frame["params"])
                };
                let Some(reply) = reply else { continue };
                let message = match reply {
                    Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                    Err((code, message)) => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": code, "message": message}
                    }),
                };
                if write
                    .write_all(format!("{}\n", message).as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
        seen_rx
    }

    async fn connect_with(
        capabilities: Value,
        handler: Handler,
        options: SessionOptions,
    ) -> (Result<StdioToolSession>, mpsc::UnboundedReceiver<Value>) {
        let (client, server) = duplex(64 * 1024);
        let seen = fake_server(server, capabilities, handler);
        let (read, write) = split(client);
        (
            StdioToolSession::connect("fake", read, write, options).await,
            seen,
        )
    }

    fn design_handler() -> Handler {
        Box::new(|method: &str, params: &Value| match method {
            "tools/list" => match params.get("cursor").and_then(|c| c.as_str()) {
                None => Some(Ok(json!({
                    "tools": [{"name": "listComponents", "description": "List components",
                               "inputSchema": {"type": "object", "properties": {}}}],
                    "nextCursor": "2"
                }))),
                Some(_) => Some(Ok(json!({
                    "tools": [{"name": "getDocs", "inputSchema": {"type": "object"}}]
                }))),
            },
            "tools/call" => match params["name"].as_str() {
                Some("listComponents") => Some(Ok(json!({
                    "content": [{"type": "text", "text": "[\"Button\",\"TextBox\"]"}]
                }))),
                Some("getDocs") => Some(Ok(json!({
                    "content": [{"type": "text", "text": "component not found"}],
                    "isError": true
                }))),
                Some("slow") => None,
                Some("garbled") => Some(Ok(json!({"content": "not a list"}))),
                _ => Some(Err((-32602, "Unknown tool".to_string()))),
            },
            "resources/list" => Some(Ok(json!({
                "resources": [{"uri": "markdown://acme/component/Button", "name": "Button"}]
            }))),
            "resources/read" => Some(Ok(json!({
                "contents": [{"uri": params["uri"], "mimeType": "text/markdown", "text": "# Button"}]
            }))),
            _ => Some(Err((METHOD_NOT_FOUND, "Method not found".to_string()))),
        })
    }

    #[tokio::test]
    async fn test_handshake_and_paginated_tool_listing() {
        let (session, mut seen) =
            connect_with(json!({"tools": {}}), design_handler(), SessionOptions::default()).await;
        let session = session.unwrap();

        assert!(!session.supports_resources());

        let initialize = seen.recv().await.unwrap();
        assert_eq!(initialize["method"], "initialize");
        assert_eq!(initialize["params"]["protocolVersion"], "2024-11-05");
        let initialized = seen.recv().await.unwrap();
        assert_eq!(initialized["method"], "notifications/initialized");

        let tools = session.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["listComponents", "getDocs"]);
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        let (session, mut seen) =
            connect_with(json!({}), design_handler(), SessionOptions::default()).await;
        let _session = session.unwrap();

        // initialize, initialized, then our ping reply
        let _ = seen.recv().await.unwrap();
        let _ = seen.recv().await.unwrap();
        let reply = seen.recv().await.unwrap();
        assert_eq!(reply["id"], "srv-ping");
        assert_eq!(reply["result"], json!({}));
    }

    #[tokio::test]
    async fn test_invoke_results_and_errors() {
        let (session, _seen) =
            connect_with(json!({"tools": {}}), design_handler(), SessionOptions::default()).await;
        let session = session.unwrap();

        let result = session.invoke("listComponents", json!({})).await.unwrap();
        assert_eq!(result.render_text(), "[\"Button\",\"TextBox\"]");
        assert!(!result.is_error);

        let err = session.invoke("getDocs", json!({})).await.unwrap_err();
        assert_eq!(err, ToolSessionError::ToolExecution("component not found".into()));

        let err = session.invoke("nope", json!({})).await.unwrap_err();
        assert_eq!(err, ToolSessionError::ToolExecution("Unknown tool".into()));

        let err = session.invoke("garbled", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolSessionError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_request_timeout_is_protocol_error() {
        let options = SessionOptions {
            request_timeout: Duration::from_millis(50),
            ..SessionOptions::default()
        };
        let (session, _seen) = connect_with(json!({}), design_handler(), options).await;
        let session = session.unwrap();

        let err = session.invoke("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolSessionError::Protocol(ref m) if m.contains("timed out")));
        assert!(session.pending.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_handshake_error_fails_connect() {
        let (client, server) = duplex(4096);
        let (read, mut write) = split(server);
        tokio::spawn(async move {
            let mut lines = BufReader::new(read).lines();
            if let Ok(Some(line)) = lines.next_line().await {
                let frame: Value = serde_json::from_str(&line).unwrap();
                let reply = json!({
                    "jsonrpc": "2.0",
                    "id": frame["id"],
                    "error": {"code": -32600, "message": "unsupported protocol version"}
                });
                let _ = write.write_all(format!("{}\n", reply).as_bytes()).await;
            }
        });

        let (read, write) = split(client);
        let err = StdioToolSession::connect("fake", read, write, SessionOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Rpc { code: -32600, .. }));
        assert!(matches!(
            err.into_connection_error(),
            ToolSessionError::Connection(_)
        ));
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let (client, _server) = duplex(4096);
        let (read, write) = split(client);
        let options = SessionOptions {
            startup_timeout: Duration::from_millis(50),
            ..SessionOptions::default()
        };
        let err = StdioToolSession::connect("silent", read, write, options)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Timeout { ref method, .. } if method == "initialize"));
    }

    #[tokio::test]
    async fn test_stream_end_fails_pending_requests() {
        let (client, server) = duplex(4096);
        let (read, mut write) = split(server);
        tokio::spawn(async move {
            let mut lines = BufReader::new(read).lines();
            // answer initialize, swallow the notification, then hang up
            // on the next request
            let line = lines.next_line().await.unwrap().unwrap();
            let frame: Value = serde_json::from_str(&line).unwrap();
            let reply = json!({"jsonrpc": "2.0", "id": frame["id"],
                               "result": {"protocolVersion": "2024-11-05", "capabilities": {}}});
            write.write_all(format!("{}\n", reply).as_bytes()).await.unwrap();
            let _ = lines.next_line().await;
            let _ = lines.next_line().await;
            drop(write);
        });

        let (read, write) = split(client);
        let session = StdioToolSession::connect("flaky", read, write, SessionOptions::default())
            .await
            .unwrap();
        let err = session.invoke("anything", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolSessionError::Connection(_)));
    }

    #[tokio::test]
    async fn test_resources_when_advertised() {
        let (session, _seen) = connect_with(
            json!({"tools": {}, "resources": {}}),
            design_handler(),
            SessionOptions::default(),
        )
        .await;
        let session = session.unwrap();

        let resources = session.list_resources().await.unwrap();
        assert_eq!(resources[0].uri, "markdown://acme/component/Button");
        let contents = session
            .read_resource("markdown://acme/component/Button")
            .await
            .unwrap();
        assert_eq!(contents[0].text.as_deref(), Some("# Button"));
        assert_eq!(contents[0].mime_type.as_deref(), Some("text/markdown"));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (session, _seen) =
            connect_with(json!({}), design_handler(), SessionOptions::default()).await;
        let session = session.unwrap();

        session.close().await.unwrap();
        session.close().await.unwrap();

        let err = session.list_tools().await.unwrap_err();
        assert!(matches!(err, ToolSessionError::Connection(_)));
    }

    #[tokio::test]
    async fn test_spawn_missing_command() {
        let spec = BackendSpec::new("/nonexistent/toolhost-test-server");
        let err = StdioToolSession::spawn("missing", &spec, SessionOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Spawn { .. }));
    }
}
