//! In-memory fakes for the application ports, shared by unit tests.

use crate::ports::inference::{AssistantTurn, InferenceError, InferenceProvider, InferenceRequest};
use crate::ports::tool_session::{ToolSession, ToolSessionConnector, ToolSessionError};
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolhost_domain::{
    BackendSpec, Message, ResourceContents, ResourceDescriptor, ToolCallResult, ToolDescriptor,
};

/// Tool session that answers every call with `"<session>:<tool>"`
pub struct FakeSession {
    name: String,
    tools: Vec<ToolDescriptor>,
    resources: Vec<(ResourceDescriptor, String)>,
    responses: HashMap<String, ToolCallResult>,
    invoke_errors: HashMap<String, ToolSessionError>,
    delays: HashMap<String, Duration>,
    list_error: Option<ToolSessionError>,
    close_error: Option<ToolSessionError>,
    invocations: Mutex<Vec<String>>,
    arguments: Mutex<Vec<Value>>,
    closes: AtomicUsize,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl FakeSession {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tools: Vec::new(),
            resources: Vec::new(),
            responses: HashMap::new(),
            invoke_errors: HashMap::new(),
            delays: HashMap::new(),
            list_error: None,
            close_error: None,
            invocations: Mutex::new(Vec::new()),
            arguments: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            journal: None,
        }
    }

    pub fn with_tools(mut self, names: &[&str]) -> Self {
        for name in names {
            self.tools
                .push(ToolDescriptor::new(*name, format!("{} {}", self.name, name)));
        }
        self
    }

    pub fn with_response(mut self, tool: &str, result: ToolCallResult) -> Self {
        self.responses.insert(tool.to_string(), result);
        self
    }

    pub fn with_invoke_error(mut self, tool: &str, error: ToolSessionError) -> Self {
        self.invoke_errors.insert(tool.to_string(), error);
        self
    }

    pub fn with_delay(mut self, tool: &str, delay: Duration) -> Self {
        self.delays.insert(tool.to_string(), delay);
        self
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(ToolSessionError::Protocol(message.to_string()));
        self
    }

    pub fn with_close_error(mut self, message: &str) -> Self {
        self.close_error = Some(ToolSessionError::Protocol(message.to_string()));
        self
    }

    pub fn with_resources(mut self, resources: &[(&str, &str)]) -> Self {
        for (uri, text) in resources {
            self.resources
                .push((ResourceDescriptor::new(*uri, *uri), text.to_string()));
        }
        self
    }

    /// Record completed invocations into a journal shared across sessions
    pub fn with_journal(mut self, journal: Arc<Mutex<Vec<String>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn received_arguments(&self) -> Vec<Value> {
        self.arguments.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSession for FakeSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolSessionError> {
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.tools.clone()),
        }
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolCallResult, ToolSessionError> {
        self.arguments.lock().unwrap().push(arguments);
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        self.invocations.lock().unwrap().push(name.to_string());
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(format!("{}:{}", self.name, name));
        }

        if let Some(error) = self.invoke_errors.get(name) {
            return Err(error.clone());
        }
        Ok(self
            .responses
            .get(name)
            .cloned()
            .unwrap_or_else(|| ToolCallResult::text(format!("{}:{}", self.name, name))))
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ToolSessionError> {
        Ok(self.resources.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>, ToolSessionError> {
        self.resources
            .iter()
            .find(|(d, _)| d.uri == uri)
            .map(|(d, text)| vec![ResourceContents::text(d.uri.clone(), text.clone())])
            .ok_or_else(|| ToolSessionError::ToolExecution(format!("no resource {}", uri)))
    }

    async fn close(&self) -> Result<(), ToolSessionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Connector handing out pre-built fake sessions by name
#[derive(Default)]
pub struct FakeConnector {
    sessions: HashMap<String, Arc<FakeSession>>,
    failing: HashSet<String>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: FakeSession) -> Self {
        self.sessions
            .insert(session.name.clone(), Arc::new(session));
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Names of the sessions this connector can open, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn session(&self, name: &str) -> Arc<FakeSession> {
        self.sessions[name].clone()
    }
}

#[async_trait]
impl ToolSessionConnector for FakeConnector {
    async fn open(
        &self,
        name: &str,
        _spec: &BackendSpec,
    ) -> Result<Arc<dyn ToolSession>, ToolSessionError> {
        if self.failing.contains(name) {
            return Err(ToolSessionError::Connection(format!(
                "{} failed the handshake",
                name
            )));
        }
        self.sessions
            .get(name)
            .map(|s| s.clone() as Arc<dyn ToolSession>)
            .ok_or_else(|| ToolSessionError::Connection(format!("{} not found", name)))
    }
}

/// Inference provider replaying a fixed script of turns
pub struct ScriptedInference {
    turns: Mutex<VecDeque<Result<AssistantTurn, InferenceError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedInference {
    pub fn new(turns: Vec<Result<AssistantTurn, InferenceError>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            tool_counts: Mutex::new(Vec::new()),
        }
    }

    /// Transcript seen by each inference call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceProvider for ScriptedInference {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn infer(&self, request: InferenceRequest<'_>) -> Result<AssistantTurn, InferenceError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        self.tool_counts.lock().unwrap().push(request.tools.len());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::InvalidResponse("script exhausted".into())))
    }
}

/// Transcript store keeping every persisted snapshot
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Vec<Message>>>,
    snapshots: Mutex<Vec<Vec<Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(self, name: &str, messages: Vec<Message>) -> Self {
        self.data.lock().unwrap().insert(name.to_string(), messages);
        self
    }

    pub fn stored(&self, name: &str) -> Vec<Message> {
        self.data
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshots(&self) -> Vec<Vec<Message>> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self.stored(name))
    }

    async fn persist(&self, name: &str, messages: &[Message]) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .insert(name.to_string(), messages.to_vec());
        self.snapshots.lock().unwrap().push(messages.to_vec());
        Ok(())
    }
}
