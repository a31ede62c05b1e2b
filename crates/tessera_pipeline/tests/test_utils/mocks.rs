//! Mock collaborators.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tessera_core::{ArtifactContent, Message, RawResponse};
use tessera_error::{ModelError, ModelErrorKind, StorageError, StorageErrorKind, TesseraResult};
use tessera_interface::{
    ArtifactStore, CommandOutput, CommandRunner, ModelClient, PromptOptions,
};

/// Which client method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Structured,
    Text,
    Raw,
}

/// A recorded model call.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub salt: String,
    pub model: Option<String>,
    pub messages: Vec<Message>,
}

impl Call {
    /// Text of every message, joined.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the mock answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Json(JsonValue),
    Raw(RawResponse),
    Fail(String),
}

type Responder = Box<dyn Fn(&Call) -> Reply + Send + Sync>;

/// Model client answering through a closure over the call.
pub struct MockModelClient {
    responder: Responder,
    calls: Mutex<Vec<Call>>,
}

impl MockModelClient {
    /// Client answering with `responder`.
    pub fn new(responder: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Client that always answers with the same text.
    pub fn text(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Reply::Text(text.clone()))
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls whose salt contains `fragment`.
    pub fn calls_with_salt(&self, fragment: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.salt.contains(fragment))
            .collect()
    }

    fn record(&self, kind: CallKind, messages: &[Message], options: &PromptOptions) -> Reply {
        let call = Call {
            kind,
            salt: options.cache_salt().clone().unwrap_or_default(),
            model: options.model().clone(),
            messages: messages.to_vec(),
        };
        let reply = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        reply
    }
}

fn failure(message: String) -> tessera_error::TesseraError {
    ModelError::new(ModelErrorKind::Api {
        status: 400,
        message,
    })
    .into()
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn prompt_structured(
        &self,
        messages: &[Message],
        _schema: &JsonValue,
        options: &PromptOptions,
    ) -> TesseraResult<JsonValue> {
        match self.record(CallKind::Structured, messages, options) {
            Reply::Json(value) => Ok(value),
            Reply::Text(text) => Ok(JsonValue::String(text)),
            Reply::Raw(raw) => Ok(JsonValue::String(raw.content.unwrap_or_default())),
            Reply::Fail(message) => Err(failure(message)),
        }
    }

    async fn prompt_text(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<String> {
        match self.record(CallKind::Text, messages, options) {
            Reply::Json(value) => Ok(value.to_string()),
            Reply::Text(text) => Ok(text),
            Reply::Raw(raw) => Ok(raw.content.unwrap_or_default()),
            Reply::Fail(message) => Err(failure(message)),
        }
    }

    async fn prompt_raw(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        match self.record(CallKind::Raw, messages, options) {
            Reply::Json(value) => Ok(RawResponse::text(value.to_string())),
            Reply::Text(text) => Ok(RawResponse::text(text)),
            Reply::Raw(raw) => Ok(raw),
            Reply::Fail(message) => Err(failure(message)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory artifact store.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    copies: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl MemoryStore {
    /// Stored bytes at `path`.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Stored text at `path`.
    pub fn text(&self, path: &Path) -> Option<String> {
        self.get(path).map(|bytes| String::from_utf8_lossy(&bytes).to_string())
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Recorded copies.
    pub fn copies(&self) -> Vec<(PathBuf, PathBuf)> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn save(&self, content: &ArtifactContent, path: &Path) -> TesseraResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.as_bytes().to_vec());
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> TesseraResult<()> {
        let bytes = self.get(from).ok_or_else(|| {
            StorageError::new(StorageErrorKind::FileRead(from.display().to_string()))
        })?;
        self.files.lock().unwrap().insert(to.to_path_buf(), bytes);
        self.copies
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }
}

/// A recorded command run.
#[derive(Debug, Clone)]
pub struct CommandCall {
    pub command: String,
    pub file: PathBuf,
    /// File content at the time the command ran, if the file existed
    pub content: Option<String>,
}

type StatusFn = Box<dyn Fn(&str, Option<&str>) -> i32 + Send + Sync>;

/// Command runner deciding the exit status from the command and file content.
pub struct MockCommandRunner {
    status: StatusFn,
    calls: Mutex<Vec<CommandCall>>,
}

impl MockCommandRunner {
    /// Runner deciding the status with `status`.
    pub fn new(status: impl Fn(&str, Option<&str>) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            status: Box::new(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Runner where every command succeeds.
    pub fn succeeding() -> Self {
        Self::new(|_, _| 0)
    }

    /// Runner where every command fails.
    pub fn failing() -> Self {
        Self::new(|_, _| 1)
    }

    /// Every recorded run.
    pub fn calls(&self) -> Vec<CommandCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, command: &str, file: &Path) -> TesseraResult<CommandOutput> {
        let content = std::fs::read_to_string(file).ok();
        let status = (self.status)(command, content.as_deref());
        self.calls.lock().unwrap().push(CommandCall {
            command: command.to_string(),
            file: file.to_path_buf(),
            content,
        });
        let stderr = if status == 0 { "" } else { "rejected by mock" };
        Ok(CommandOutput::new(status, "", stderr))
    }
}
