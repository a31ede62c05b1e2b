//! Scripted model client.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera_core::{Message, RawResponse};
use tessera_error::{HttpError, ModelError, ModelErrorKind, TesseraError, TesseraResult};
use tessera_interface::{ModelClient, PromptOptions};

/// One scripted call outcome.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Succeed with the call number as text
    Ok,
    /// Provider status error
    Status(u16),
    /// Transport error
    Transport,
}

/// Client that plays back outcomes in order, then succeeds.
///
/// Successful answers carry the call number (`"answer 1"`, `"answer 2"`, ...) so tests
/// can tell cached answers from fresh ones.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Outcome>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    /// Client that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client playing back `outcomes` first.
    pub fn scripted(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> TesseraResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Ok);
        match outcome {
            Outcome::Ok => Ok(format!("answer {}", call)),
            Outcome::Status(status) => Err(TesseraError::from(ModelError::new(
                ModelErrorKind::Api {
                    status,
                    message: "scripted".to_string(),
                },
            ))),
            Outcome::Transport => Err(HttpError::new("connection reset").into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn prompt_structured(
        &self,
        _messages: &[Message],
        _schema: &JsonValue,
        _options: &PromptOptions,
    ) -> TesseraResult<JsonValue> {
        self.next().map(|text| serde_json::json!({ "answer": text }))
    }

    async fn prompt_text(
        &self,
        _messages: &[Message],
        _options: &PromptOptions,
    ) -> TesseraResult<String> {
        self.next()
    }

    async fn prompt_raw(
        &self,
        _messages: &[Message],
        _options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        self.next().map(RawResponse::text)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
