//! Chat-completions client for OpenAI-compatible providers.

use super::conversion::{first_message, to_chat_message, to_raw_response};
use super::dto::{ChatRequest, ChatResponse, ResponseFormat};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tessera_core::{Message, RawResponse};
use tessera_error::{ModelError, ModelErrorKind, TesseraResult};
use tessera_interface::{ModelClient, PromptOptions};
use tracing::{debug, instrument};

/// Default endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "TESSERA_API_KEY";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for any provider exposing `POST {base_url}/chat/completions`
/// (OpenAI, OpenRouter, Groq, Ollama, vLLM, ...).
///
/// Structured output uses `response_format = json_schema`. Raw responses carry the
/// message text, generated images (`message.images[].image_url.url`) and generated
/// audio (`message.audio.data`). The client neither caches nor retries; wrap it in
/// [`CachingClient`](crate::CachingClient) and [`RetryingClient`](crate::RetryingClient).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    default_model: String,
}

impl OpenAiCompatibleClient {
    /// Creates a new client builder.
    pub fn builder() -> OpenAiCompatibleClientBuilder {
        OpenAiCompatibleClientBuilder::default()
    }

    /// Full chat-completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model used when the call options name none.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn request(
        &self,
        messages: &[Message],
        options: &PromptOptions,
        response_format: Option<ResponseFormat>,
    ) -> TesseraResult<ChatRequest> {
        let mut builder = ChatRequest::builder();
        builder
            .model(
                options
                    .model()
                    .clone()
                    .unwrap_or_else(|| self.default_model.clone()),
            )
            .messages(messages.iter().map(to_chat_message).collect::<Vec<_>>());

        if let Some(temperature) = options.temperature() {
            builder.temperature(*temperature);
        }
        if let Some(effort) = options.reasoning_effort() {
            builder.reasoning_effort(effort.to_string());
        }
        if let Some(format) = response_format {
            builder.response_format(format);
        }

        builder.build().map_err(|e| {
            ModelError::new(ModelErrorKind::RequestConstruction(e.to_string())).into()
        })
    }

    async fn send(&self, body: &ChatRequest) -> TesseraResult<ChatResponse> {
        debug!(
            endpoint = %self.endpoint,
            model = %body.model,
            messages = body.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::new(ModelErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::new(ModelErrorKind::Api {
                status: status.as_u16(),
                message,
            })
            .into());
        }

        response.json::<ChatResponse>().await.map_err(|e| {
            ModelError::new(ModelErrorKind::ResponseParsing(e.to_string())).into()
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatibleClient {
    #[instrument(skip_all, fields(model = ?options.model(), salt = ?options.cache_salt()))]
    async fn prompt_structured(
        &self,
        messages: &[Message],
        schema: &JsonValue,
        options: &PromptOptions,
    ) -> TesseraResult<JsonValue> {
        let body = self.request(messages, options, Some(ResponseFormat::json_schema(schema)))?;
        let message = first_message(self.send(&body).await?)?;
        let content = message
            .content
            .ok_or_else(|| ModelError::new(ModelErrorKind::EmptyResponse))?;

        // Providers without schema enforcement may wrap the JSON in prose; the
        // pipeline extracts it from the string in that case.
        Ok(match serde_json::from_str::<JsonValue>(&content) {
            Ok(value) => value,
            Err(_) => JsonValue::String(content),
        })
    }

    #[instrument(skip_all, fields(model = ?options.model(), salt = ?options.cache_salt()))]
    async fn prompt_text(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<String> {
        let body = self.request(messages, options, None)?;
        let message = first_message(self.send(&body).await?)?;
        Ok(message
            .content
            .ok_or_else(|| ModelError::new(ModelErrorKind::EmptyResponse))?)
    }

    #[instrument(skip_all, fields(model = ?options.model(), salt = ?options.cache_salt()))]
    async fn prompt_raw(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        let body = self.request(messages, options, None)?;
        let message = first_message(self.send(&body).await?)?;
        Ok(to_raw_response(message))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Builder for [`OpenAiCompatibleClient`].
#[derive(Debug, Clone, Default)]
pub struct OpenAiCompatibleClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiCompatibleClientBuilder {
    /// API base URL; `/chat/completions` is appended.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// API key; defaults to `TESSERA_API_KEY`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Model used when the call options name none.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or set in the environment, or
    /// if the HTTP client cannot be created.
    #[instrument(skip_all, fields(base_url = ?self.base_url))]
    pub fn build(self) -> TesseraResult<OpenAiCompatibleClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV).map_err(|e| {
                ModelError::new(ModelErrorKind::MissingApiKey(format!(
                    "{} not set: {}",
                    API_KEY_ENV, e
                )))
            })?,
        };

        let http = reqwest::Client::builder()
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .build()
            .map_err(|e| ModelError::new(ModelErrorKind::Transport(e.to_string())))?;

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        debug!(endpoint = %endpoint, "OpenAI-compatible client ready");
        Ok(OpenAiCompatibleClient {
            http,
            endpoint,
            api_key,
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}
