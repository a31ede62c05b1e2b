//! Salt-keyed response cache.

use async_trait::async_trait;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tessera_core::{Message, RawResponse};
use tessera_error::{JsonError, TesseraResult};
use tessera_interface::{ModelClient, PromptOptions};
use tokio::sync::Mutex;

/// Configuration for the response cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct ResponseCacheConfig {
    /// Maximum number of cached responses
    #[serde(default = "default_max_size")]
    max_size: usize,
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl")]
    ttl_secs: u64,
    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_max_size() -> usize {
    1024
}

fn default_ttl() -> u64 {
    3600
}

fn default_enabled() -> bool {
    true
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            ttl_secs: default_ttl(),
            enabled: default_enabled(),
        }
    }
}

impl ResponseCacheConfig {
    /// Creates a new config builder.
    pub fn builder() -> ResponseCacheConfigBuilder {
        ResponseCacheConfigBuilder::default()
    }
}

/// A cached successful response.
#[derive(Debug, Clone, PartialEq)]
enum Cached {
    Structured(JsonValue),
    Text(String),
    Raw(RawResponse),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Cached,
    created_at: Instant,
}

/// Bounded LRU cache with per-entry expiry.
///
/// Keys are SHA-256 digests of the call: method, messages, schema and options. The
/// options include the cache salt, so calls differing only in salt never share an
/// entry.
#[derive(Debug)]
pub struct ResponseCache {
    config: ResponseCacheConfig,
    entries: HashMap<String, CacheEntry>,
    access_order: VecDeque<String>,
}

impl ResponseCache {
    /// Create an empty cache.
    pub fn new(config: ResponseCacheConfig) -> Self {
        tracing::debug!(
            max_size = config.max_size,
            ttl_secs = config.ttl_secs,
            enabled = config.enabled,
            "Creating response cache"
        );
        Self {
            config,
            entries: HashMap::new(),
            access_order: VecDeque::new(),
        }
    }

    /// Digest identifying a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the call cannot be serialized.
    pub fn key(
        method: &str,
        messages: &[Message],
        schema: Option<&JsonValue>,
        options: &PromptOptions,
    ) -> TesseraResult<String> {
        let call = json!({
            "method": method,
            "messages": messages,
            "schema": schema,
            "options": options,
        });
        let bytes = serde_json::to_vec(&call)
            .map_err(|e| JsonError::new(format!("Failed to serialize cache key: {}", e)))?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    fn get(&mut self, key: &str) -> Option<Cached> {
        if !self.config.enabled {
            return None;
        }

        let ttl = self.ttl();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => entry.created_at.elapsed() >= ttl,
        };

        if expired {
            tracing::debug!(key = %key, "Cache entry expired");
            self.entries.remove(key);
            self.forget(key);
            return None;
        }

        self.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn insert(&mut self, key: String, value: Cached) {
        if !self.config.enabled || self.config.max_size == 0 {
            return;
        }

        if self.entries.len() >= self.config.max_size && !self.entries.contains_key(&key) {
            self.evict_lru();
        }

        self.touch(&key);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    fn touch(&mut self, key: &str) {
        self.forget(key);
        self.access_order.push_back(key.to_string());
    }

    fn forget(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }

    fn evict_lru(&mut self) {
        if let Some(oldest) = self.access_order.pop_front() {
            tracing::debug!(key = %oldest, "Evicting least recently used response");
            self.entries.remove(&oldest);
        }
    }
}

/// Model client decorator answering repeated calls from a [`ResponseCache`].
///
/// Only successful responses are cached.
pub struct CachingClient<C> {
    inner: C,
    cache: Mutex<ResponseCache>,
}

impl<C> std::fmt::Debug for CachingClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingClient").finish_non_exhaustive()
    }
}

impl<C: ModelClient> CachingClient<C> {
    /// Wrap `inner` with a cache.
    pub fn new(inner: C, config: ResponseCacheConfig) -> Self {
        Self {
            inner,
            cache: Mutex::new(ResponseCache::new(config)),
        }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of cached responses.
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn lookup(&self, key: &str) -> Option<Cached> {
        let hit = self.cache.lock().await.get(key);
        if hit.is_some() {
            tracing::debug!(key = %key, "Cache hit");
        }
        hit
    }

    async fn store(&self, key: String, value: Cached) {
        self.cache.lock().await.insert(key, value);
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for CachingClient<C> {
    async fn prompt_structured(
        &self,
        messages: &[Message],
        schema: &JsonValue,
        options: &PromptOptions,
    ) -> TesseraResult<JsonValue> {
        let key = ResponseCache::key("structured", messages, Some(schema), options)?;
        if let Some(Cached::Structured(value)) = self.lookup(&key).await {
            return Ok(value);
        }
        let value = self
            .inner
            .prompt_structured(messages, schema, options)
            .await?;
        self.store(key, Cached::Structured(value.clone())).await;
        Ok(value)
    }

    async fn prompt_text(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<String> {
        let key = ResponseCache::key("text", messages, None, options)?;
        if let Some(Cached::Text(text)) = self.lookup(&key).await {
            return Ok(text);
        }
        let text = self.inner.prompt_text(messages, options).await?;
        self.store(key, Cached::Text(text.clone())).await;
        Ok(text)
    }

    async fn prompt_raw(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        let key = ResponseCache::key("raw", messages, None, options)?;
        if let Some(Cached::Raw(raw)) = self.lookup(&key).await {
            return Ok(raw);
        }
        let raw = self.inner.prompt_raw(messages, options).await?;
        self.store(key, Cached::Raw(raw.clone())).await;
        Ok(raw)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
