//! Model clients for Tessera.
//!
//! [`OpenAiCompatibleClient`] talks to any chat-completions endpoint. Two decorators
//! wrap any [`ModelClient`](tessera_interface::ModelClient):
//!
//! - [`CachingClient`] answers repeated calls from a salt-keyed response cache.
//! - [`RetryingClient`] repeats calls that failed for transient reasons.
//!
//! ```no_run
//! use tessera_models::{CachingClient, OpenAiCompatibleClient, ResponseCacheConfig, RetryingClient, RetryPolicy};
//!
//! # fn main() -> tessera_error::TesseraResult<()> {
//! let client = OpenAiCompatibleClient::builder()
//!     .base_url("http://localhost:11434/v1")
//!     .api_key("ollama")
//!     .default_model("llama3.2")
//!     .build()?;
//! let client = RetryingClient::new(
//!     CachingClient::new(client, ResponseCacheConfig::default()),
//!     RetryPolicy::default(),
//! );
//! # let _ = client;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod openai;
mod retry;

pub use cache::{CachingClient, ResponseCache, ResponseCacheConfig, ResponseCacheConfigBuilder};
pub use openai::{
    API_KEY_ENV, DEFAULT_BASE_URL, OpenAiCompatibleClient, OpenAiCompatibleClientBuilder,
};
pub use retry::{RetryPolicy, RetryingClient};
