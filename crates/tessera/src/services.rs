//! Production collaborators assembled from configuration.

use std::sync::Arc;
use std::time::Duration;
use tessera_error::TesseraResult;
use tessera_interface::RuntimeServices;
use tessera_models::{
    CachingClient, OpenAiCompatibleClient, ResponseCacheConfig, RetryPolicy, RetryingClient,
};
use tessera_pipeline::{PipelineConfig, ShellCommandRunner};
use tessera_storage::FileSystemArtifactStore;

/// Build the model client, artifact store and command runner for `config`.
///
/// The model client stack is `RetryingClient<CachingClient<OpenAiCompatibleClient>>`:
/// cache hits never touch the network and only real provider calls are retried.
///
/// # Errors
///
/// Returns an error if no API key is available or the HTTP client cannot be built.
#[tracing::instrument(skip_all, fields(base_url = ?config.provider().base_url()))]
pub fn build_services(config: &PipelineConfig) -> TesseraResult<RuntimeServices> {
    let provider = config.provider();

    let mut builder = OpenAiCompatibleClient::builder();
    if let Some(base_url) = provider.base_url() {
        builder = builder.base_url(base_url.clone());
    }
    if let Some(api_key) = provider.api_key() {
        builder = builder.api_key(api_key.clone());
    }
    if let Some(model) = config.model().model() {
        builder = builder.default_model(model.clone());
    }
    if let Some(secs) = provider.timeout_secs() {
        builder = builder.timeout(Duration::from_secs(*secs));
    }
    let client = builder.build()?;

    let mut cache = ResponseCacheConfig::default();
    if let Some(capacity) = provider.cache_capacity() {
        cache = cache.with_max_size(*capacity);
    }
    if let Some(ttl) = provider.cache_ttl_secs() {
        cache = cache.with_ttl_secs(*ttl);
    }

    let mut policy = RetryPolicy::default();
    if let Some(retries) = provider.max_transport_retries() {
        policy = policy.with_max_retries(*retries);
    }

    let client = RetryingClient::new(CachingClient::new(client, cache), policy);

    Ok(RuntimeServices {
        client: Arc::new(client),
        // Output paths arrive already resolved against the configured output directory
        store: Arc::new(FileSystemArtifactStore::new(".")),
        commands: Arc::new(ShellCommandRunner::new()),
    })
}
