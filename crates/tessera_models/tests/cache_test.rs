//! Response cache behavior.

mod test_utils;

use tessera_core::Message;
use tessera_interface::{ModelClient, PromptOptions};
use tessera_models::{CachingClient, ResponseCache, ResponseCacheConfig};
use test_utils::{Outcome, ScriptedClient};

fn salted(salt: &str) -> PromptOptions {
    PromptOptions::default().with_cache_salt(salt)
}

fn messages() -> Vec<Message> {
    vec![Message::user("Slogan for a Kletterhalle")]
}

#[tokio::test]
async fn test_identical_calls_hit_the_cache() {
    let client = CachingClient::new(ScriptedClient::new(), ResponseCacheConfig::default());

    let first = client.prompt_text(&messages(), &salted("s_f0_a0")).await.unwrap();
    let second = client.prompt_text(&messages(), &salted("s_f0_a0")).await.unwrap();

    assert_eq!(first, "answer 1");
    assert_eq!(second, "answer 1");
    assert_eq!(client.inner().calls(), 1);
    assert_eq!(client.cached().await, 1);
}

#[tokio::test]
async fn test_salt_separates_entries() {
    let client = CachingClient::new(ScriptedClient::new(), ResponseCacheConfig::default());

    let a = client.prompt_text(&messages(), &salted("s_cand_0")).await.unwrap();
    let b = client.prompt_text(&messages(), &salted("s_cand_1")).await.unwrap();

    assert_ne!(a, b);
    assert_eq!(client.inner().calls(), 2);
}

#[tokio::test]
async fn test_methods_do_not_share_entries() {
    let client = CachingClient::new(ScriptedClient::new(), ResponseCacheConfig::default());
    let options = salted("s");

    client.prompt_text(&messages(), &options).await.unwrap();
    let raw = client.prompt_raw(&messages(), &options).await.unwrap();

    assert_eq!(raw.content.as_deref(), Some("answer 2"));
    assert_eq!(client.inner().calls(), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let client = CachingClient::new(
        ScriptedClient::scripted(vec![Outcome::Status(500)]),
        ResponseCacheConfig::default(),
    );

    assert!(client.prompt_text(&messages(), &salted("s")).await.is_err());
    let retried = client.prompt_text(&messages(), &salted("s")).await.unwrap();

    assert_eq!(retried, "answer 2");
    assert_eq!(client.inner().calls(), 2);
}

#[tokio::test]
async fn test_least_recently_used_entry_is_evicted() {
    let config = ResponseCacheConfig::default().with_max_size(2);
    let client = CachingClient::new(ScriptedClient::new(), config);

    client.prompt_text(&messages(), &salted("a")).await.unwrap();
    client.prompt_text(&messages(), &salted("b")).await.unwrap();
    // Touch "a" so "b" becomes the eviction candidate
    client.prompt_text(&messages(), &salted("a")).await.unwrap();
    client.prompt_text(&messages(), &salted("c")).await.unwrap();
    assert_eq!(client.inner().calls(), 3);
    assert_eq!(client.cached().await, 2);

    client.prompt_text(&messages(), &salted("a")).await.unwrap();
    assert_eq!(client.inner().calls(), 3);
    client.prompt_text(&messages(), &salted("b")).await.unwrap();
    assert_eq!(client.inner().calls(), 4);
}

#[tokio::test]
async fn test_expired_entries_are_refetched() {
    let config = ResponseCacheConfig::default().with_ttl_secs(0);
    let client = CachingClient::new(ScriptedClient::new(), config);

    client.prompt_text(&messages(), &salted("s")).await.unwrap();
    client.prompt_text(&messages(), &salted("s")).await.unwrap();

    assert_eq!(client.inner().calls(), 2);
}

#[tokio::test]
async fn test_disabled_cache_passes_through() {
    let config = ResponseCacheConfig::default().with_enabled(false);
    let client = CachingClient::new(ScriptedClient::new(), config);

    client.prompt_text(&messages(), &salted("s")).await.unwrap();
    client.prompt_text(&messages(), &salted("s")).await.unwrap();

    assert_eq!(client.inner().calls(), 2);
    assert_eq!(client.cached().await, 0);
}

#[test]
fn test_key_covers_schema_and_options() {
    let base = ResponseCache::key("structured", &messages(), None, &salted("s")).unwrap();
    let schema = serde_json::json!({"type": "object"});

    let with_schema =
        ResponseCache::key("structured", &messages(), Some(&schema), &salted("s")).unwrap();
    let other_model = ResponseCache::key(
        "structured",
        &messages(),
        None,
        &salted("s").with_model("other"),
    )
    .unwrap();

    assert_eq!(base.len(), 64);
    assert_ne!(base, with_schema);
    assert_ne!(base, other_model);
    assert_eq!(
        base,
        ResponseCache::key("structured", &messages(), None, &salted("s")).unwrap()
    );
}
