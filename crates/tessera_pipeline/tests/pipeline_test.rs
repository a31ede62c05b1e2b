//! End-to-end pipeline runs over mock services.

mod test_utils;

use serde_json::json;
use std::sync::Arc;
use tessera_pipeline::{Pipeline, PipelineConfig, PluginRegistry, RowOutcome};
use test_utils::{MockModelClient, Reply, row, services_with};

const KEYWORD_SLOGANS: &str = r#"
concurrency = 2

[[steps]]
name = "keywords"
plugin_output = { mode = "column", explode = true }

[[steps.plugins]]
name = "split"
key = "keywords"
config = { input = "{{topics}}" }

[[steps]]
name = "slogan"
prompt = "Write a slogan about {{keywords}} for a {{industry}}"
max_retries = 0
output = { mode = "column" }
"#;

fn echo_client() -> MockModelClient {
    MockModelClient::new(|call| {
        let prompt = call.messages.last().map(|m| m.text()).unwrap_or_default();
        if prompt.contains("Bakery") {
            Reply::Fail("model refused".to_string())
        } else {
            Reply::Text(format!("slogan: {}", prompt))
        }
    })
}

fn pipeline(config: &PipelineConfig, client: Arc<MockModelClient>) -> Pipeline {
    Pipeline::new(
        config,
        Arc::new(PluginRegistry::with_builtins()),
        services_with(client),
    )
    .unwrap()
}

#[tokio::test]
async fn test_exploded_rows_are_generated_per_branch() {
    let config = PipelineConfig::from_toml_str(KEYWORD_SLOGANS).unwrap();
    let client = Arc::new(echo_client());
    let pipeline = pipeline(&config, client.clone());

    let outcomes = pipeline
        .run(vec![row(&[
            ("industry", json!("Kletterhalle")),
            ("topics", json!("boulder, rope")),
        ])])
        .await;

    assert_eq!(outcomes.len(), 1);
    let items = outcomes[0].items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].row()["keywords"], json!("boulder"));
    assert_eq!(
        items[0].row()["slogan"],
        json!("slogan: Write a slogan about boulder for a Kletterhalle")
    );
    assert_eq!(items[1].row()["keywords"], json!("rope"));
    assert_eq!(*items[1].variation_index(), Some(1));
    assert_eq!(items[1].history().len(), 2);

    let mut salts: Vec<String> = client.calls().into_iter().map(|c| c.salt).collect();
    salts.sort();
    assert_eq!(salts, vec!["slogan_r0_v0_f0_a0", "slogan_r0_v1_f0_a0"]);
}

#[tokio::test]
async fn test_failing_row_does_not_affect_siblings() {
    let config = PipelineConfig::from_toml_str(KEYWORD_SLOGANS).unwrap();
    let pipeline = pipeline(&config, Arc::new(echo_client()));

    let outcomes = pipeline
        .run(vec![
            row(&[("industry", json!("Kletterhalle")), ("topics", json!("boulder"))]),
            row(&[("industry", json!("Bakery")), ("topics", json!("bread"))]),
            row(&[("industry", json!("Zoo")), ("topics", json!("lions"))]),
        ])
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_completed());
    assert!(outcomes[2].is_completed());
    match &outcomes[1] {
        RowOutcome::Failed {
            original_index,
            step,
            error,
        } => {
            assert_eq!(*original_index, 1);
            assert_eq!(step, "slogan");
            assert!(error.contains("model refused"), "{}", error);
        }
        other => panic!("row 1 should have failed: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_plugin_output_drops_the_row_silently() {
    let config = PipelineConfig::from_toml_str(KEYWORD_SLOGANS).unwrap();
    let client = Arc::new(echo_client());
    let pipeline = pipeline(&config, client.clone());

    let outcomes = pipeline
        .run(vec![row(&[
            ("industry", json!("Kletterhalle")),
            ("topics", json!(" , ")),
        ])])
        .await;

    assert!(outcomes[0].is_completed());
    assert!(outcomes[0].items().is_empty());
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_aggregated_plugins_keep_their_own_namespaces() {
    let config = PipelineConfig::from_toml_str(
        r#"
[[steps]]
name = "facts"
plugin_output = { mode = "column" }

[[steps.plugins]]
name = "static"
config = { packets = [{ data = 1 }, { data = 2 }] }

[[steps.plugins]]
name = "static"
key = "more"
output = { mode = "ignore" }
config = { packets = [{ data = 3 }] }
"#,
    )
    .unwrap();
    let client = Arc::new(echo_client());
    let pipeline = pipeline(&config, client.clone());

    let outcomes = pipeline.run(vec![row(&[("industry", json!("Zoo"))])]).await;

    let items = outcomes[0].items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].row()["static"], json!([1, 2]));
    assert_eq!(items[0].workspace()["static"], json!([1, 2]));
    assert_eq!(items[0].workspace()["more"], json!([3]));
    assert!(items[0].row().get("more").is_none());
    assert_eq!(*items[0].variation_index(), None);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_plugin_data_survives_the_generation_of_its_step() {
    let config = PipelineConfig::from_toml_str(
        r#"
[[steps]]
name = "research"
prompt = "Summarize {{industry}}"
max_retries = 0

[[steps.plugins]]
name = "static"
key = "facts"
config = { packets = [{ data = { fact = "founded 1999" } }] }

[[steps]]
name = "pitch"
prompt = "Pitch using {{workspace.facts[0].fact}} and {{research}}"
max_retries = 0
"#,
    )
    .unwrap();
    let client = Arc::new(MockModelClient::new(|call| {
        if call.salt.starts_with("research") {
            Reply::Text("summary".to_string())
        } else {
            Reply::Text("pitch".to_string())
        }
    }));
    let pipeline = pipeline(&config, client.clone());

    let outcomes = pipeline
        .run(vec![row(&[("industry", json!("Kletterhalle"))])])
        .await;

    assert!(outcomes[0].is_completed(), "{:?}", outcomes[0]);
    let items = outcomes[0].items();
    assert_eq!(items.len(), 1);
    let workspace = items[0].workspace();
    assert_eq!(workspace["facts"], json!([{"fact": "founded 1999"}]));
    assert_eq!(workspace["research"], json!("summary"));
    assert_eq!(workspace["pitch"], json!("pitch"));

    let pitch = client.calls_with_salt("pitch_r0_f0_a0");
    assert_eq!(pitch.len(), 1);
    let prompt = pitch[0].messages.last().map(|m| m.text()).unwrap_or_default();
    assert_eq!(prompt, "Pitch using founded 1999 and summary");
}

#[tokio::test]
async fn test_outcomes_follow_row_order() {
    let config = PipelineConfig::from_toml_str(KEYWORD_SLOGANS)
        .unwrap()
        .with_concurrency(3);
    let pipeline = pipeline(&config, Arc::new(echo_client()));

    let rows = (0..8)
        .map(|i| {
            row(&[
                ("industry", json!(format!("Shop {}", i))),
                ("topics", json!("a, b")),
            ])
        })
        .collect();
    let outcomes = pipeline.run(rows).await;

    let indices: Vec<usize> = outcomes.iter().map(RowOutcome::original_index).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    for outcome in &outcomes {
        for item in outcome.items() {
            assert_eq!(*item.original_index(), outcome.original_index());
        }
    }
}

#[tokio::test]
async fn test_candidate_steps_use_candidate_salts() {
    let config = PipelineConfig::from_toml_str(
        r#"
[[steps]]
name = "slogan"
prompt = "Slogan for a {{industry}}"
candidates = { count = 2 }
output = { mode = "column" }
"#,
    )
    .unwrap();
    let client = Arc::new(MockModelClient::text("Climb on"));
    let pipeline = pipeline(&config, client.clone());

    let outcomes = pipeline
        .run(vec![row(&[("industry", json!("Kletterhalle"))])])
        .await;

    assert_eq!(outcomes[0].items()[0].row()["slogan"], json!("Climb on"));
    assert_eq!(client.calls_with_salt("slogan_r0_cand_0").len(), 1);
    assert_eq!(client.calls_with_salt("slogan_r0_cand_1").len(), 1);
    assert_eq!(client.call_count(), 2);
}

#[test]
fn test_unknown_plugin_fails_construction() {
    let config = PipelineConfig::from_toml_str(
        r#"
[[steps]]
name = "search"

[[steps.plugins]]
name = "web_search"
"#,
    )
    .unwrap();

    let result = Pipeline::new(
        &config,
        Arc::new(PluginRegistry::with_builtins()),
        services_with(Arc::new(MockModelClient::text("unused"))),
    );

    assert!(result.is_err());
}
