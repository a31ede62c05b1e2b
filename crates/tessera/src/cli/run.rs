//! Pipeline run command handler.

use std::path::Path;
use std::sync::Arc;
use tessera::{
    Pipeline, PipelineConfig, PluginRegistry, RowOutcome, StorageError, StorageErrorKind,
    TesseraResult, build_services, outcome_records, read_rows, to_jsonl,
};

/// Run the pipeline at `config` over the rows in `input`.
#[tracing::instrument(skip_all, fields(config = %config.display(), input = %input.display()))]
pub async fn run_pipeline(
    config: &Path,
    input: &Path,
    output: Option<&Path>,
    concurrency: Option<usize>,
) -> TesseraResult<()> {
    let mut pipeline_config = PipelineConfig::load(Some(config))?;
    if let Some(concurrency) = concurrency {
        pipeline_config = pipeline_config.with_concurrency(concurrency);
    }

    let services = build_services(&pipeline_config)?;
    let pipeline = Pipeline::new(
        &pipeline_config,
        Arc::new(PluginRegistry::with_builtins()),
        services,
    )?;

    let rows = read_rows(input).await?;
    let total = rows.len();
    let outcomes = pipeline.run(rows).await;

    let failed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, RowOutcome::Failed { .. }))
        .count();
    let records = outcome_records(&outcomes);
    let jsonl = to_jsonl(&records);

    match output {
        Some(path) => {
            tokio::fs::write(path, jsonl).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?;
            tracing::info!(path = %path.display(), "Results written");
        }
        None => print!("{}", jsonl),
    }

    tracing::info!(
        rows = total,
        failed,
        records = records.len(),
        "Pipeline run complete"
    );
    Ok(())
}
