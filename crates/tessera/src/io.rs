//! Row ingestion and result export.

use serde_json::{Value as JsonValue, json};
use std::path::Path;
use tessera_core::Row;
use tessera_error::{JsonError, StorageError, StorageErrorKind, TesseraResult};
use tessera_pipeline::RowOutcome;

/// Read rows from a JSON array file or a JSON Lines file (`.jsonl`, `.ndjson`).
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not contain JSON objects.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub async fn read_rows(path: &Path) -> TesseraResult<Vec<Row>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
    })?;
    let lines = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("jsonl") | Some("ndjson")
    );
    let rows = parse_rows(&text, lines)?;
    tracing::info!(rows = rows.len(), "Rows loaded");
    Ok(rows)
}

/// Parse rows from a JSON array, or from JSON Lines when `lines` is set.
///
/// Blank lines are skipped. Every row must be a JSON object.
///
/// # Errors
///
/// Returns an error naming the offending row or line.
///
/// # Examples
///
/// ```
/// use tessera::parse_rows;
///
/// let rows = parse_rows("{\"industry\": \"Kletterhalle\"}\n\n{\"industry\": \"Bakery\"}", true).unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1]["industry"], "Bakery");
/// ```
pub fn parse_rows(text: &str, lines: bool) -> TesseraResult<Vec<Row>> {
    if lines {
        return text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                let value: JsonValue = serde_json::from_str(line).map_err(|e| {
                    JsonError::new(format!("line {}: {}", number + 1, e))
                })?;
                into_row(value, number + 1, "line")
            })
            .collect();
    }

    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| JsonError::new(format!("Failed to parse rows: {}", e)))?;
    match value {
        JsonValue::Array(values) => values
            .into_iter()
            .enumerate()
            .map(|(index, value)| into_row(value, index, "row"))
            .collect(),
        JsonValue::Object(_) => Ok(vec![into_row(value, 0, "row")?]),
        other => Err(JsonError::new(format!(
            "expected an array of objects, found {}",
            kind_of(&other)
        ))
        .into()),
    }
}

fn into_row(value: JsonValue, position: usize, label: &str) -> TesseraResult<Row> {
    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        other => Err(JsonError::new(format!(
            "{} {} is {}, not an object",
            label,
            position,
            kind_of(&other)
        ))
        .into()),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// One record per surviving work item, and one per failed row, in row order.
///
/// `variation_index` is null for lineages that were never exploded. Completed rows
/// that lost every item (dropped lineages) produce no record.
pub fn outcome_records(outcomes: &[RowOutcome]) -> Vec<JsonValue> {
    let mut records = Vec::new();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Completed {
                original_index,
                items,
            } => {
                records.extend(items.iter().map(|item| {
                    json!({
                        "original_index": original_index,
                        "variation_index": item.variation_index(),
                        "row": item.row(),
                    })
                }));
            }
            RowOutcome::Failed {
                original_index,
                step,
                error,
            } => records.push(json!({
                "original_index": original_index,
                "step": step,
                "error": error,
            })),
        }
    }
    records
}

/// Render records as JSON Lines.
pub fn to_jsonl(records: &[JsonValue]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}
