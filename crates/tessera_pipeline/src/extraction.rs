//! Structured output extraction and schema validation.
//!
//! Models asked for JSON frequently wrap it in markdown fences or surround it with
//! prose. Extraction finds the payload; validation checks it against the step's
//! schema and re-serializes it canonically.

use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;
use tessera_error::{GenerationError, GenerationErrorKind};

/// Extract a JSON document from a response that may contain markdown or extra text.
///
/// Strategies, in order:
/// 1. Fenced code blocks (```` ```json ```` or bare ```` ``` ````)
/// 2. The first balanced object or array, whichever opens first
///
/// # Errors
///
/// Returns a schema validation error if no JSON is found.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::extract_json;
///
/// let response = "Sure:\n```json\n{\"slogan\": \"Higher\"}\n```\n";
/// assert_eq!(extract_json(response).unwrap(), "{\"slogan\": \"Higher\"}");
/// ```
pub fn extract_json(response: &str) -> Result<String, GenerationError> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }

    let delimiters = match (response.find('['), response.find('{')) {
        (Some(bracket), Some(brace)) if bracket < brace => [('[', ']'), ('{', '}')],
        (Some(_), None) => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };

    for (open, close) in delimiters {
        if let Some(json) = extract_balanced(response, open, close) {
            return Ok(json);
        }
    }

    tracing::debug!(response_length = response.len(), "No JSON found in response");
    Err(GenerationError::new(GenerationErrorKind::SchemaValidation(
        format!(
            "no JSON found in response (length: {}); respond with JSON only",
            response.len()
        ),
    )))
}

/// Parse a structured response.
///
/// Strings are treated as unparsed model output and run through
/// [`extract_json`]; anything else is already structured.
///
/// # Errors
///
/// Returns a schema validation error if a string response does not contain
/// parseable JSON.
pub fn parse_structured(value: JsonValue) -> Result<JsonValue, GenerationError> {
    match value {
        JsonValue::String(text) => {
            let json = extract_json(&text)?;
            serde_json::from_str(&json).map_err(|e| {
                let preview: String = json.chars().take(100).collect();
                GenerationError::new(GenerationErrorKind::SchemaValidation(format!(
                    "failed to parse JSON: {} (JSON: {}...)",
                    e, preview
                )))
            })
        }
        other => Ok(other),
    }
}

/// A compiled JSON schema.
pub struct SchemaValidator {
    compiled: JSONSchema,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile a schema.
    ///
    /// # Errors
    ///
    /// Returns an invalid schema error if the schema does not compile.
    pub fn compile(schema: &JsonValue) -> Result<Self, GenerationError> {
        let compiled = JSONSchema::compile(schema).map_err(|e| {
            GenerationError::new(GenerationErrorKind::InvalidSchema(e.to_string()))
        })?;
        Ok(Self { compiled })
    }

    /// Validate a value and return its canonical serialization.
    ///
    /// # Errors
    ///
    /// Returns a schema validation error listing every violation.
    pub fn validate(&self, value: &JsonValue) -> Result<String, GenerationError> {
        if let Err(errors) = self.compiled.validate(value) {
            let messages: Vec<String> = errors
                .map(|e| format!("{} at '{}'", e, e.instance_path))
                .collect();
            return Err(GenerationError::new(GenerationErrorKind::SchemaValidation(
                messages.join("; "),
            )));
        }

        serde_json::to_string(value).map_err(|e| {
            GenerationError::new(GenerationErrorKind::SchemaValidation(e.to_string()))
        })
    }
}

fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_fence = start + 3;
    // Skip the language tag, if any
    let content_start = response[after_fence..]
        .find('\n')
        .map(|n| after_fence + n + 1)
        .unwrap_or(after_fence);

    let content = match response[content_start..].find("```") {
        Some(end) => &response[content_start..content_start + end],
        // Unterminated fence: the response was likely truncated
        None => &response[content_start..],
    };
    let content = content.trim();
    (!content.is_empty()).then(|| content.to_string())
}

fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_balanced_braces() {
        let response = r#"Sure! Here it is: {"id": 456, "nested": {"value": "te}st"}} Enjoy."#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"id": 456, "nested": {"value": "te}st"}}"#);
    }

    #[test]
    fn test_extract_json_prefers_first_structure() {
        let response = r#"Results: [{"a": 1}, {"a": 2}]"#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_extract_json_missing() {
        assert!(extract_json("no structure here").is_err());
    }

    #[test]
    fn test_parse_structured_passes_values_through() {
        let value = json!({"a": 1});
        assert_eq!(parse_structured(value.clone()).unwrap(), value);
        assert_eq!(
            parse_structured(json!("```\n{\"a\": 1}\n```")).unwrap(),
            value
        );
    }

    #[test]
    fn test_schema_validation() {
        let validator = SchemaValidator::compile(&json!({
            "type": "object",
            "properties": {"slogan": {"type": "string"}},
            "required": ["slogan"]
        }))
        .unwrap();

        assert_eq!(
            validator.validate(&json!({"slogan": "Up"})).unwrap(),
            r#"{"slogan":"Up"}"#
        );
        assert!(validator.validate(&json!({"other": 1})).is_err());
    }

    #[test]
    fn test_invalid_schema() {
        let result = SchemaValidator::compile(&json!({"type": 12}));
        assert!(matches!(
            result.map(|_| ()).unwrap_err().kind,
            GenerationErrorKind::InvalidSchema(_)
        ));
    }
}
