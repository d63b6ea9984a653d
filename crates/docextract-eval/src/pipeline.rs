//! Extraction and evaluation pipeline.
//!
//! Ties together a model completion and the structural scorer: the JSON
//! payload is recovered from the completion, parsed, and compared against the
//! expected document.

// Clippy pedantic allows:
// - Latency seconds use f64 from u64
#![allow(clippy::cast_precision_loss)]

use crate::client::{extract_json, ExtractionRequest, VisionClient};
use anyhow::{Context, Result};
use docextract_core::{compare, json_type_name, ComparisonResult, ScoreError, Side};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Evaluation of one document's extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Document name (usually the image directory name)
    pub name: String,
    /// Field-level comparison against the expected document
    pub comparison: ComparisonResult,
    /// Raw completion text the comparison was computed from
    pub extraction: String,
}

/// Score a model completion against the expected document.
///
/// A completion that is not valid JSON, or whose root is not an object, is
/// scored as if every top-level expected field were missing.
///
/// # Errors
///
/// Returns an error if the expected document's root is not an object.
pub fn evaluate_extraction(
    name: &str,
    expected: &Value,
    completion: &str,
) -> Result<EvaluationResult> {
    let expected_fields = expected.as_object().ok_or_else(|| ScoreError::RootNotMapping {
        side: Side::Expected,
        found: json_type_name(expected),
    })?;

    let comparison = match serde_json::from_str::<Value>(extract_json(completion)) {
        Ok(actual) if actual.is_object() => compare(expected, &actual)?,
        Ok(_) => {
            warn!("{}: extraction root is not an object, scoring all fields invalid", name);
            all_invalid(expected_fields.keys())
        }
        Err(e) => {
            warn!("{}: extraction is not valid JSON ({}), scoring all fields invalid", name, e);
            all_invalid(expected_fields.keys())
        }
    };

    Ok(EvaluationResult {
        name: name.to_string(),
        comparison,
        extraction: completion.to_string(),
    })
}

fn all_invalid<'a>(keys: impl Iterator<Item = &'a String>) -> ComparisonResult {
    ComparisonResult {
        valid_keys: Vec::new(),
        invalid_keys: keys.cloned().collect(),
        accuracy: 0.0,
    }
}

/// Runs extraction followed by evaluation.
#[derive(Debug, Clone)]
pub struct Evaluator {
    client: VisionClient,
}

impl Evaluator {
    /// Create an evaluator backed by the given client.
    #[must_use = "creates an evaluator"]
    pub const fn new(client: VisionClient) -> Self {
        Self { client }
    }

    /// Extract a document and score it against the expected values.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction request fails or the expected
    /// document's root is not an object.
    pub async fn run(
        &self,
        name: &str,
        request: &ExtractionRequest,
        expected: &Value,
    ) -> Result<EvaluationResult> {
        info!("Extracting {} ({} page image(s))", name, request.image_uris.len());

        let extraction = self
            .client
            .extract_document_data(request)
            .await
            .with_context(|| format!("Extraction failed for {name}"))?;

        info!(
            "  {}: {:.3}s, {} prompt / {} completion tokens",
            extraction.model,
            extraction.latency_ms as f64 / 1000.0,
            extraction.prompt_tokens,
            extraction.completion_tokens
        );

        let result = evaluate_extraction(name, expected, &extraction.content)?;
        info!(
            "  Accuracy: {:.1}% ({} valid, {} invalid)",
            result.comparison.accuracy * 100.0,
            result.comparison.valid_keys.len(),
            result.comparison.invalid_keys.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_evaluate_fenced_completion() {
        let expected = json!({"vendor": "Contoso", "total": 42.0});
        let completion = "```json\n{\"vendor\": \"Contoso\", \"total\": 40.0}\n```";

        let result = evaluate_extraction("invoice-1", &expected, completion).expect("scored");
        assert_eq!(result.name, "invoice-1");
        assert_eq!(result.comparison.valid_keys, vec!["vendor"]);
        assert_eq!(result.comparison.invalid_keys, vec!["total"]);
        assert_eq!(result.comparison.accuracy, 0.5);
        assert_eq!(result.extraction, completion);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_evaluate_malformed_completion() {
        let expected = json!({"vendor": "Contoso", "lines": [{"qty": 1}]});
        let result =
            evaluate_extraction("bad", &expected, "I could not read the document.").expect("scored");
        assert!(result.comparison.valid_keys.is_empty());
        assert_eq!(result.comparison.invalid_keys, vec!["vendor", "lines"]);
        assert_eq!(result.comparison.accuracy, 0.0);
    }

    #[test]
    fn test_evaluate_non_object_completion() {
        let expected = json!({"a": 1});
        let result = evaluate_extraction("arr", &expected, "[1, 2, 3]").expect("scored");
        assert_eq!(result.comparison.invalid_keys, vec!["a"]);
    }

    #[test]
    fn test_evaluate_rejects_non_object_expected() {
        let err = evaluate_extraction("x", &json!([1]), "{}").unwrap_err();
        assert!(err.to_string().contains("expected document root must be an object"));
    }
}
