//! Structural accuracy scoring of extracted documents.
//!
//! The scorer walks the expected tree and gives every leaf field a verdict:
//! valid when the extracted document holds an equal value at the same field
//! path, invalid otherwise. Accuracy is the share of valid verdicts.
//!
//! ## Field Paths
//!
//! Paths join mapping keys with `.`; sequence elements contribute their index
//! as a segment. `{"items": [{"sku": "A"}]}` yields the path `items.0.sku`.
//!
//! A key that itself contains `.` or `\` has those characters escaped with a
//! backslash, so `{"a.b": 1}` yields `a\.b` and never collides with the nested
//! path `a.b` of `{"a": {"b": 1}}`.
//!
//! ## Rules
//!
//! - Only keys of the expected tree are visited. Extra keys in the extracted
//!   document are ignored.
//! - A key missing from the extracted document is one invalid verdict, however
//!   deep the expected subtree is.
//! - A sequence whose counterpart is not a sequence of the same length is one
//!   invalid verdict. There is no partial credit for overlapping elements.
//! - A container whose counterpart has a different shape is one invalid verdict.
//! - Scalars must be equal in type and value. Numbers compare by value, so `1`
//!   and `1.0` match, while `1` and `"1"` do not.
//! - Every field path receives at most one verdict, even when keys contain the
//!   path separator.
//!
//! ## Example
//!
//! ```
//! use docextract_core::compare;
//! use serde_json::json;
//!
//! let expected = json!({"name": "Alice", "age": 30});
//! let actual = json!({"name": "Alice", "age": 31});
//!
//! let result = compare(&expected, &actual)?;
//! assert_eq!(result.valid_keys, vec!["name"]);
//! assert_eq!(result.invalid_keys, vec!["age"]);
//! assert!((result.accuracy - 0.5).abs() < f64::EPSILON);
//! # Ok::<(), docextract_core::ScoreError>(())
//! ```

// Clippy pedantic allows:
// - Accuracy ratio uses f64 from usize
#![allow(clippy::cast_precision_loss)]

use crate::error::{Result, ScoreError, Side};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;

/// Outcome of comparing an extracted document against its expected values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Field paths whose extracted value matched, in traversal order
    pub valid_keys: Vec<String>,
    /// Field paths that were missing, mismatched or structurally incompatible
    pub invalid_keys: Vec<String>,
    /// Ratio of valid to compared field paths (0.0-1.0)
    pub accuracy: f64,
}

impl ComparisonResult {
    /// Number of field paths that received a verdict.
    #[inline]
    #[must_use = "returns number of compared field paths"]
    pub fn total(&self) -> usize {
        self.valid_keys.len() + self.invalid_keys.len()
    }

    /// True when at least one field was compared and all of them matched.
    #[inline]
    #[must_use = "returns whether every compared field matched"]
    pub fn is_perfect(&self) -> bool {
        !self.valid_keys.is_empty() && self.invalid_keys.is_empty()
    }
}

/// Verdicts collected while walking the expected tree.
#[derive(Debug, Default)]
struct Accumulator {
    valid: Vec<String>,
    invalid: Vec<String>,
}

impl Accumulator {
    fn record(&mut self, path: String, matched: bool) {
        if matched {
            self.valid.push(path);
        } else {
            self.invalid.push(path);
        }
    }

    fn reject(&mut self, path: String) {
        self.invalid.push(path);
    }

    fn finish(self) -> ComparisonResult {
        let total = self.valid.len() + self.invalid.len();
        let accuracy = if total == 0 {
            0.0
        } else {
            self.valid.len() as f64 / total as f64
        };

        ComparisonResult {
            valid_keys: self.valid,
            invalid_keys: self.invalid,
            accuracy,
        }
    }
}

/// Compare an extracted document against the expected one.
///
/// Both roots must be JSON objects.
///
/// # Errors
///
/// Returns [`ScoreError::RootNotMapping`] if either root is not an object.
/// Mismatches below the root never fail; they become invalid field paths.
pub fn compare(expected: &Value, actual: &Value) -> Result<ComparisonResult> {
    let expected = root_mapping(expected, Side::Expected)?;
    let actual = root_mapping(actual, Side::Actual)?;

    let mut acc = Accumulator::default();
    compare_mapping(expected, actual, "", &mut acc);
    Ok(acc.finish())
}

/// Parse two JSON documents and compare them.
///
/// # Errors
///
/// Returns [`ScoreError::InvalidJson`] if either document fails to parse, or
/// [`ScoreError::RootNotMapping`] if either root is not an object.
pub fn compare_json(expected: &str, actual: &str) -> Result<ComparisonResult> {
    let expected: Value = serde_json::from_str(expected).map_err(|source| {
        ScoreError::InvalidJson {
            side: Side::Expected,
            source,
        }
    })?;
    let actual: Value = serde_json::from_str(actual).map_err(|source| ScoreError::InvalidJson {
        side: Side::Actual,
        source,
    })?;

    compare(&expected, &actual)
}

fn root_mapping(value: &Value, side: Side) -> Result<&Map<String, Value>> {
    value.as_object().ok_or(ScoreError::RootNotMapping {
        side,
        found: json_type_name(value),
    })
}

fn compare_mapping(
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    parent: &str,
    acc: &mut Accumulator,
) {
    for (key, expected_value) in expected {
        let path = field_path(parent, key);
        match actual.get(key) {
            Some(actual_value) => compare_value(expected_value, actual_value, path, acc),
            None => acc.reject(path),
        }
    }
}

fn compare_value(expected: &Value, actual: &Value, path: String, acc: &mut Accumulator) {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            compare_mapping(expected, actual, &path, acc);
        }
        (Value::Array(expected), Value::Array(actual)) if expected.len() == actual.len() => {
            for (i, (expected_item, actual_item)) in expected.iter().zip(actual).enumerate() {
                let item_path = field_path(&path, &i.to_string());
                compare_value(expected_item, actual_item, item_path, acc);
            }
        }
        (Value::Object(_) | Value::Array(_), _) => acc.reject(path),
        (expected, actual) => acc.record(path, scalars_equal(expected, actual)),
    }
}

fn field_path(parent: &str, key: &str) -> String {
    let segment = path_segment(key);
    if parent.is_empty() {
        segment.into_owned()
    } else {
        format!("{parent}.{segment}")
    }
}

// `\` and `.` are escaped so distinct key sequences never join to the same path.
fn path_segment(key: &str) -> Cow<'_, str> {
    if key.contains(['.', '\\']) {
        Cow::Owned(key.replace('\\', "\\\\").replace('.', "\\."))
    } else {
        Cow::Borrowed(key)
    }
}

fn scalars_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(expected), Value::Number(actual)) => numbers_equal(expected, actual),
        _ => expected == actual,
    }
}

// Integer pairs compare exactly; anything involving a float compares as f64.
#[allow(clippy::float_cmp)]
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    if a.is_f64() || b.is_f64() {
        return matches!((a.as_f64(), b.as_f64()), (Some(a), Some(b)) if a == b);
    }
    false
}

/// Name of a JSON value's type, as used in error messages.
#[must_use = "returns the JSON type name"]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(expected: &Value, actual: &Value) -> ComparisonResult {
        compare(expected, actual).expect("roots are objects")
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_scalar_mismatch() {
        let result = score(
            &json!({"name": "Alice", "age": 30}),
            &json!({"name": "Alice", "age": 31}),
        );
        assert_eq!(result.valid_keys, vec!["name"]);
        assert_eq!(result.invalid_keys, vec!["age"]);
        assert_eq!(result.accuracy, 0.5);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_sequence_length_mismatch() {
        let result = score(&json!({"items": [1, 2, 3]}), &json!({"items": [1, 2]}));
        assert!(result.valid_keys.is_empty());
        assert_eq!(result.invalid_keys, vec!["items"]);
        assert_eq!(result.accuracy, 0.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_nested_mapping_match() {
        let result = score(
            &json!({"addr": {"city": "NY"}}),
            &json!({"addr": {"city": "NY"}}),
        );
        assert_eq!(result.valid_keys, vec!["addr.city"]);
        assert!(result.invalid_keys.is_empty());
        assert_eq!(result.accuracy, 1.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_missing_key_does_not_descend() {
        let result = score(&json!({"a": {"b": 1}}), &json!({}));
        assert!(result.valid_keys.is_empty());
        assert_eq!(result.invalid_keys, vec!["a"]);
        assert_eq!(result.accuracy, 0.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_sequence_elementwise() {
        let result = score(&json!({"tags": ["x", "y"]}), &json!({"tags": ["x", "z"]}));
        assert_eq!(result.valid_keys, vec!["tags.0"]);
        assert_eq!(result.invalid_keys, vec!["tags.1"]);
        assert_eq!(result.accuracy, 0.5);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_empty_expected() {
        let result = score(&json!({}), &json!({"extra": true}));
        assert_eq!(result.total(), 0);
        assert_eq!(result.accuracy, 0.0);
        assert!(!result.is_perfect());
    }

    #[test]
    fn test_extra_actual_keys_ignored() {
        let result = score(&json!({"a": 1}), &json!({"a": 1, "b": 2, "c": {"d": 3}}));
        assert_eq!(result.valid_keys, vec!["a"]);
        assert!(result.invalid_keys.is_empty());
        assert!(result.is_perfect());
    }

    #[test]
    fn test_sequence_of_mappings() {
        let expected = json!({
            "items": [
                {"sku": "A-1", "qty": 2},
                {"sku": "B-7", "qty": 1}
            ]
        });
        let actual = json!({
            "items": [
                {"sku": "A-1", "qty": 2},
                {"sku": "B-1", "qty": 1}
            ]
        });
        let result = score(&expected, &actual);
        assert_eq!(
            result.valid_keys,
            vec!["items.0.sku", "items.0.qty", "items.1.qty"]
        );
        assert_eq!(result.invalid_keys, vec!["items.1.sku"]);
    }

    #[test]
    fn test_nested_sequences() {
        let result = score(
            &json!({"grid": [[1, 2], [3]]}),
            &json!({"grid": [[1, 2], [3, 4]]}),
        );
        assert_eq!(result.valid_keys, vec!["grid.0.0", "grid.0.1"]);
        assert_eq!(result.invalid_keys, vec!["grid.1"]);
    }

    #[test]
    fn test_mapping_against_scalar_is_invalid() {
        let result = score(
            &json!({"addr": {"city": "NY", "zip": "10001"}, "name": "Bob"}),
            &json!({"addr": "NY 10001", "name": "Bob"}),
        );
        assert_eq!(result.valid_keys, vec!["name"]);
        assert_eq!(result.invalid_keys, vec!["addr"]);
    }

    #[test]
    fn test_sequence_against_mapping_is_invalid() {
        let result = score(&json!({"tags": ["x"]}), &json!({"tags": {"0": "x"}}));
        assert_eq!(result.invalid_keys, vec!["tags"]);
    }

    #[test]
    fn test_scalar_against_container_is_invalid() {
        let result = score(&json!({"total": 12}), &json!({"total": [12]}));
        assert_eq!(result.invalid_keys, vec!["total"]);
    }

    #[test]
    fn test_no_type_coercion() {
        let result = score(
            &json!({"a": 1, "b": true, "c": null, "d": "1"}),
            &json!({"a": "1", "b": 1, "c": "", "d": 1}),
        );
        assert!(result.valid_keys.is_empty());
        assert_eq!(result.invalid_keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let result = score(
            &json!({"int": 1, "float": 2.5, "neg": -3}),
            &json!({"int": 1.0, "float": 2.5, "neg": -3}),
        );
        assert_eq!(result.valid_keys, vec!["int", "float", "neg"]);
        assert!(result.invalid_keys.is_empty());
    }

    #[test]
    fn test_null_matches_null() {
        let result = score(&json!({"middle_name": null}), &json!({"middle_name": null}));
        assert_eq!(result.valid_keys, vec!["middle_name"]);
    }

    #[test]
    fn test_empty_containers_yield_no_verdicts() {
        let result = score(
            &json!({"notes": [], "meta": {}, "id": 7}),
            &json!({"notes": [], "meta": {"x": 1}, "id": 7}),
        );
        assert_eq!(result.valid_keys, vec!["id"]);
        assert!(result.invalid_keys.is_empty());
    }

    #[test]
    fn test_empty_mapping_against_scalar_is_invalid() {
        assert_eq!(score(&json!({"meta": {}}), &json!({"meta": 5})).invalid_keys, vec!["meta"]);
    }

    #[test]
    fn test_dotted_keys_do_not_collide() {
        let result = score(
            &json!({"a.b": 1, "a": {"b": 2}}),
            &json!({"a.b": 1, "a": {"b": 3}}),
        );
        assert_eq!(result.valid_keys, vec![r"a\.b"]);
        assert_eq!(result.invalid_keys, vec!["a.b"]);
    }

    #[test]
    fn test_key_order_irrelevant() {
        let a = score(
            &json!({"x": 1, "y": 2}),
            &json!({"y": 2, "x": 0}),
        );
        assert_eq!(a.valid_keys, vec!["y"]);
        assert_eq!(a.invalid_keys, vec!["x"]);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = compare(&json!("text"), &json!({})).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::RootNotMapping {
                side: Side::Expected,
                found: "string"
            }
        ));

        let err = compare(&json!({}), &json!(null)).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::RootNotMapping {
                side: Side::Actual,
                found: "null"
            }
        ));
    }

    #[test]
    fn test_compare_json() {
        let result = compare_json(r#"{"a": {"b": [1, 2]}}"#, r#"{"a": {"b": [1, 3]}}"#)
            .expect("valid documents");
        assert_eq!(result.valid_keys, vec!["a.b.0"]);
        assert_eq!(result.invalid_keys, vec!["a.b.1"]);
    }

    #[test]
    fn test_compare_json_reports_side() {
        let err = compare_json("{}", "not json").unwrap_err();
        assert!(matches!(
            err,
            ScoreError::InvalidJson {
                side: Side::Actual,
                ..
            }
        ));
    }

    #[test]
    fn test_field_path() {
        assert_eq!(field_path("", "name"), "name");
        assert_eq!(field_path("addr", "city"), "addr.city");
        assert_eq!(field_path("items.0", "sku"), "items.0.sku");
        assert_eq!(field_path("", "a.b"), r"a\.b");
        assert_eq!(field_path("dir", r"c:\tmp"), r"dir.c:\\tmp");
        assert_eq!(field_path(r"a\.b", "c"), r"a\.b.c");
    }

    #[test]
    fn test_result_serializes_with_field_names() {
        let result = score(&json!({"a": 1}), &json!({"a": 2}));
        let json = serde_json::to_value(&result).expect("serializable");
        assert_eq!(
            json,
            json!({"valid_keys": [], "invalid_keys": ["a"], "accuracy": 0.0})
        );
    }
}
