//! # docextract-core
//!
//! Accuracy scoring for structured data extracted from documents.
//!
//! Extraction models return a JSON document per scanned input. This crate
//! compares that document against hand-annotated expected values, field by
//! field, and reports which fields matched along with an overall accuracy.
//!
//! ```
//! use docextract_core::compare;
//! use serde_json::json;
//!
//! let expected = json!({"invoice": {"number": "INV-001", "lines": [10, 20]}});
//! let actual = json!({"invoice": {"number": "INV-001", "lines": [10, 25]}});
//!
//! let result = compare(&expected, &actual)?;
//! assert_eq!(result.valid_keys, vec!["invoice.number", "invoice.lines.0"]);
//! assert_eq!(result.invalid_keys, vec!["invoice.lines.1"]);
//! # Ok::<(), docextract_core::ScoreError>(())
//! ```
//!
//! ## Modules
//!
//! - [`scorer`] - Recursive expected-vs-actual comparison
//! - [`error`] - Errors for unscoreable input

pub mod error;
pub mod scorer;

pub use error::{Result, ScoreError, Side};
pub use scorer::{compare, compare_json, json_type_name, ComparisonResult};
