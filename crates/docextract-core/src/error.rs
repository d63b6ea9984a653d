//! Error types for structural accuracy scoring.
//!
//! Scoring itself is lenient: missing keys and mismatched shapes below the
//! root are bookkept as invalid field paths, never raised. The errors here
//! cover inputs that cannot be scored at all.
//!
//! # Examples
//!
//! ```
//! use docextract_core::{compare, ScoreError, Side};
//! use serde_json::json;
//!
//! let err = compare(&json!([1, 2]), &json!({})).unwrap_err();
//! match err {
//!     ScoreError::RootNotMapping { side, found } => {
//!         assert_eq!(side, Side::Expected);
//!         assert_eq!(found, "array");
//!     }
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Which of the two documents an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The ground-truth document.
    Expected,
    /// The extracted document under evaluation.
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => write!(f, "expected"),
            Self::Actual => write!(f, "actual"),
        }
    }
}

/// Errors that prevent a comparison from being scored.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The root of a document is not a JSON object.
    #[error("{side} document root must be an object, found {found}")]
    RootNotMapping {
        /// Document whose root is malformed
        side: Side,
        /// JSON type found at the root
        found: &'static str,
    },

    /// A document could not be parsed as JSON.
    #[error("{side} document is not valid JSON: {source}")]
    InvalidJson {
        /// Document that failed to parse
        side: Side,
        /// Underlying parser error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for scoring operations.
pub type Result<T> = std::result::Result<T, ScoreError>;
