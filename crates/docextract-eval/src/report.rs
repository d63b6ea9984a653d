//! Result persistence and batch reporting.
//!
//! Each evaluated document is saved as `<name>.json` in a results directory.
//! A batch report aggregates every saved result into a markdown summary:
//!
//! - a per-document table of accuracy and verdict counts;
//! - mean, minimum and maximum accuracy across the batch;
//! - the invalid field paths of each document (first 20 shown).
//!
//! ```no_run
//! use docextract_eval::report::{generate_report, load_results};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let results = load_results(Path::new("results/"))?;
//! println!("{}", generate_report(&results));
//! # Ok(())
//! # }
//! ```

// Clippy pedantic allows:
// - Averages use f64 from usize
#![allow(clippy::cast_precision_loss)]

use crate::pipeline::EvaluationResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Invalid field paths listed per document before truncating.
const MAX_LISTED_INVALID: usize = 20;

/// Aggregate accuracy across a batch of evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of documents evaluated
    pub documents: usize,
    /// Mean accuracy (0.0-1.0)
    pub mean_accuracy: f64,
    /// Lowest document accuracy
    pub min_accuracy: f64,
    /// Highest document accuracy
    pub max_accuracy: f64,
    /// Documents where every compared field matched
    pub perfect_documents: usize,
}

impl BatchSummary {
    /// Summarise a batch. An empty batch yields all zeros.
    #[must_use = "computes batch summary"]
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let accuracies = results.iter().map(|r| r.comparison.accuracy);

        Self {
            documents: results.len(),
            mean_accuracy: accuracies.clone().sum::<f64>() / results.len() as f64,
            min_accuracy: accuracies.clone().fold(f64::INFINITY, f64::min),
            max_accuracy: accuracies.fold(f64::NEG_INFINITY, f64::max),
            perfect_documents: results.iter().filter(|r| r.comparison.is_perfect()).count(),
        }
    }
}

/// Generate a markdown report for a batch of evaluations.
#[must_use = "generates evaluation report"]
pub fn generate_report(results: &[EvaluationResult]) -> String {
    let mut report = String::new();
    let summary = BatchSummary::from_results(results);

    report.push_str("# Document Extraction Accuracy Report\n\n");
    let _ = writeln!(
        report,
        "Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    report.push_str("## Summary\n\n");
    report.push_str("| Document | Accuracy | Valid Fields | Invalid Fields |\n");
    report.push_str("|----------|----------|--------------|----------------|\n");

    for r in results {
        let _ = writeln!(
            report,
            "| {} | {:.1}% | {} | {} |",
            r.name,
            r.comparison.accuracy * 100.0,
            r.comparison.valid_keys.len(),
            r.comparison.invalid_keys.len()
        );
    }

    let _ = writeln!(report, "\n**Documents:** {}", summary.documents);
    let _ = writeln!(
        report,
        "**Average Accuracy:** {:.1}%",
        summary.mean_accuracy * 100.0
    );
    let _ = writeln!(
        report,
        "**Accuracy Range:** {:.1}% - {:.1}%",
        summary.min_accuracy * 100.0,
        summary.max_accuracy * 100.0
    );
    let _ = writeln!(
        report,
        "**Perfect Extractions:** {}/{}",
        summary.perfect_documents, summary.documents
    );

    let with_errors: Vec<_> = results
        .iter()
        .filter(|r| !r.comparison.invalid_keys.is_empty())
        .collect();

    if !with_errors.is_empty() {
        report.push_str("\n## Invalid Fields\n\n");

        for r in with_errors {
            let _ = writeln!(report, "### {}\n", r.name);
            for key in r.comparison.invalid_keys.iter().take(MAX_LISTED_INVALID) {
                let _ = writeln!(report, "- `{key}`");
            }
            let hidden = r
                .comparison
                .invalid_keys
                .len()
                .saturating_sub(MAX_LISTED_INVALID);
            if hidden > 0 {
                let _ = writeln!(report, "- ... and {hidden} more");
            }
            report.push('\n');
        }
    }

    report
}

/// Save an evaluation result as `<name>.json` in `output_dir`.
///
/// # Errors
///
/// Returns an error if the name is not a plain file name (empty, `.`, `..`,
/// or containing a path separator), or if the directory cannot be created or
/// the file written.
pub fn save_result(result: &EvaluationResult, output_dir: &Path) -> Result<PathBuf> {
    let name = result.name.as_str();
    if matches!(name, "" | "." | "..") || name.contains(['/', '\\', '\0']) {
        anyhow::bail!("Invalid result name {name:?}: must be a plain file name");
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let path = output_dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Load every saved evaluation result in `dir`, ordered by file name.
///
/// JSON files that are not evaluation results are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn load_results(dir: &Path) -> Result<Vec<EvaluationResult>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read results directory {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    paths.sort();

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|json| Ok(serde_json::from_str::<EvaluationResult>(&json)?));
        match parsed {
            Ok(result) => results.push(result),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(results)
}
