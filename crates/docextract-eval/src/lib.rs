//! # docextract-eval
//!
//! Vision-model data extraction from scanned documents, with field-level
//! accuracy evaluation against expected values.
//!
//! ## Overview
//!
//! The evaluation workflow:
//! 1. Load the document's page images and encode them as data URIs
//! 2. Send them with a system prompt and an extraction prompt to a vision model
//! 3. Recover the JSON object from the completion
//! 4. Score it against the expected document with [`docextract_core::compare`]
//! 5. Save per-document results and generate a batch report
//!
//! ## Example Usage
//!
//! ```no_run
//! use docextract_eval::{
//!     images::load_images, report::generate_report, ExtractionConfig, ExtractionRequest,
//!     Evaluator, VisionClient,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ExtractionConfig::from_env();
//! let evaluator = Evaluator::new(VisionClient::new(config.clone())?);
//!
//! let pages = load_images(Path::new("scans/invoice-001"))?;
//! let request = ExtractionRequest {
//!     system_prompt: std::fs::read_to_string("prompts/system.txt")?,
//!     extraction_prompt: std::fs::read_to_string("prompts/invoice.txt")?,
//!     temperature: config.temperature,
//!     top_p: config.top_p,
//!     image_uris: pages.iter().map(|p| p.data_uri()).collect(),
//! };
//!
//! let expected = serde_json::from_str(&std::fs::read_to_string("expected/invoice-001.json")?)?;
//! let result = evaluator.run("invoice-001", &request, &expected).await?;
//!
//! println!("{}", generate_report(&[result]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Endpoint, deployment and sampling configuration
//! - [`images`] - Page image loading and data URI encoding
//! - [`client`] - Chat completions client for vision extraction
//! - [`pipeline`] - Extraction plus scoring of a single document
//! - [`report`] - Result persistence and batch markdown reports

pub mod client;
pub mod config;
pub mod images;
pub mod pipeline;
pub mod report;

pub use client::{extract_json, ExtractionRequest, ExtractionResult, VisionClient};
pub use config::{ApiStyle, ExtractionConfig};
pub use docextract_core::{compare, ComparisonResult, ScoreError};
pub use images::{load_images, PageImage};
pub use pipeline::{evaluate_extraction, EvaluationResult, Evaluator};
pub use report::{generate_report, BatchSummary};
