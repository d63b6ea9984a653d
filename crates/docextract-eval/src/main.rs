//! Document Extraction Evaluation CLI
//!
//! Extract structured data from scanned documents with a vision model and
//! score it against expected values.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docextract_eval::{
    images::load_images, report, ExtractionConfig, ExtractionRequest, Evaluator, VisionClient,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "docextract-eval")]
#[command(about = "Vision-model document extraction and accuracy evaluation")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Prompt and sampling options shared by extraction commands
#[derive(clap::Args)]
struct PromptArgs {
    /// Directory of page images (one file per page, lexically ordered)
    #[arg(short, long)]
    images: PathBuf,

    /// File containing the system prompt
    #[arg(long)]
    system_prompt: PathBuf,

    /// File containing the extraction prompt and expected output format
    #[arg(long)]
    extraction_prompt: PathBuf,

    /// Sampling temperature (default: from EXTRACTION_TEMPERATURE or 0.1)
    #[arg(long)]
    temperature: Option<f64>,

    /// Top-p (default: from EXTRACTION_TOP_P or 0.1)
    #[arg(long)]
    top_p: Option<f64>,

    /// Model deployment (default: from EXTRACTION_MODEL_DEPLOYMENT or gpt-4o)
    #[arg(long)]
    deployment: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Score an extracted JSON document against the expected one
    Compare {
        /// Path to expected JSON
        #[arg(long)]
        expected: PathBuf,

        /// Path to actual (extracted) JSON
        #[arg(long)]
        actual: PathBuf,

        /// Write the comparison JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract structured data from a document's page images
    Extract {
        #[command(flatten)]
        prompts: PromptArgs,

        /// Write the completion here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a document and score it against expected values
    Evaluate {
        #[command(flatten)]
        prompts: PromptArgs,

        /// Path to expected JSON
        #[arg(long)]
        expected: PathBuf,

        /// Directory for the saved evaluation result
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Print a markdown report over saved evaluation results
    Report {
        /// Directory of saved evaluation results
        #[arg(long, default_value = "results")]
        results_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "docextract_eval=info"
                    .parse()
                    .expect("directive is compile-time constant"),
            ),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Compare {
            expected,
            actual,
            output,
        } => {
            compare(&expected, &actual, output.as_deref())?;
        }
        Command::Extract { prompts, output } => {
            extract(&prompts, output.as_deref()).await?;
        }
        Command::Evaluate {
            prompts,
            expected,
            output_dir,
        } => {
            evaluate(&prompts, &expected, &output_dir).await?;
        }
        Command::Report { results_dir } => {
            let results = report::load_results(&results_dir)?;
            info!("Loaded {} results", results.len());
            print!("{}", report::generate_report(&results));
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved to: {:?}", path);
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn compare(expected_path: &Path, actual_path: &Path, output: Option<&Path>) -> Result<()> {
    let expected = read_json(expected_path)?;
    let actual = read_json(actual_path)?;

    let result = docextract_eval::compare(&expected, &actual)?;
    info!(
        "Accuracy: {:.1}% ({} valid, {} invalid)",
        result.accuracy * 100.0,
        result.valid_keys.len(),
        result.invalid_keys.len()
    );

    write_or_print(output, &serde_json::to_string_pretty(&result)?)
}

/// Build the client config and request from CLI arguments.
fn prepare(prompts: &PromptArgs) -> Result<(ExtractionConfig, ExtractionRequest)> {
    let mut config = ExtractionConfig::from_env();
    if let Some(deployment) = &prompts.deployment {
        config.deployment.clone_from(deployment);
    }

    let pages = load_images(&prompts.images)?;
    if pages.is_empty() {
        anyhow::bail!("No images found in {}", prompts.images.display());
    }
    info!("Loaded {} page image(s) from {:?}", pages.len(), prompts.images);

    let request = ExtractionRequest {
        system_prompt: std::fs::read_to_string(&prompts.system_prompt)
            .context("Failed to read system prompt")?,
        extraction_prompt: std::fs::read_to_string(&prompts.extraction_prompt)
            .context("Failed to read extraction prompt")?,
        temperature: prompts.temperature.unwrap_or(config.temperature),
        top_p: prompts.top_p.unwrap_or(config.top_p),
        image_uris: pages.iter().map(docextract_eval::PageImage::data_uri).collect(),
    };

    Ok((config, request))
}

async fn extract(prompts: &PromptArgs, output: Option<&Path>) -> Result<()> {
    let (config, request) = prepare(prompts)?;
    let client = VisionClient::new(config)?;

    let result = client.extract_document_data(&request).await?;
    info!(
        "{}: {}ms, {} prompt / {} completion tokens",
        result.model, result.latency_ms, result.prompt_tokens, result.completion_tokens
    );

    write_or_print(output, &result.content)
}

async fn evaluate(prompts: &PromptArgs, expected_path: &Path, output_dir: &Path) -> Result<()> {
    let expected = read_json(expected_path)?;
    let (config, request) = prepare(prompts)?;
    let evaluator = Evaluator::new(VisionClient::new(config)?);

    let name = prompts.images.file_name().map_or_else(
        || "document".to_string(),
        |n| n.to_string_lossy().to_string(),
    );

    let result = evaluator.run(&name, &request, &expected).await?;
    let path = report::save_result(&result, output_dir)?;
    info!("Saved evaluation to: {:?}", path);

    println!(
        "{}: {:.1}% accuracy ({} valid, {} invalid)",
        result.name,
        result.comparison.accuracy * 100.0,
        result.comparison.valid_keys.len(),
        result.comparison.invalid_keys.len()
    );

    Ok(())
}
