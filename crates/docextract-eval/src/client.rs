//! Chat completions client for vision-based document extraction.
//!
//! Sends a system prompt, an extraction prompt and the document's page images
//! to a vision-capable model and returns the raw completion text. Prompt
//! wording is entirely up to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use docextract_eval::client::{ExtractionRequest, VisionClient};
//! use docextract_eval::ExtractionConfig;
//!
//! # async fn example(image_uris: Vec<String>) -> anyhow::Result<()> {
//! let config = ExtractionConfig::from_env();
//! let client = VisionClient::new(config.clone())?;
//!
//! let request = ExtractionRequest {
//!     system_prompt: "You are an AI assistant that extracts data from documents.".into(),
//!     extraction_prompt: "Extract the invoice as JSON: {\"number\": \"\", \"total\": 0}".into(),
//!     temperature: config.temperature,
//!     top_p: config.top_p,
//!     image_uris,
//! };
//!
//! let result = client.extract_document_data(&request).await?;
//! println!("{} tokens in, {} out", result.prompt_tokens, result.completion_tokens);
//! # Ok(())
//! # }
//! ```
//!
//! ## Endpoints
//!
//! | Endpoint | URL | Auth header |
//! |----------|-----|-------------|
//! | Azure OpenAI | `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...` | `api-key` |
//! | OpenAI-compatible | `{endpoint}/chat/completions` | `Authorization: Bearer` |
//!
//! The convention is detected from the endpoint host unless
//! [`ExtractionConfig::api_style`] pins it.

// Clippy pedantic allows:
// - Latency in milliseconds
#![allow(clippy::cast_possible_truncation)]

use crate::config::ExtractionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Chat completions request with multimodal user content.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<Message>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

/// Chat message (text or multimodal)
#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    #[serde(flatten)]
    content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text { content: String },
    Multimodal { content: Vec<ContentPart> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Inputs for a single document extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Instructions for the model's role
    pub system_prompt: String,
    /// Extraction instructions including the expected output format
    pub extraction_prompt: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling cutoff
    pub top_p: f64,
    /// Page images as `data:` URIs, in page order
    pub image_uris: Vec<String>,
}

/// Completion returned for an extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Deployment or model that produced the completion
    pub model: String,
    /// Raw completion text
    pub content: String,
    /// Prompt tokens consumed (0 if not reported)
    pub prompt_tokens: u32,
    /// Completion tokens generated (0 if not reported)
    pub completion_tokens: u32,
    /// Wall-clock request latency
    pub latency_ms: u64,
}

/// HTTP client for vision chat completions
#[derive(Debug, Clone)]
pub struct VisionClient {
    http_client: reqwest::Client,
    config: ExtractionConfig,
    api_key: String,
}

impl VisionClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or HTTP client creation fails.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("No API key configured. Set AZURE_OPENAI_API_KEY or OPENAI_API_KEY")?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            config,
            api_key,
        })
    }

    /// Configuration this client was built with.
    #[inline]
    #[must_use = "returns the client configuration"]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract structured data from document images.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API returns a non-success
    /// status, or the response carries no completion content.
    pub async fn extract_document_data(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult> {
        let start = Instant::now();
        let body = build_chat_request(&self.config, request);
        let url = self.config.chat_completions_url();

        debug!(
            "Sending extraction request to {} with {} image(s)",
            url,
            request.image_uris.len()
        );

        let builder = self.http_client.post(&url).json(&body);
        let builder = if self.config.is_azure() {
            builder.header("api-key", &self.api_key)
        } else {
            builder.bearer_auth(&self.api_key)
        };

        let response = builder
            .send()
            .await
            .context("Failed to send chat completions request")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read chat completions response")?;

        if !status.is_success() {
            anyhow::bail!("Chat completions request failed with status {status}: {response_text}");
        }

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completions response")?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let usage = chat_response.usage.unwrap_or_default();

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .context("No choices in chat completions response")?
            .message
            .content
            .context("No content in chat completions response")?;

        Ok(ExtractionResult {
            model: self.config.deployment.clone(),
            content,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            latency_ms,
        })
    }
}

fn build_chat_request(config: &ExtractionConfig, request: &ExtractionRequest) -> ChatRequest {
    let mut parts = Vec::with_capacity(request.image_uris.len() + 1);
    parts.push(ContentPart::Text {
        text: request.extraction_prompt.clone(),
    });
    parts.extend(request.image_uris.iter().map(|uri| ContentPart::ImageUrl {
        image_url: ImageUrl { url: uri.clone() },
    }));

    // Azure selects the model by deployment in the URL
    let model = (!config.is_azure()).then(|| config.deployment.clone());

    ChatRequest {
        model,
        messages: vec![
            Message {
                role: "system".to_string(),
                content: MessageContent::Text {
                    content: request.system_prompt.clone(),
                },
            },
            Message {
                role: "user".to_string(),
                content: MessageContent::Multimodal { content: parts },
            },
        ],
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: config.max_tokens,
    }
}

/// Extract JSON from a completion, handling markdown code blocks.
#[must_use = "returns the JSON portion of the completion"]
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    // Handle ```json ... ``` wrapper
    if text.starts_with("```") {
        if let Some(start) = text.find('\n') {
            let after_first_line = &text[start + 1..];
            if let Some(end) = after_first_line.rfind("```") {
                return after_first_line[..end].trim();
            }
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text
}
