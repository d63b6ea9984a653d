//! Configuration for vision-model extraction

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default endpoint when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default Azure OpenAI API version.
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

/// Request and authentication convention of a chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// Deployment in the URL path, `api-key` header
    Azure,
    /// `model` in the request body, bearer token
    OpenAi,
}

impl FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown API style: {other}")),
        }
    }
}

/// Configuration for extraction requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Base URL of the chat completions API (Azure resource or OpenAI-compatible)
    pub endpoint: String,

    /// API key sent with every request
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Endpoint convention; `None` detects it from the endpoint host
    #[serde(default)]
    pub api_style: Option<ApiStyle>,

    /// Model deployment name (e.g., "gpt-4o")
    pub deployment: String,

    /// API version query parameter (Azure only)
    pub api_version: String,

    /// Sampling temperature; low values keep extractions deterministic
    pub temperature: f64,

    /// Nucleus sampling cutoff
    pub top_p: f64,

    /// Maximum tokens for the completion
    pub max_tokens: u32,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl ExtractionConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `AZURE_OPENAI_ENDPOINT`: API base URL (default: `https://api.openai.com/v1`)
    /// - `AZURE_OPENAI_API_KEY` or `OPENAI_API_KEY`: API key
    /// - `EXTRACTION_API_STYLE`: `azure` or `openai` (default: detected from the endpoint)
    /// - `EXTRACTION_MODEL_DEPLOYMENT`: Deployment name (default: "gpt-4o")
    /// - `AZURE_OPENAI_API_VERSION`: API version (default: "2024-05-01-preview")
    /// - `EXTRACTION_TEMPERATURE`: Temperature (default: 0.1)
    /// - `EXTRACTION_TOP_P`: Top-p (default: 0.1)
    /// - `EXTRACTION_MAX_TOKENS`: Max tokens (default: 4096)
    /// - `EXTRACTION_TIMEOUT_SECS`: Request timeout (default: 120)
    #[must_use = "creates config from environment variables"]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let endpoint = env::var("AZURE_OPENAI_ENDPOINT").unwrap_or(defaults.endpoint);

        // An empty variable counts as unset so the fallback still applies
        let api_key =
            non_empty_env("AZURE_OPENAI_API_KEY").or_else(|| non_empty_env("OPENAI_API_KEY"));

        let api_style = parse_env("EXTRACTION_API_STYLE");

        let deployment =
            env::var("EXTRACTION_MODEL_DEPLOYMENT").unwrap_or(defaults.deployment);

        let api_version = env::var("AZURE_OPENAI_API_VERSION").unwrap_or(defaults.api_version);

        Self {
            endpoint,
            api_key,
            api_style,
            deployment,
            api_version,
            temperature: parse_env("EXTRACTION_TEMPERATURE").unwrap_or(defaults.temperature),
            top_p: parse_env("EXTRACTION_TOP_P").unwrap_or(defaults.top_p),
            max_tokens: parse_env("EXTRACTION_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout_secs: parse_env("EXTRACTION_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
        }
    }

    /// Whether requests follow Azure OpenAI conventions.
    ///
    /// Azure routes by deployment in the URL path and authenticates with an
    /// `api-key` header instead of a bearer token. Without an explicit
    /// [`ApiStyle`], Azure is detected from the endpoint host.
    #[must_use = "returns whether the endpoint is hosted on Azure"]
    pub fn is_azure(&self) -> bool {
        if let Some(style) = self.api_style {
            return style == ApiStyle::Azure;
        }

        let host = self
            .endpoint
            .split("://")
            .nth(1)
            .unwrap_or(self.endpoint.as_str())
            .split(['/', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        host.ends_with(".openai.azure.com") || host.ends_with(".cognitiveservices.azure.com")
    }

    /// Full chat completions URL for this configuration.
    #[must_use = "returns the chat completions URL"]
    pub fn chat_completions_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if self.is_azure() {
            format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={}",
                self.deployment, self.api_version
            )
        } else {
            format!("{base}/chat/completions")
        }
    }
}

impl Default for ExtractionConfig {
    #[inline]
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_style: None,
            deployment: "gpt-4o".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            temperature: 0.1,
            top_p: 0.1,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
