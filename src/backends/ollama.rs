//! Ollama client implementation for the benchmark harness.
//!
//! Talks to the `/api/generate` and `/api/tags` endpoints of a local daemon.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{GenerateOptions, Generation, GenerationMetrics, InferenceClient};
use crate::error::BenchError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Configuration for the Ollama client.
#[derive(Debug)]
pub struct OllamaConfig {
    /// Base URL of the daemon, without a trailing `/api`.
    pub base_url: String,
    /// Request timeout in seconds. `None` waits forever.
    pub timeout_seconds: Option<u64>,
}

/// Client for a local Ollama daemon.
///
/// The client uses `Arc` internally for configuration, making cloning cheap.
#[derive(Debug, Clone)]
pub struct Ollama {
    pub config: Arc<OllamaConfig>,
    pub client: Client,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_gpu: u32,
    temperature: f32,
    use_mmap: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaGenerateResponse {
    response: Option<String>,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
    prompt_eval_count: Option<u64>,
    prompt_eval_duration: Option<u64>,
    total_duration: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct OllamaErrorResponse {
    error: String,
}

#[derive(Deserialize, Debug)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize, Debug)]
struct OllamaModelTag {
    name: Option<String>,
}

impl Ollama {
    pub fn new(
        base_url: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, BenchError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        Ok(Self::with_client(builder.build()?, base_url, timeout_seconds))
    }

    /// Creates a new Ollama client with a custom HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        Self {
            config: Arc::new(OllamaConfig {
                base_url: base_url.into(),
                timeout_seconds,
            }),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

impl Default for Ollama {
    fn default() -> Self {
        Self::with_client(Client::new(), DEFAULT_OLLAMA_URL, None)
    }
}

#[async_trait]
impl InferenceClient for Ollama {
    async fn list_models(&self) -> Result<Vec<String>, BenchError> {
        let resp = self.client.get(self.endpoint("tags")).send().await?;
        log::debug!("Ollama HTTP status: {}", resp.status());
        let resp = resp.error_for_status()?;
        let raw = resp.text().await?;
        let tags: OllamaTagsResponse =
            serde_json::from_str(&raw).map_err(|e| BenchError::ResponseFormat {
                message: e.to_string(),
                raw_response: raw.clone(),
            })?;
        Ok(tags.models.into_iter().filter_map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, BenchError> {
        let body = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_gpu: options.num_gpu,
                temperature: options.temperature,
                use_mmap: options.use_mmap,
            },
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Ollama request payload: {}", json);
            }
        }

        let resp = self
            .client
            .post(self.endpoint("generate"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        log::debug!("Ollama HTTP status for {model}: {status}");
        let raw = resp.text().await?;
        log::debug!("Ollama raw response length: {} bytes", raw.len());

        if !status.is_success() {
            let message = serde_json::from_str::<OllamaErrorResponse>(&raw)
                .map(|e| e.error)
                .unwrap_or(raw);
            return Err(BenchError::ProviderError(format!("{status}: {message}")));
        }

        parse_generate_response(&raw)
    }
}

fn parse_generate_response(raw: &str) -> Result<Generation, BenchError> {
    if raw.trim().is_empty() {
        return Ok(Generation::default());
    }
    let parsed: OllamaGenerateResponse =
        serde_json::from_str(raw).map_err(|e| BenchError::ResponseFormat {
            message: e.to_string(),
            raw_response: raw.to_string(),
        })?;

    let metrics = GenerationMetrics {
        eval_count: parsed.eval_count,
        eval_duration: parsed.eval_duration.map(Duration::from_nanos),
        prompt_eval_count: parsed.prompt_eval_count,
        prompt_eval_duration: parsed.prompt_eval_duration.map(Duration::from_nanos),
        total_duration: parsed.total_duration.map(Duration::from_nanos),
    };

    Ok(Generation {
        // A JSON body without `response` is surfaced verbatim.
        text: parsed.response.unwrap_or_else(|| raw.to_string()),
        metrics: (!metrics.is_empty()).then_some(metrics),
    })
}
