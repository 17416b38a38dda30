use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// Per-request knobs forwarded to the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Number of layers to offload to the GPU
    pub num_gpu: u32,
    /// Ask the service to memory-map model weights
    pub use_mmap: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_gpu: 1,
            use_mmap: false,
        }
    }
}

/// Counters reported by the service alongside a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub eval_count: Option<u64>,
    pub eval_duration: Option<Duration>,
    pub prompt_eval_count: Option<u64>,
    pub prompt_eval_duration: Option<Duration>,
    pub total_duration: Option<Duration>,
}

impl GenerationMetrics {
    /// Generated tokens per second as reported by the service.
    pub fn eval_rate(&self) -> Option<f64> {
        rate(self.eval_count, self.eval_duration)
    }

    /// Prompt tokens per second as reported by the service.
    pub fn prompt_eval_rate(&self) -> Option<f64> {
        rate(self.prompt_eval_count, self.prompt_eval_duration)
    }

    pub fn is_empty(&self) -> bool {
        self.eval_count.is_none() && self.prompt_eval_count.is_none()
    }
}

fn rate(count: Option<u64>, duration: Option<Duration>) -> Option<f64> {
    let (count, duration) = (count?, duration?);
    let secs = duration.as_secs_f64();
    if count == 0 || secs <= 0.0 {
        return Some(0.0);
    }
    Some(count as f64 / secs)
}

/// A completed generate call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub metrics: Option<GenerationMetrics>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metrics: None,
        }
    }
}

/// Capability the benchmark harness needs from an inference service.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Names of the models installed on the service.
    async fn list_models(&self) -> Result<Vec<String>, BenchError>;

    /// Runs a single non-streaming completion of `prompt` on `model`.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, BenchError>;
}
