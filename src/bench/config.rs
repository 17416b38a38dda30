use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backends::ollama::DEFAULT_OLLAMA_URL;
use crate::client::GenerateOptions;
use crate::memory::DEFAULT_SAMPLE_INTERVAL;

const DEFAULT_PROMPT_FILE: &str = "prompt.txt";
const DEFAULT_TARGET_PROCESS: &str = "ollama";
const DEFAULT_MODELS: [&str; 3] = ["mistral:7b", "tinyllama:latest", "phi:latest"];

/// Settings for one benchmark run. Also the `[bench]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub base_url: String,
    pub models: Vec<String>,
    pub prompt_file: PathBuf,
    /// Text transcript of the run
    pub output_file: Option<PathBuf>,
    /// Machine-readable results, loadable by the quality evaluator
    pub json_output: Option<PathBuf>,
    /// Also run every prompt section on its own and print the answers
    pub verbose: bool,
    /// One task per model instead of one model after the other
    pub parallel: bool,
    pub track_memory: bool,
    pub use_mmap: bool,
    /// Process whose memory is sampled, e.g. the inference daemon
    pub target_process: String,
    pub sample_interval_ms: u64,
    pub timeout_seconds: Option<u64>,
    pub temperature: f32,
    pub num_gpu: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let options = GenerateOptions::default();
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            prompt_file: PathBuf::from(DEFAULT_PROMPT_FILE),
            output_file: None,
            json_output: None,
            verbose: false,
            parallel: false,
            track_memory: true,
            use_mmap: options.use_mmap,
            target_process: DEFAULT_TARGET_PROCESS.to_string(),
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            timeout_seconds: None,
            temperature: options.temperature,
            num_gpu: options.num_gpu,
        }
    }
}

impl BenchConfig {
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            num_gpu: self.num_gpu,
            use_mmap: self.use_mmap,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_setup() {
        let config = BenchConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(
            config.models,
            vec!["mistral:7b", "tinyllama:latest", "phi:latest"]
        );
        assert!(config.track_memory);
        assert_eq!(config.sample_interval(), Duration::from_millis(100));
        assert_eq!(config.generate_options(), GenerateOptions::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: BenchConfig = toml::from_str(
            r#"
            models = ["phi:latest"]
            parallel = true
            sample_interval_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.models, vec!["phi:latest"]);
        assert!(config.parallel);
        assert_eq!(config.prompt_file, PathBuf::from("prompt.txt"));
        assert_eq!(config.sample_interval(), Duration::from_millis(1));
    }
}
