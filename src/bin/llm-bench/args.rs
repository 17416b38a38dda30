use std::path::PathBuf;

use clap::Parser;
use llm_bench::BenchConfig;

#[derive(Parser, Debug)]
#[command(
    name = "llm-bench",
    about = "Benchmark latency, throughput and memory of Ollama models on a shared prompt"
)]
pub struct BenchArgs {
    /// Prompt file with `##` section headers
    #[arg(long = "input", short = 'i', visible_alias = "prompt")]
    pub prompt_file: Option<PathBuf>,
    /// Write a detailed text transcript to this file
    #[arg(long = "output", short = 'o')]
    pub output_file: Option<PathBuf>,
    /// Write machine-readable results (loadable by rouge-eval) to this file
    #[arg(long = "json")]
    pub json_output: Option<PathBuf>,
    /// Also run every prompt section on its own and print all answers
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Run all models at the same time
    #[arg(long, short = 'p')]
    pub parallel: bool,
    #[arg(long)]
    pub no_memory: bool,
    /// Ask Ollama to memory-map model weights
    #[arg(long)]
    pub mmap: bool,
    /// Model to benchmark; repeat for several
    #[arg(long = "model", short = 'm')]
    pub models: Vec<String>,
    /// Benchmark every model installed on the server
    #[arg(long, conflicts_with = "models")]
    pub all_models: bool,
    #[arg(long)]
    pub base_url: Option<String>,
    /// Process whose memory is sampled
    #[arg(long)]
    pub target_process: Option<String>,
    #[arg(long)]
    pub sample_interval_ms: Option<u64>,
    #[arg(long)]
    pub timeout_seconds: Option<u64>,
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl BenchArgs {
    /// Overrides config file values with the flags given on the command line.
    pub fn apply(&self, config: &mut BenchConfig) {
        if let Some(path) = &self.prompt_file {
            config.prompt_file = path.clone();
        }
        if self.output_file.is_some() {
            config.output_file = self.output_file.clone();
        }
        if self.json_output.is_some() {
            config.json_output = self.json_output.clone();
        }
        config.verbose |= self.verbose;
        config.parallel |= self.parallel;
        config.use_mmap |= self.mmap;
        if self.no_memory {
            config.track_memory = false;
        }
        if !self.models.is_empty() {
            config.models = self.models.clone();
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(name) = &self.target_process {
            config.target_process = name.clone();
        }
        if let Some(ms) = self.sample_interval_ms {
            config.sample_interval_ms = ms;
        }
        if self.timeout_seconds.is_some() {
            config.timeout_seconds = self.timeout_seconds;
        }
    }
}
