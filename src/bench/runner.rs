use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::client::{GenerateOptions, GenerationMetrics, InferenceClient};
use crate::error::BenchError;
use crate::memory::{format_memory, MemoryProbe, MemorySampler, SystemMemory, SystemProbe};
use crate::prompt::{parse_sections, read_prompt, PromptSection};

use super::config::BenchConfig;
use super::console::Console;
use super::metrics::{estimate_tokens, format_duration, timestamp};
use super::report::{
    render_answers, render_generation_metrics, render_header, render_memory_chart,
    render_summary, BenchReport,
};
use super::result::{rank_results, ModelResult, SectionMetrics};

/// Where a single model's run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Pending,
    FullRunning,
    /// Running the section at this index of the prompt
    SectionRunning(usize),
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Pending => write!(f, "pending"),
            RunPhase::FullRunning => write!(f, "full run"),
            RunPhase::SectionRunning(index) => write!(f, "section {index}"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

struct Inference {
    text: String,
    duration: Duration,
    metrics: Option<GenerationMetrics>,
}

/// Shared, read-only state for every model task of one run.
struct RunContext {
    client: Arc<dyn InferenceClient>,
    probe: Arc<dyn MemoryProbe>,
    console: Console,
    options: GenerateOptions,
    prompt: String,
    sections: Vec<PromptSection>,
    baseline_memory_kb: u64,
    track_memory: bool,
    verbose: bool,
    sample_interval: Duration,
}

impl RunContext {
    fn advance(&self, model: &str, phase: &mut RunPhase, next: RunPhase) {
        log::debug!("{model}: {phase} -> {next}");
        *phase = next;
    }

    fn stamp(&self, line: impl fmt::Display) -> String {
        format!("[{}] {line}", timestamp())
    }

    async fn infer(&self, model: &str, prompt: &str) -> Inference {
        let started = Instant::now();
        let outcome = self.client.generate(model, prompt, &self.options).await;
        let duration = started.elapsed();
        match outcome {
            Ok(generation) => Inference {
                text: generation.text,
                duration,
                metrics: generation.metrics,
            },
            Err(err) => {
                log::warn!("inference on {model} failed: {err}");
                Inference {
                    text: err.sentinel_response(),
                    duration,
                    metrics: None,
                }
            }
        }
    }

    /// Runs `work` inside its own sampler session and returns its output with
    /// the session's peak memory.
    async fn measured<T>(&self, work: impl Future<Output = T>) -> (T, u64) {
        if !self.track_memory {
            return (work.await, 0);
        }
        let mut sampler = MemorySampler::new(Arc::clone(&self.probe), self.sample_interval);
        sampler.start();
        let output = work.await;
        sampler.stop().await;
        let peak = sampler.peak_kb().max(target_rss_kb(&self.probe).await);
        (output, peak)
    }

    async fn run_model(&self, model: String) -> ModelResult {
        let mut phase = RunPhase::Pending;
        let mut result = ModelResult::new(model.as_str(), self.baseline_memory_kb);

        self.console.lines([
            String::new(),
            self.stamp(format_args!("Starting inference on model {model}")),
        ]);

        self.advance(&model, &mut phase, RunPhase::FullRunning);
        let (full, peak) = self.measured(self.infer(&model, &self.prompt)).await;
        let wall = full.duration;
        result.record_full_run(full.text, full.duration, peak);
        result.provider_metrics = full.metrics;

        let mut lines = vec![
            self.stamp(format_args!(
                "Completed full inference on model {model} in {}",
                format_duration(result.duration)
            )),
            self.stamp(format_args!(
                "Response tokens: ~{} ({} tokens/sec)",
                estimate_tokens(&result.response),
                result.tokens_per_second
            )),
        ];
        if self.track_memory {
            lines.push(self.stamp(format_args!(
                "Peak memory: {} (+{} from baseline)",
                format_memory(result.peak_memory_kb),
                format_memory(result.memory_increase_kb())
            )));
        }
        if self.verbose {
            if let Some(block) = result
                .provider_metrics
                .as_ref()
                .and_then(|metrics| render_generation_metrics(metrics, wall))
            {
                lines.push(block);
            }
        }
        self.console.lines(lines);

        if self.verbose {
            for (index, section) in self.sections.iter().enumerate() {
                self.advance(&model, &mut phase, RunPhase::SectionRunning(index));
                self.console
                    .line(self.stamp(format_args!("Testing section: {}", section.label)));

                let (answer, memory_kb) =
                    self.measured(self.infer(&model, &section.to_prompt())).await;

                let mut lines = vec![self.stamp(format_args!(
                    "Completed section: {} in {}",
                    section.label,
                    format_duration(answer.duration)
                ))];
                if self.track_memory {
                    lines.push(self.stamp(format_args!(
                        "Section memory: {}",
                        format_memory(memory_kb)
                    )));
                }
                self.console.lines(lines);

                result.record_section(
                    &section.label,
                    answer.text,
                    SectionMetrics {
                        duration: answer.duration,
                        memory_kb,
                    },
                );
            }
        }

        self.advance(&model, &mut phase, RunPhase::Done);
        result
    }
}

/// Drives every selected model through the prompt and reports the ranking.
pub struct BenchmarkRunner {
    config: BenchConfig,
    client: Arc<dyn InferenceClient>,
    probe: Arc<dyn MemoryProbe>,
    console: Console,
    models: Vec<String>,
}

impl BenchmarkRunner {
    /// Runner printing to stdout and probing `config.target_process`.
    ///
    /// Starts with no models; the `models` list of `config` is not applied.
    pub fn new(config: BenchConfig, client: Arc<dyn InferenceClient>) -> Self {
        let probe = Arc::new(SystemProbe::for_process(config.target_process.clone()));
        Self {
            config,
            client,
            probe,
            console: Console::stdout(),
            models: Vec::new(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn add_model(&mut self, model: impl Into<String>) {
        self.models.push(model.into());
    }

    pub fn add_models<I, S>(&mut self, models: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.extend(models.into_iter().map(Into::into));
    }

    /// Replaces the model list with everything the service has installed.
    pub async fn add_all_models(&mut self) -> Result<usize, BenchError> {
        self.models = self.client.list_models().await?;
        if self.config.verbose {
            let mut lines = vec![format!("Found {} models:", self.models.len())];
            lines.extend(self.models.iter().map(|model| format!("  - {model}")));
            self.console.lines(lines);
        }
        Ok(self.models.len())
    }

    /// Benchmarks every model and prints the report.
    ///
    /// Fails before any inference when no models are selected or the prompt
    /// cannot be used. Failures of individual models end up as sentinel
    /// responses in the report instead.
    pub async fn run(&self) -> Result<BenchReport, BenchError> {
        if self.models.is_empty() {
            return Err(BenchError::NoModels);
        }
        let prompt = read_prompt(&self.config.prompt_file)?;
        let sections = parse_sections(&prompt);
        let track_memory = self.config.track_memory;

        let system_memory = track_memory.then(SystemMemory::read);
        self.console.line(render_header(
            &self.config,
            self.models.len(),
            sections.len(),
            estimate_tokens(&prompt),
            system_memory,
        ));

        let baseline_memory_kb = if track_memory {
            let baseline = target_rss_kb(&self.probe).await;
            self.console.line(format!(
                "Baseline Ollama memory usage: {}",
                format_memory(baseline)
            ));
            baseline
        } else {
            0
        };

        let context = Arc::new(RunContext {
            client: Arc::clone(&self.client),
            probe: Arc::clone(&self.probe),
            console: self.console.clone(),
            options: self.config.generate_options(),
            prompt,
            sections: sections.clone(),
            baseline_memory_kb,
            track_memory,
            verbose: self.config.verbose,
            sample_interval: self.config.sample_interval(),
        });

        log::debug!(
            "benchmarking {} models ({})",
            self.models.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );
        let started = Instant::now();
        let mut results = if self.config.parallel {
            run_parallel(&context, &self.models).await
        } else {
            run_sequential(&context, &self.models).await
        };
        let total_duration = started.elapsed();
        rank_results(&mut results);

        let report = BenchReport {
            prompt_file: self.config.prompt_file.clone(),
            sections,
            results,
            baseline_memory_kb,
            total_duration,
            track_memory,
            verbose: self.config.verbose,
        };
        self.publish(&report);
        Ok(report)
    }

    fn publish(&self, report: &BenchReport) {
        self.console.line(render_summary(report));

        if let Some(path) = &self.config.output_file {
            match report.save_transcript(path) {
                Ok(()) => self
                    .console
                    .line(format!("\nDetailed results saved to {}", path.display())),
                Err(err) => {
                    log::error!("could not write transcript {}: {err}", path.display());
                    self.console.line(format!(
                        "Error: Could not open output file {}",
                        path.display()
                    ));
                }
            }
        }
        if let Some(path) = &self.config.json_output {
            match report.save_json(path) {
                Ok(()) => self
                    .console
                    .line(format!("JSON results saved to {}", path.display())),
                Err(err) => {
                    log::error!("could not write JSON results {}: {err}", path.display());
                    self.console.line(format!(
                        "Error: Could not open output file {}",
                        path.display()
                    ));
                }
            }
        }

        if report.verbose {
            self.console.line(render_answers(report));
        }
        self.console.line("\n=======================================");
        if let Some(chart) = render_memory_chart(report) {
            self.console.line(chart);
        }
    }
}

/// Spot reading of the service process, taken off the async workers.
async fn target_rss_kb(probe: &Arc<dyn MemoryProbe>) -> u64 {
    let probe = Arc::clone(probe);
    tokio::task::spawn_blocking(move || probe.target_rss_kb())
        .await
        .unwrap_or(0)
}

async fn run_sequential(context: &Arc<RunContext>, models: &[String]) -> Vec<ModelResult> {
    let mut results = Vec::with_capacity(models.len());
    for model in models {
        results.push(context.run_model(model.clone()).await);
    }
    results
}

/// One task per model. Results are collected in submission order.
async fn run_parallel(context: &Arc<RunContext>, models: &[String]) -> Vec<ModelResult> {
    let handles = models.iter().map(|model| {
        let context = Arc::clone(context);
        let model = model.clone();
        tokio::spawn(async move { context.run_model(model).await })
    });
    let joined = join_all(handles).await;

    joined
        .into_iter()
        .zip(models)
        .map(|(outcome, model)| {
            outcome.unwrap_or_else(|err| {
                log::error!("benchmark task for {model} failed: {err}");
                let mut result = ModelResult::new(model.as_str(), context.baseline_memory_kb);
                result.response = format!("Error: {err}");
                result
            })
        })
        .collect()
}
