use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};

use crate::client::GenerationMetrics;
use crate::error::BenchError;
use crate::memory::{format_memory, SystemMemory};
use crate::prompt::PromptSection;

use super::config::BenchConfig;
use super::metrics::format_duration;
use super::result::ModelResult;

const CHART_WIDTH: usize = 50;

const MODEL_COLUMN: usize = 20;
const VALUE_COLUMN: usize = 15;
const METRIC_LABEL: usize = 25;
const SECTION_RULE: &str = "----------------------------------------";
const MODEL_RULE: &str = "========================================";

/// Outcome of one benchmark run, ranked fastest first.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub prompt_file: PathBuf,
    pub sections: Vec<PromptSection>,
    pub results: Vec<ModelResult>,
    pub baseline_memory_kb: u64,
    pub total_duration: Duration,
    pub track_memory: bool,
    pub verbose: bool,
}

impl BenchReport {
    /// Full response text per model, in the shape the quality evaluator loads.
    pub fn model_outputs(&self) -> BTreeMap<String, String> {
        self.results
            .iter()
            .map(|result| (result.model.clone(), result.response.clone()))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "prompt_file": self.prompt_file.display().to_string(),
            "total_duration_ms": self.total_duration.as_millis() as u64,
            "baseline_memory_kb": self.baseline_memory_kb,
            "results": self.results,
            "model_outputs": self.model_outputs(),
        })
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let body = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(path, body)?;
        Ok(())
    }

    pub fn save_transcript(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        fs::write(path, render_transcript(self))?;
        Ok(())
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

/// Run banner printed before any inference.
pub fn render_header(
    config: &BenchConfig,
    model_count: usize,
    section_count: usize,
    prompt_tokens: usize,
    system_memory: Option<SystemMemory>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "========== EDGE AI LLM BENCHMARK ==========");
    let _ = writeln!(out, "Prompt file: {}", config.prompt_file.display());
    let _ = writeln!(out, "Models to test: {model_count}");
    let _ = writeln!(out, "Number of prompt sections: {section_count}");
    let _ = writeln!(out, "Estimated tokens in prompt: {prompt_tokens}");
    let _ = writeln!(out, "Verbose mode: {}", on_off(config.verbose));
    let _ = writeln!(out, "Parallel execution: {}", on_off(config.parallel));
    let _ = writeln!(out, "Memory tracking: {}", on_off(config.track_memory));
    let _ = writeln!(out, "Memory-mapped loading: {}", on_off(config.use_mmap));
    if let Some(memory) = system_memory {
        let _ = writeln!(
            out,
            "System memory: {}MB total, {}MB available",
            memory.total_mb, memory.available_mb
        );
    }
    out.push_str("===================================");
    out
}

/// Ranking table. Memory columns are only shown when tracking was on.
pub fn render_summary(report: &BenchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n========== BENCHMARK RESULTS ==========");
    let _ = writeln!(
        out,
        "Total benchmark time: {}",
        format_duration(report.total_duration)
    );
    let _ = writeln!(out, "\nModels ranked by inference speed:");

    if report.track_memory {
        let _ = writeln!(
            out,
            "{:<MODEL_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$}",
            "Model", "Time", "Tokens/sec", "Memory", "Mem increase"
        );
        let _ = write!(out, "{}", "-".repeat(80));
        for result in &report.results {
            let _ = write!(
                out,
                "\n{:<MODEL_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$.2}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$}",
                result.model,
                format_duration(result.duration),
                result.tokens_per_second,
                format_memory(result.peak_memory_kb),
                format_memory(result.memory_increase_kb()),
            );
        }
    } else {
        let _ = writeln!(
            out,
            "{:<MODEL_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$}",
            "Model", "Time", "Tokens/sec"
        );
        let _ = write!(out, "{}", "-".repeat(50));
        for result in &report.results {
            let _ = write!(
                out,
                "\n{:<MODEL_COLUMN$}{:<VALUE_COLUMN$}{:<VALUE_COLUMN$.2}",
                result.model,
                format_duration(result.duration),
                result.tokens_per_second,
            );
        }
    }
    out
}

/// Length of a model's bar, scaled so the largest increase fills the chart.
pub fn bar_length(increase_kb: u64, max_increase_kb: u64) -> usize {
    if max_increase_kb == 0 {
        return 0;
    }
    ((increase_kb as u128 * CHART_WIDTH as u128) / max_increase_kb as u128) as usize
}

/// ASCII comparison of memory increases. `None` unless tracking was on and
/// more than one model ran.
pub fn render_memory_chart(report: &BenchReport) -> Option<String> {
    if !report.track_memory || report.results.len() < 2 {
        return None;
    }
    let max_increase = report
        .results
        .iter()
        .map(ModelResult::memory_increase_kb)
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "\nMEMORY USAGE COMPARISON:");
    let _ = write!(
        out,
        "Memory baseline: {}",
        format_memory(report.baseline_memory_kb)
    );
    for result in &report.results {
        let increase = result.memory_increase_kb();
        let filled = bar_length(increase, max_increase);
        let _ = write!(
            out,
            "\n{:<MODEL_COLUMN$} [{}{}] {}",
            result.model,
            "#".repeat(filled),
            " ".repeat(CHART_WIDTH - filled),
            format_memory(increase)
        );
    }
    Some(out)
}

fn memory_suffix(result: &ModelResult) -> String {
    format!(
        " | Memory: {} (+{} from baseline)",
        format_memory(result.peak_memory_kb),
        format_memory(result.memory_increase_kb())
    )
}

/// Per-model answers shown in verbose mode, sections in prompt order.
pub fn render_answers(report: &BenchReport) -> String {
    let mut out = String::from("\n===== DETAILED ANSWERS BY MODEL =====");
    for result in &report.results {
        let _ = writeln!(out, "\n\n======== {} ========", result.model);
        let _ = write!(
            out,
            "Time: {} | Tokens/sec: {:.2}",
            format_duration(result.duration),
            result.tokens_per_second
        );
        if report.track_memory {
            out.push_str(&memory_suffix(result));
        }
        out.push_str("\n\n");

        if result.has_sections() {
            out.push_str("SECTION-BY-SECTION RESPONSES:");
            for section in &report.sections {
                let _ = writeln!(out, "\n\n--- {} ---", section.label);
                if let Some(metrics) = result.section_metrics.get(&section.label) {
                    let _ = write!(out, "Time: {}", format_duration(metrics.duration));
                    if report.track_memory {
                        let _ = write!(out, " | Memory: {}", format_memory(metrics.memory_kb));
                    }
                    out.push('\n');
                }
                let _ = writeln!(out, "Q: {}", section.body);
                let answer = result
                    .section_responses
                    .get(&section.label)
                    .map(String::as_str)
                    .unwrap_or("[No response]");
                let _ = write!(out, "\nA: {answer}");
            }
            out.push('\n');
        } else {
            let _ = writeln!(out, "FULL RESPONSE:\n{}", result.response);
        }
        out.push_str(SECTION_RULE);
    }
    out
}

/// The detailed-results text file.
pub fn render_transcript(report: &BenchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "========== EDGE AI LLM BENCHMARK DETAILED RESULTS =========="
    );
    let _ = writeln!(out, "Prompt file: {}", report.prompt_file.display());
    let _ = writeln!(
        out,
        "Total benchmark time: {}",
        format_duration(report.total_duration)
    );
    if report.track_memory {
        let _ = writeln!(
            out,
            "Baseline Ollama memory usage: {}",
            format_memory(report.baseline_memory_kb)
        );
    }
    out.push('\n');

    for result in &report.results {
        let _ = writeln!(out, "MODEL: {}", result.model);
        let _ = writeln!(out, "Time: {}", format_duration(result.duration));
        let _ = writeln!(out, "Tokens/sec: {:.2}", result.tokens_per_second);
        if report.track_memory {
            let _ = writeln!(out, "Peak memory: {}", format_memory(result.peak_memory_kb));
            let _ = writeln!(
                out,
                "Memory increase: {}",
                format_memory(result.memory_increase_kb())
            );
        }

        if result.has_sections() {
            let _ = writeln!(out, "\nSECTION-BY-SECTION METRICS:");
            for section in &report.sections {
                let _ = writeln!(out, "\n=== SECTION: {} ===", section.label);
                let _ = writeln!(out, "QUESTION:\n{}", section.body);
                if let Some(metrics) = result.section_metrics.get(&section.label) {
                    let _ = writeln!(out, "Time: {}", format_duration(metrics.duration));
                    if report.track_memory {
                        let _ = writeln!(out, "Memory: {}", format_memory(metrics.memory_kb));
                    }
                }
                let _ = writeln!(out, "\nRESPONSE:");
                match result.section_responses.get(&section.label) {
                    Some(response) => {
                        let _ = writeln!(out, "{response}");
                    }
                    None => {
                        let _ = writeln!(out, "[No response for this section]");
                    }
                }
                let _ = writeln!(out, "{SECTION_RULE}");
            }
        } else {
            let _ = writeln!(out, "\nFULL RESPONSE:\n{SECTION_RULE}\n{}", result.response);
        }
        let _ = writeln!(out, "{MODEL_RULE}\n");
    }
    out
}

fn seconds(duration: Duration) -> String {
    format!("{}s", duration.as_secs_f64())
}

/// Service-reported counters, printed after a verbose full run.
///
/// Needs at least the eval count and duration; `wall` stands in for a missing
/// total duration.
pub fn render_generation_metrics(metrics: &GenerationMetrics, wall: Duration) -> Option<String> {
    let eval_count = metrics.eval_count?;
    let eval_duration = metrics.eval_duration?;

    let mut out = String::from("\nPERFORMANCE METRICS:");
    let total = metrics.total_duration.unwrap_or(wall);
    let _ = write!(out, "\n{:<METRIC_LABEL$}{}", "total duration:", seconds(total));
    if let (Some(count), Some(duration)) = (metrics.prompt_eval_count, metrics.prompt_eval_duration)
    {
        let _ = write!(
            out,
            "\n{:<METRIC_LABEL$}{count} token(s)",
            "prompt eval count:"
        );
        let _ = write!(
            out,
            "\n{:<METRIC_LABEL$}{}",
            "prompt eval duration:",
            seconds(duration)
        );
        let _ = write!(
            out,
            "\n{:<METRIC_LABEL$}{:.2} tokens/s",
            "prompt eval rate:",
            metrics.prompt_eval_rate().unwrap_or(0.0)
        );
    }
    let _ = write!(out, "\n{:<METRIC_LABEL$}{eval_count} token(s)", "eval count:");
    let _ = write!(
        out,
        "\n{:<METRIC_LABEL$}{}",
        "eval duration:",
        seconds(eval_duration)
    );
    let _ = write!(
        out,
        "\n{:<METRIC_LABEL$}{:.2} tokens/s",
        "eval rate:",
        metrics.eval_rate().unwrap_or(0.0)
    );
    Some(out)
}
