//! Benchmark harness: runs every model over a shared prompt, measures time
//! and memory, and renders the ranked report.

#[path = "bench/config.rs"]
mod config;

#[path = "bench/console.rs"]
mod console;

#[path = "bench/metrics.rs"]
pub mod metrics;

#[path = "bench/report.rs"]
pub mod report;

#[path = "bench/result.rs"]
mod result;

#[path = "bench/runner.rs"]
mod runner;


pub use config::BenchConfig;
pub use console::{Console, SharedBuffer};
pub use metrics::{estimate_tokens, format_duration, tokens_per_second};
pub use report::BenchReport;
pub use result::{rank_results, ModelResult, SectionMetrics};
pub use runner::{BenchmarkRunner, RunPhase};
