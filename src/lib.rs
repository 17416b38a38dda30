//! Benchmark harness and answer-quality evaluator for models served by a
//! local Ollama daemon.
//!
//! [`bench::BenchmarkRunner`] drives every selected model through one
//! multi-section prompt while sampling memory, then ranks the models by
//! latency. [`evaluator::QualityEvaluator`] scores saved outputs against
//! reference answers with ROUGE-1 and task-specific checks.

pub mod backends;
pub mod bench;
pub mod client;
pub mod config;
pub mod error;
pub mod evaluator;
#[cfg(feature = "cli")]
pub mod logging;
pub mod memory;
pub mod prompt;

pub use bench::{BenchConfig, BenchReport, BenchmarkRunner, ModelResult};
pub use client::{GenerateOptions, Generation, GenerationMetrics, InferenceClient};
pub use error::BenchError;
pub use evaluator::QualityEvaluator;
