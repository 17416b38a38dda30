use std::collections::HashMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::client::GenerationMetrics;

use super::metrics::tokens_per_second;

fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Timing and memory of one section run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionMetrics {
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub memory_kb: u64,
}

/// Everything measured for one model during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub model: String,
    pub response: String,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub tokens_per_second: f64,
    pub peak_memory_kb: u64,
    pub baseline_memory_kb: u64,
    /// Section label to response text. Read it in prompt order, not map order.
    pub section_responses: HashMap<String, String>,
    pub section_metrics: HashMap<String, SectionMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_metrics: Option<GenerationMetrics>,
}

impl ModelResult {
    pub fn new(model: impl Into<String>, baseline_memory_kb: u64) -> Self {
        Self {
            model: model.into(),
            response: String::new(),
            duration: Duration::ZERO,
            tokens_per_second: 0.0,
            peak_memory_kb: 0,
            baseline_memory_kb,
            section_responses: HashMap::new(),
            section_metrics: HashMap::new(),
            provider_metrics: None,
        }
    }

    /// Records the full-prompt run and derives tokens per second from it.
    pub fn record_full_run(&mut self, response: String, duration: Duration, peak_memory_kb: u64) {
        self.tokens_per_second = tokens_per_second(duration, &response);
        self.response = response;
        self.duration = duration;
        self.peak_memory_kb = peak_memory_kb;
    }

    pub fn record_section(&mut self, label: &str, response: String, metrics: SectionMetrics) {
        self.section_responses.insert(label.to_string(), response);
        self.section_metrics.insert(label.to_string(), metrics);
    }

    /// Peak over baseline, never negative.
    pub fn memory_increase_kb(&self) -> u64 {
        self.peak_memory_kb.saturating_sub(self.baseline_memory_kb)
    }

    pub fn has_sections(&self) -> bool {
        !self.section_responses.is_empty()
    }
}

/// Orders results fastest first. Equal durations keep their incoming order.
pub fn rank_results(results: &mut [ModelResult]) {
    results.sort_by_key(|result| result.duration);
}
