//! Answer-quality scoring of saved model outputs.
//!
//! Answers are pulled out of each output with [`ExtractionRule`]s, scored
//! against reference answers with ROUGE-1, and checked for known-correct
//! fragments with [`AccuracyCheck`]s.

#[path = "evaluator/quality.rs"]
mod quality;

#[path = "evaluator/rouge.rs"]
mod rouge;

#[path = "evaluator/rules.rs"]
pub mod rules;

#[cfg(test)]
#[path = "evaluator/tests.rs"]
mod tests;

pub use quality::{default_references, ModelEvaluation, QualityEvaluator};
pub use rouge::{rouge1, tokenize, RougeScore};
pub use rules::{default_checks, default_rules, AccuracyCheck, ExtractionRule};
