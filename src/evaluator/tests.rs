use std::io::Write;

use rstest::rstest;
use serde_json::json;
use tempfile::NamedTempFile;

use super::*;
use crate::error::BenchError;

const GOOD_OUTPUT: &str = "\
## General Knowledge
Neil Armstrong was the first person on the moon, in 1969. He said a famous line.
## Reasoning
If the ball costs 5 cents then the bat costs 105 cents and together they cost 110 cents. So $3.10 is wrong.
## Mathematics
The derivative of 3x^4 - 2x^2 + 5x - 7 is 12x^3 - 4x + 5
## Coding
def is_palindrome(s):
    return s == s[::-1]
";

fn json_file(value: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{value}").unwrap();
    file
}

#[test]
fn models_keep_first_insertion_order() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output("b", "one");
    evaluator.add_output("a", "two");
    evaluator.add_output("b", "three");
    assert_eq!(evaluator.models(), ["b", "a"]);
    assert_eq!(evaluator.output("b"), Some("three"));
}

#[test]
fn good_output_extracts_every_category() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output("good", GOOD_OUTPUT);
    let result = evaluator.evaluate()[0].clone();

    assert_eq!(result.extracted.len(), 4);
    let categories: Vec<&str> = result.scores.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(
        categories,
        vec!["generalKnowledge", "reasoning", "mathematics", "coding"]
    );
    assert_eq!(result.score("coding").unwrap().f1, 1.0);
    assert!(result.average_f1 > 0.0 && result.average_f1 <= 1.0);
    assert_eq!(result.task_accuracy, 1.0);
}

#[test]
fn average_counts_only_extracted_categories() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output(
        "coder",
        "A palindrome test:\ndef is_palindrome(s):\n    return s == s[::-1]\n",
    );
    let result = evaluator.evaluate()[0].clone();

    assert_eq!(result.extracted.len(), 1);
    assert_eq!(result.score("reasoning"), Some(&RougeScore::default()));
    assert_eq!(result.average_f1, result.score("coding").unwrap().f1);
    assert_eq!(result.task_accuracy, 0.25);
}

#[test]
fn nothing_extracted_averages_to_zero() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output("silent", "I cannot answer that.");
    let result = &evaluator.evaluate()[0];
    assert!(result.extracted.is_empty());
    assert_eq!(result.average_f1, 0.0);
    assert_eq!(result.task_accuracy, 0.0);
}

#[test]
fn close_reasoning_answer_earns_half_credit() {
    let evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.task_accuracy("The total is $2.05"), 0.125);
}

#[test]
fn custom_rule_and_check_extend_the_tables() {
    let mut evaluator = QualityEvaluator::new()
        .with_rule(ExtractionRule::new("capital", ["capital"], [r"capital is (\w+)"]))
        .with_check(AccuracyCheck::new("capital", ["Paris"]));
    let mut references = default_references();
    references.insert("capital".into(), "Paris".into());
    evaluator.set_references(references);

    evaluator.add_output("m", "The capital is Paris");
    let result = evaluator.evaluate()[0].clone();
    assert_eq!(evaluator.categories().last(), Some(&"capital"));
    assert_eq!(result.score("capital").unwrap().f1, 1.0);
    assert_eq!(result.average_f1, 1.0);
    assert_eq!(result.task_accuracy, 1.0 / 5.0);
}

#[test]
fn loads_nested_outputs_and_skips_non_strings() {
    let file = json_file(json!({
        "prompt_file": "prompt.txt",
        "model_outputs": {"phi": "answer", "broken": 42, "tiny": "other"}
    }));
    let mut evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.load_outputs(file.path()).unwrap(), 2);
    assert_eq!(evaluator.models(), ["phi", "tiny"]);
}

#[test]
fn loads_flat_outputs() {
    let file = json_file(json!({"phi": "answer", "meta": {"x": 1}}));
    let mut evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.load_outputs(file.path()).unwrap(), 1);
    assert_eq!(evaluator.output("phi"), Some("answer"));
}

#[rstest]
#[case(json!(null))]
#[case(json!([1, 2]))]
#[case(json!(42))]
fn non_object_outputs_key_keeps_flat_entries(#[case] nested: serde_json::Value) {
    let file = json_file(json!({"model_outputs": nested, "phi": "answer"}));
    let mut evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.load_outputs(file.path()).unwrap(), 1);
    assert_eq!(evaluator.models(), ["phi"]);
    assert_eq!(evaluator.output("phi"), Some("answer"));
}

#[test]
fn model_named_like_the_outputs_key_loads() {
    let file = json_file(json!({"model_outputs": "its answer", "phi": "answer"}));
    let mut evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.load_outputs(file.path()).unwrap(), 2);
    assert_eq!(evaluator.output("model_outputs"), Some("its answer"));
    assert_eq!(evaluator.output("phi"), Some("answer"));
}

#[test]
fn references_merge_over_defaults() {
    let file = json_file(json!({"coding": "return s == s[::-1]", "extra": "x", "bad": [1]}));
    let mut evaluator = QualityEvaluator::new();
    assert_eq!(evaluator.load_references(file.path()).unwrap(), 2);
    assert_eq!(evaluator.references()["coding"], "return s == s[::-1]");
    assert!(evaluator.references()["generalKnowledge"].contains("1969"));
    assert_eq!(evaluator.references()["extra"], "x");
}

#[test]
fn load_failures_are_errors() {
    let mut evaluator = QualityEvaluator::new();
    assert!(matches!(
        evaluator.load_outputs("/no/such/outputs.json"),
        Err(BenchError::Io(_))
    ));

    let mut garbage = NamedTempFile::new().unwrap();
    write!(garbage, "{{not json").unwrap();
    assert!(matches!(
        evaluator.load_references(garbage.path()),
        Err(BenchError::JsonError(_))
    ));

    let list = json_file(json!(["a", "b"]));
    assert!(matches!(
        evaluator.load_outputs(list.path()),
        Err(BenchError::JsonError(_))
    ));
    assert!(evaluator.models().is_empty());
}

#[test]
fn report_lists_scores_and_accuracy() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output("good", GOOD_OUTPUT);
    evaluator.add_output("silent", "nothing");
    evaluator.evaluate();

    let report = evaluator.report(false);
    assert!(report.starts_with("ROUGE-1 F1 Scores by Model and Question:"));
    assert!(report.contains("\nsilent:\n  generalKnowledge: 0.000"));
    assert!(report.contains("silent              0.000"));
    assert!(report.contains("Task-based Accuracy:"));
    assert!(report.contains("good                1.000"));
    assert!(!report.contains("========== good Output =========="));

    let detailed = evaluator.report(true);
    assert!(detailed.contains("========== good Output ==========\n## General Knowledge"));
}

#[test]
fn saved_results_have_four_sections() {
    let mut evaluator = QualityEvaluator::new();
    evaluator.add_output("good", GOOD_OUTPUT);
    evaluator.evaluate();

    let file = NamedTempFile::new().unwrap();
    evaluator.save(file.path()).unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();

    let keys: Vec<&str> = saved.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["model_outputs", "reference_answers", "rouge", "task_accuracy"]
    );
    assert_eq!(saved["rouge"]["good"]["coding"]["f1"], 1.0);
    assert!(saved["rouge"]["good"]["average_f1"].is_number());
    assert_eq!(saved["task_accuracy"]["good"], 1.0);
    assert_eq!(saved["reference_answers"].as_object().unwrap().len(), 4);
}
