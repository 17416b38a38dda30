use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BenchError;

use super::rouge::{rouge1, RougeScore};
use super::rules::{
    default_checks, default_rules, AccuracyCheck, ExtractionRule, CODING, GENERAL_KNOWLEDGE,
    MATHEMATICS, REASONING,
};

const OUTPUTS_KEY: &str = "model_outputs";

/// Scores of one model after [`QualityEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub model: String,
    /// Every rule category in rule order, zeroed when nothing was extracted
    pub scores: Vec<(String, RougeScore)>,
    /// Extracted answer text per category, only for non-empty extractions
    pub extracted: BTreeMap<String, String>,
    pub average_f1: f64,
    pub task_accuracy: f64,
}

impl ModelEvaluation {
    pub fn score(&self, category: &str) -> Option<&RougeScore> {
        self.scores
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, score)| score)
    }
}

/// Rule-based answer extraction plus ROUGE-1 and task-accuracy scoring.
pub struct QualityEvaluator {
    references: BTreeMap<String, String>,
    rules: Vec<ExtractionRule>,
    checks: Vec<AccuracyCheck>,
    models: Vec<String>,
    outputs: HashMap<String, String>,
    results: Vec<ModelEvaluation>,
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityEvaluator {
    /// Evaluator with the four stock categories and their reference answers.
    pub fn new() -> Self {
        Self {
            references: default_references(),
            rules: default_rules(),
            checks: default_checks(),
            models: Vec::new(),
            outputs: HashMap::new(),
            results: Vec::new(),
        }
    }

    /// Adds an extraction rule, evaluated after the existing ones.
    pub fn with_rule(mut self, rule: ExtractionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds a task-accuracy check. The accuracy is the mean over all checks.
    pub fn with_check(mut self, check: AccuracyCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn set_references(&mut self, references: impl IntoIterator<Item = (String, String)>) {
        self.references = references.into_iter().collect();
    }

    pub fn references(&self) -> &BTreeMap<String, String> {
        &self.references
    }

    /// Registers or replaces a model's output. Models keep their first position.
    pub fn add_output(&mut self, model: impl Into<String>, output: impl Into<String>) {
        let model = model.into();
        if !self.models.contains(&model) {
            self.models.push(model.clone());
        }
        self.outputs.insert(model, output.into());
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn output(&self, model: &str) -> Option<&str> {
        self.outputs.get(model).map(String::as_str)
    }

    /// Categories in rule order, each listed once.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !categories.contains(&rule.category.as_str()) {
                categories.push(&rule.category);
            }
        }
        categories
    }

    /// Merges string entries of a JSON object into the reference set.
    pub fn load_references(&mut self, path: impl AsRef<Path>) -> Result<usize, BenchError> {
        let object = read_object(path.as_ref())?;
        let mut loaded = 0;
        for (category, answer) in object {
            match answer {
                Value::String(answer) => {
                    self.references.insert(category, answer);
                    loaded += 1;
                }
                _ => log::warn!("reference answer for {category} is not a string, skipping"),
            }
        }
        Ok(loaded)
    }

    /// Loads model outputs from a flat `{model: output}` object or from the
    /// `model_outputs` member of a benchmark results file.
    ///
    /// `model_outputs` is only treated as the nested form when it is an
    /// object; otherwise it is an ordinary (non-string) entry and skipped.
    pub fn load_outputs(&mut self, path: impl AsRef<Path>) -> Result<usize, BenchError> {
        let object = read_object(path.as_ref())?;
        let outputs = match object.get(OUTPUTS_KEY) {
            Some(Value::Object(nested)) => nested.clone(),
            _ => object,
        };

        let mut loaded = 0;
        for (model, output) in outputs {
            match output {
                Value::String(output) => {
                    self.add_output(model, output);
                    loaded += 1;
                }
                _ => log::warn!("output for model {model} is not a string, skipping"),
            }
        }
        Ok(loaded)
    }

    pub fn extract_answers(&self, output: &str) -> BTreeMap<String, String> {
        let mut answers = BTreeMap::new();
        for rule in &self.rules {
            if answers.contains_key(&rule.category) {
                continue;
            }
            if let Some(answer) = rule.extract(output).filter(|a| !a.is_empty()) {
                answers.insert(rule.category.clone(), answer);
            }
        }
        answers
    }

    pub fn task_accuracy(&self, output: &str) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        let total: f64 = self.checks.iter().map(|check| check.score(output)).sum();
        total / self.checks.len() as f64
    }

    fn evaluate_model(&self, model: &str, output: &str) -> ModelEvaluation {
        let extracted = self.extract_answers(output);
        let empty = String::new();

        let scores: Vec<(String, RougeScore)> = self
            .categories()
            .into_iter()
            .map(|category| {
                let score = extracted
                    .get(category)
                    .map(|answer| {
                        let reference = self.references.get(category).unwrap_or(&empty);
                        rouge1(answer, reference)
                    })
                    .unwrap_or_default();
                (category.to_string(), score)
            })
            .collect();

        let scored: Vec<f64> = scores
            .iter()
            .filter(|(category, _)| extracted.contains_key(category))
            .map(|(_, score)| score.f1)
            .collect();
        let average_f1 = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };

        ModelEvaluation {
            model: model.to_string(),
            scores,
            extracted,
            average_f1,
            task_accuracy: self.task_accuracy(output),
        }
    }

    /// Scores every registered model, replacing earlier results.
    pub fn evaluate(&mut self) -> &[ModelEvaluation] {
        let results: Vec<ModelEvaluation> = self
            .models
            .iter()
            .filter_map(|model| {
                let output = self.outputs.get(model)?;
                Some(self.evaluate_model(model, output))
            })
            .collect();
        self.results = results;
        log::debug!("evaluated {} model outputs", self.results.len());
        &self.results
    }

    pub fn results(&self) -> &[ModelEvaluation] {
        &self.results
    }

    pub fn result(&self, model: &str) -> Option<&ModelEvaluation> {
        self.results.iter().find(|result| result.model == model)
    }

    /// Human-readable summary of the last [`evaluate`](Self::evaluate).
    pub fn report(&self, detailed: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ROUGE-1 F1 Scores by Model and Question:");
        let _ = writeln!(out, "=========================================");
        for result in &self.results {
            let _ = writeln!(out, "\n{}:", result.model);
            for (category, score) in &result.scores {
                let _ = writeln!(out, "  {category}: {:.3}", score.f1);
            }
            let _ = writeln!(out, "  Average F1: {:.3}", result.average_f1);
        }

        let _ = writeln!(out, "\nModel Summary (Average ROUGE-1 F1):");
        let _ = writeln!(out, "====================================");
        let _ = writeln!(out, "{:<20}{}", "Model", "Avg ROUGE-1 F1");
        let _ = writeln!(out, "{}", "-".repeat(36));
        for result in &self.results {
            let _ = writeln!(out, "{:<20}{:.3}", result.model, result.average_f1);
        }

        let _ = writeln!(out, "\nTask-based Accuracy:");
        let _ = writeln!(out, "====================");
        let _ = writeln!(out, "{:<20}{}", "Model", "Avg Accuracy");
        let _ = writeln!(out, "{}", "-".repeat(36));
        for result in &self.results {
            let _ = writeln!(out, "{:<20}{:.3}", result.model, result.task_accuracy);
        }

        if detailed {
            for model in &self.models {
                let Some(output) = self.outputs.get(model) else {
                    continue;
                };
                let _ = writeln!(out, "\n========== {model} Output ==========");
                let _ = writeln!(out, "{output}");
                let _ = writeln!(out, "=======================================");
            }
        }
        out
    }

    pub fn to_json(&self) -> Value {
        let mut rouge = Map::new();
        let mut accuracy = Map::new();
        for result in &self.results {
            let mut scores = Map::new();
            for (category, score) in &result.scores {
                scores.insert(category.clone(), serde_json::json!(score));
            }
            scores.insert("average_f1".into(), Value::from(result.average_f1));
            rouge.insert(result.model.clone(), Value::Object(scores));
            accuracy.insert(result.model.clone(), Value::from(result.task_accuracy));
        }

        let outputs: BTreeMap<&String, &String> = self.outputs.iter().collect();
        serde_json::json!({
            "rouge": rouge,
            "task_accuracy": accuracy,
            "model_outputs": outputs,
            "reference_answers": self.references,
        })
    }

    /// Writes scores, outputs and references as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let mut body = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
        self.to_json().serialize(&mut serializer)?;
        body.push(b'\n');
        fs::write(path, body)?;
        Ok(())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, BenchError> {
    let text = fs::read_to_string(path)
        .map_err(|err| BenchError::Io(format!("{}: {err}", path.display())))?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(object) => Ok(object),
        _ => Err(BenchError::JsonError(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

/// Gold answers for the stock categories.
pub fn default_references() -> BTreeMap<String, String> {
    [
        (
            GENERAL_KNOWLEDGE,
            "Neil Armstrong was the first person to walk on the moon and it happened in 1969.",
        ),
        (
            REASONING,
            "If a ball costs $1.05 and a bat costs $1.00 more than the ball, they cost together $3.10.",
        ),
        (
            MATHEMATICS,
            "The derivative of f(x) = 3x^4 - 2x^2 + 5x - 7 is 12x^3 - 4x + 5.",
        ),
        (CODING, "def is_palindrome(s):\n    return s == s[::-1]"),
    ]
    .into_iter()
    .map(|(category, answer)| (category.to_string(), answer.to_string()))
    .collect()
}
