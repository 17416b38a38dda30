use regex::Regex;
use serde::{Deserialize, Serialize};

pub const GENERAL_KNOWLEDGE: &str = "generalKnowledge";
pub const REASONING: &str = "reasoning";
pub const MATHEMATICS: &str = "mathematics";
pub const CODING: &str = "coding";

/// Pulls one category's answer out of a model's full output.
///
/// The rule fires only when every trigger substring is present. The first
/// pattern that matches supplies its first capture group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub category: String,
    pub triggers: Vec<String>,
    pub patterns: Vec<String>,
}

impl ExtractionRule {
    pub fn new<T, P>(category: impl Into<String>, triggers: T, patterns: P) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            category: category.into(),
            triggers: triggers.into_iter().map(Into::into).collect(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extract(&self, output: &str) -> Option<String> {
        if !self.triggers.iter().all(|t| output.contains(t.as_str())) {
            return None;
        }
        self.patterns.iter().find_map(|pattern| {
            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(err) => {
                    log::warn!("skipping invalid pattern for {}: {err}", self.category);
                    return None;
                }
            };
            regex
                .captures(output)
                .and_then(|caps| caps.get(1))
                .map(|capture| capture.as_str().to_string())
        })
    }
}

/// Full or partial credit for one category, by literal substring presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyCheck {
    pub category: String,
    /// All of these must appear for full credit
    pub required: Vec<String>,
    /// Fallback fragments and the credit each one earns
    pub partial: Vec<(String, f64)>,
}

impl AccuracyCheck {
    pub fn new<R>(category: impl Into<String>, required: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            category: category.into(),
            required: required.into_iter().map(Into::into).collect(),
            partial: Vec::new(),
        }
    }

    pub fn with_partial(mut self, fragment: impl Into<String>, credit: f64) -> Self {
        self.partial.push((fragment.into(), credit));
        self
    }

    pub fn score(&self, output: &str) -> f64 {
        if self.required.iter().all(|r| output.contains(r.as_str())) {
            return 1.0;
        }
        self.partial
            .iter()
            .find(|(fragment, _)| output.contains(fragment.as_str()))
            .map(|(_, credit)| *credit)
            .unwrap_or(0.0)
    }
}

pub fn default_rules() -> Vec<ExtractionRule> {
    vec![
        ExtractionRule::new(
            GENERAL_KNOWLEDGE,
            ["Neil Armstrong"],
            [r"([^.]*Neil Armstrong[^.]*\d{4}[^.]*)"],
        ),
        ExtractionRule::new(
            REASONING,
            ["ball costs", "bat costs"],
            [r"([^.]*ball costs[^.]*bat costs[^.]*together[^.]*)"],
        ),
        ExtractionRule::new(
            MATHEMATICS,
            ["derivative", "3x^4"],
            [
                r"([^.]*derivative[^.]*3x\^4[^.]*is[^.]*)",
                r"([^.]*f'[^=]*=[^.]*12x\^3[^.]*)",
            ],
        ),
        ExtractionRule::new(
            CODING,
            ["palindrome"],
            [r"(def is_palindrome[\s\S]*?return[\s\S]*?\n)"],
        ),
    ]
}

pub fn default_checks() -> Vec<AccuracyCheck> {
    vec![
        AccuracyCheck::new(GENERAL_KNOWLEDGE, ["Neil Armstrong", "1969"]),
        AccuracyCheck::new(REASONING, ["$3.10"]).with_partial("$2.05", 0.5),
        AccuracyCheck::new(MATHEMATICS, ["12x^3 - 4x + 5"]),
        AccuracyCheck::new(CODING, ["return s == s[::-1]"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rule(category: &str) -> ExtractionRule {
        default_rules()
            .into_iter()
            .find(|r| r.category == category)
            .unwrap()
    }

    fn check(category: &str) -> AccuracyCheck {
        default_checks()
            .into_iter()
            .find(|c| c.category == category)
            .unwrap()
    }

    #[test]
    fn general_knowledge_captures_sentence() {
        let output = "Intro. The first was Neil Armstrong in July 1969 on Apollo 11. Next";
        assert_eq!(
            rule(GENERAL_KNOWLEDGE).extract(output).as_deref(),
            Some(" The first was Neil Armstrong in July 1969 on Apollo 11")
        );
    }

    #[test]
    fn reasoning_needs_both_triggers() {
        assert_eq!(rule(REASONING).extract("The ball costs 5 cents together"), None);
        let output = "The ball costs 5 cents and the bat costs 105 cents, together 110 cents. Done";
        assert_eq!(
            rule(REASONING).extract(output).as_deref(),
            Some("The ball costs 5 cents and the bat costs 105 cents, together 110 cents")
        );
    }

    #[test]
    fn decimal_points_end_a_fragment() {
        let output = "The ball costs $0.05 and the bat costs $1.05, together $1.10.";
        assert_eq!(rule(REASONING).extract(output), None);
    }

    #[test]
    fn mathematics_falls_back_to_second_pattern() {
        let output = "Take the derivative of 3x^4 - 2x^2.\nf'(x) = 12x^3 - 4x + 5";
        assert_eq!(
            rule(MATHEMATICS).extract(output).as_deref(),
            Some("\nf'(x) = 12x^3 - 4x + 5")
        );
    }

    #[test]
    fn coding_captures_through_return_line() {
        let output = "A palindrome check:\ndef is_palindrome(s):\n    return s == s[::-1]\n\nDone";
        assert_eq!(
            rule(CODING).extract(output).as_deref(),
            Some("def is_palindrome(s):\n    return s == s[::-1]\n")
        );
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let rule = ExtractionRule::new("custom", ["x"], ["(unclosed", "(x+)"]);
        assert_eq!(rule.extract("xxx").as_deref(), Some("xxx"));
    }

    #[rstest]
    #[case(GENERAL_KNOWLEDGE, "Neil Armstrong, 1969", 1.0)]
    #[case(GENERAL_KNOWLEDGE, "Neil Armstrong, 1970", 0.0)]
    #[case(REASONING, "in total $3.10", 1.0)]
    #[case(REASONING, "in total $2.05", 0.5)]
    #[case(REASONING, "both $3.10 and $2.05", 1.0)]
    #[case(REASONING, "no idea", 0.0)]
    #[case(MATHEMATICS, "f'(x) = 12x^3 - 4x + 5", 1.0)]
    #[case(CODING, "    return s == s[::-1]", 1.0)]
    fn accuracy_checks(#[case] category: &str, #[case] output: &str, #[case] expected: f64) {
        assert_eq!(check(category).score(output), expected);
    }
}
