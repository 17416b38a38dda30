use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD: OnceLock<Regex> = OnceLock::new();

/// Unigram overlap between a candidate and a reference text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Lower-cases `text` and returns its runs of word characters and apostrophes.
pub fn tokenize(text: &str) -> Vec<String> {
    let word = WORD.get_or_init(|| Regex::new(r"[\w']+").expect("word pattern is valid"));
    let lower = text.to_lowercase();
    word.find_iter(&lower)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// ROUGE-1 of `candidate` against `reference`.
///
/// A candidate token matches when it occurs anywhere in the reference, so
/// repeated candidate tokens each count.
pub fn rouge1(candidate: &str, reference: &str) -> RougeScore {
    let candidate = tokenize(candidate);
    let reference = tokenize(reference);
    let vocabulary: HashSet<&str> = reference.iter().map(String::as_str).collect();

    let matches = candidate
        .iter()
        .filter(|token| vocabulary.contains(token.as_str()))
        .count() as f64;

    let precision = if candidate.is_empty() {
        0.0
    } else {
        matches / candidate.len() as f64
    };
    let recall = if reference.is_empty() {
        0.0
    } else {
        matches / reference.len() as f64
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RougeScore {
        precision,
        recall,
        f1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tokenizer_lowercases_and_keeps_apostrophes() {
        assert_eq!(
            tokenize("Don't PANIC, it's 1969!"),
            vec!["don't", "panic", "it's", "1969"]
        );
        assert!(tokenize("  ... ").is_empty());
    }

    #[test]
    fn identical_text_scores_one() {
        let score = rouge1("Neil Armstrong, 1969", "neil armstrong 1969");
        assert_eq!(score.precision, 1.0);
        assert_eq!(score.recall, 1.0);
        assert_eq!(score.f1, 1.0);
    }

    #[test]
    fn repeated_candidate_tokens_each_match() {
        let score = rouge1("moon moon moon", "the moon");
        assert_eq!(score.precision, 1.0);
        assert_eq!(score.recall, 1.5);
    }

    #[test]
    fn partial_overlap() {
        let score = rouge1("the cat sat", "the dog sat down");
        assert!((score.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.recall - 0.5).abs() < 1e-12);
        assert!((score.f1 - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_sides_score_zero() {
        assert_eq!(rouge1("", "reference"), RougeScore::default());
        assert_eq!(rouge1("candidate", ""), RougeScore::default());
        assert_eq!(rouge1("alpha", "beta"), RougeScore::default());
    }

    proptest! {
        #[test]
        fn precision_is_a_fraction(candidate in "[a-z ]{0,60}", reference in "[a-z ]{0,60}") {
            let score = rouge1(&candidate, &reference);
            prop_assert!((0.0..=1.0).contains(&score.precision));
            prop_assert!(score.f1 >= 0.0);
        }

        #[test]
        fn text_matches_itself_fully(text in "[a-z]{1,8}( [a-z]{1,8}){0,10}") {
            let score = rouge1(&text, &text);
            prop_assert_eq!(score.precision, 1.0);
            prop_assert_eq!(score.recall, 1.0);
        }
    }
}
