//! Multi-section prompt documents.
//!
//! A prompt file is split on lines starting with `##`; each header opens a
//! section that runs until the next header. Sections are benchmarked one by
//! one in verbose mode.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

const HEADER_MARKER: &str = "##";

/// A labelled part of the master prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSection {
    pub label: String,
    pub body: String,
}

impl PromptSection {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    /// The text sent to a model when this section is run on its own.
    pub fn to_prompt(&self) -> String {
        format!("{HEADER_MARKER} {}\n{}", self.label, self.body)
    }
}

/// Splits `prompt` into sections in document order.
///
/// Blank lines are dropped. Text before the first header is kept at the
/// start of the first section's body.
pub fn parse_sections(prompt: &str) -> Vec<PromptSection> {
    let mut sections = Vec::new();
    let mut label = String::new();
    let mut body = String::new();

    for line in prompt.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix(HEADER_MARKER) {
            if !label.is_empty() {
                sections.push(PromptSection::new(
                    std::mem::take(&mut label),
                    std::mem::take(&mut body),
                ));
            }
            label = header.trim_start_matches([' ', '\t']).to_string();
        } else {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
        }
    }

    if !label.is_empty() {
        sections.push(PromptSection::new(label, body));
    }
    sections
}

/// Reads a prompt file, rejecting files that hold only whitespace.
pub fn read_prompt(path: impl AsRef<Path>) -> Result<String, BenchError> {
    let path = path.as_ref();
    let prompt = fs::read_to_string(path).map_err(|err| BenchError::PromptFile {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    if prompt.trim().is_empty() {
        return Err(BenchError::EmptyPrompt(path.display().to_string()));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PROMPT: &str = "\
## General Knowledge
Who was the first person to walk on the moon, and in what year?

## Reasoning
A bat and a ball cost $1.10 in total.
How much does the ball cost?
##Coding
Write a Python function that checks for palindromes.
";

    #[test]
    fn splits_sections_in_document_order() {
        let sections = parse_sections(PROMPT);
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["General Knowledge", "Reasoning", "Coding"]);
        assert_eq!(
            sections[1].body,
            "A bat and a ball cost $1.10 in total.\nHow much does the ball cost?"
        );
    }

    #[test]
    fn preamble_joins_first_section() {
        let sections = parse_sections("Answer briefly.\n## Math\nWhat is 2+2?");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "Answer briefly.\nWhat is 2+2?");
    }

    #[test]
    fn text_without_headers_has_no_sections() {
        assert!(parse_sections("just a question\nand another").is_empty());
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn section_prompt_carries_header() {
        let section = PromptSection::new("Reasoning", "Think.");
        assert_eq!(section.to_prompt(), "## Reasoning\nThink.");
    }

    #[test]
    fn read_prompt_rejects_blank_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   \n\n").unwrap();
        assert!(matches!(
            read_prompt(file.path()),
            Err(BenchError::EmptyPrompt(_))
        ));
    }

    #[test]
    fn read_prompt_reports_missing_file() {
        let err = read_prompt("/definitely/not/here/prompt.txt").unwrap_err();
        assert!(matches!(err, BenchError::PromptFile { .. }));
    }

    fn section_strategy() -> impl Strategy<Value = PromptSection> {
        (
            "[A-Za-z][A-Za-z0-9 ]{0,12}",
            prop::collection::vec("[a-z?$.][a-z0-9 ?$.]{0,20}", 0..4),
        )
            .prop_map(|(label, lines)| PromptSection::new(label, lines.join("\n")))
    }

    proptest! {
        #[test]
        fn reserialized_sections_parse_back_identically(
            sections in prop::collection::vec(section_strategy(), 1..6),
        ) {
            let document = sections
                .iter()
                .map(PromptSection::to_prompt)
                .collect::<Vec<_>>()
                .join("\n");
            prop_assert_eq!(parse_sections(&document), sections);
        }
    }
}
