use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rouge-eval",
    about = "ROUGE-1 evaluator for LLM benchmark outputs",
    after_help = "Example:\n  rouge-eval -i benchmark_results.json -r reference_answers.json -o rouge_scores.json"
)]
pub struct EvalArgs {
    /// Model outputs JSON, flat or a benchmark results file
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
    /// Reference answers JSON
    #[arg(long = "ref", short = 'r')]
    pub references: Option<PathBuf>,
    /// Write scores to this JSON file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Print every model's raw output after the scores
    #[arg(long, short = 'd')]
    pub detailed: bool,
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args =
            EvalArgs::try_parse_from(["rouge-eval", "-i", "in.json", "-r", "refs.json", "-d"])
                .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("in.json")));
        assert_eq!(args.references, Some(PathBuf::from("refs.json")));
        assert!(args.detailed);
        assert!(args.output.is_none());
    }
}
