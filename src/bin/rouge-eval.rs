#[path = "rouge-eval/args.rs"]
mod args;

use anyhow::Context;
use clap::Parser;
use llm_bench::config::load_config;
use llm_bench::logging::init_logging;
use llm_bench::QualityEvaluator;

use crate::args::EvalArgs;

fn main() -> anyhow::Result<()> {
    let args = EvalArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;

    let mut evaluator = QualityEvaluator::new();
    match &args.input {
        Some(path) => {
            let count = evaluator
                .load_outputs(path)
                .with_context(|| format!("Failed to load model outputs from {}", path.display()))?;
            log::info!("loaded {count} model outputs from {}", path.display());
        }
        None => println!("No input file specified. Nothing to evaluate."),
    }

    if let Some(path) = args
        .references
        .as_ref()
        .or(loaded.config.evaluator.references_file.as_ref())
    {
        evaluator
            .load_references(path)
            .with_context(|| format!("Failed to load reference answers from {}", path.display()))?;
    }

    evaluator.evaluate();
    print!("{}", evaluator.report(args.detailed));

    if let Some(path) = &args.output {
        evaluator
            .save(path)
            .with_context(|| format!("Failed to save results to {}", path.display()))?;
        println!("\nResults saved to {}", path.display());
    }
    Ok(())
}
