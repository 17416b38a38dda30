use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use llm_bench::backends::Ollama;
use llm_bench::config::load_config;
use llm_bench::logging::init_logging;
use llm_bench::BenchmarkRunner;

use crate::args::BenchArgs;

pub async fn run() -> anyhow::Result<()> {
    let args = BenchArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;

    let mut config = loaded.config.bench;
    args.apply(&mut config);
    log::info!(
        "starting benchmark against {} with prompt {}",
        config.base_url,
        config.prompt_file.display()
    );

    let client = Ollama::new(config.base_url.clone(), config.timeout_seconds)?;
    let models = config.models.clone();
    let mut runner = BenchmarkRunner::new(config, Arc::new(client));
    if args.all_models {
        runner
            .add_all_models()
            .await
            .context("could not list models from the Ollama server")?;
    } else {
        runner.add_models(models);
    }

    runner.run().await?;
    Ok(())
}
