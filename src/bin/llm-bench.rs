#[path = "llm-bench/app.rs"]
mod app;
#[path = "llm-bench/args.rs"]
mod args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
