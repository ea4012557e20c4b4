mod cli;

use anyhow::Result;
use clap::Parser;

use cli::commands::run_cli;
use cli::opts::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    run_cli(args).await
}
