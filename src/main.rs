use anyhow::Result;
use clap::Parser;

use bylines::cli::{Cli, Commands};
use bylines::config::PipelineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            database,
            export,
            workers,
        } => {
            let config = PipelineConfig::from_env()?.merge_cli(input, database, export, workers);
            bylines::cli::run::run(&config).await
        }
        Commands::Tokens { bylines: texts } => bylines::cli::tokens::run(&texts),
        Commands::Rules => bylines::cli::rules::run(),
    }
}
