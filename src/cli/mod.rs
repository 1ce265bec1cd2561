pub mod rules;
pub mod run;
pub mod tokens;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bylines",
    about = "Normalize news-article bylines into article, author and article_author tables",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the three tables from an archive snapshot
    Run {
        /// Archive directory or .json file (falls back to BYLINES_INPUT)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// SQLite database to write (falls back to BYLINES_DATABASE)
        #[arg(long)]
        database: Option<PathBuf>,
        /// JSON file to write (falls back to BYLINES_EXPORT)
        #[arg(long)]
        export: Option<PathBuf>,
        /// Threads used for byline normalization (falls back to BYLINES_WORKERS)
        #[arg(short = 'j', long)]
        workers: Option<usize>,
    },
    /// Print the author names extracted from each byline
    Tokens {
        /// Byline text(s)
        #[arg(required = true)]
        bylines: Vec<String>,
    },
    /// List the byline cleaning rules in application order
    Rules,
}
