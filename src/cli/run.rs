use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use bylines_core::ingest::{ArchiveSource, NormalizationPipeline, PipelineStats};
use bylines_core::{NormalizedTables, Storage};

use crate::config::PipelineConfig;

pub async fn run(config: &PipelineConfig) -> Result<()> {
    config.validate()?;
    tracing::debug!("Run configuration: {config:?}");
    let input = config.input.as_deref().context("no input given")?;
    let workers = NonZeroUsize::new(config.workers).context("workers must be at least 1")?;

    let pipeline = NormalizationPipeline::new().with_workers(workers);
    let output = pipeline
        .run(&ArchiveSource::new(input))
        .await
        .with_context(|| format!("failed to normalize {}", input.display()))?;

    // The export stays staged until the database commit succeeds, so a
    // failed run leaves neither output behind.
    let staged = match &config.export {
        Some(export) => Some(
            output
                .tables
                .stage_json(export)
                .await
                .with_context(|| format!("failed to export tables to {}", export.display()))?,
        ),
        None => None,
    };

    if let Some(database) = &config.database {
        if let Err(e) = store(database, &output.tables).await {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(e);
        }
        eprintln!("Stored: {}", database.display());
    }

    if let Some(staged) = staged {
        let export = staged.target().to_path_buf();
        staged
            .commit()
            .await
            .with_context(|| format!("failed to export tables to {}", export.display()))?;
        eprintln!("Exported: {}", export.display());
    }

    println!("{}", summary(&output.stats));
    Ok(())
}

async fn store(database: &Path, tables: &NormalizedTables) -> Result<()> {
    let storage = Storage::open(database)
        .await
        .with_context(|| format!("failed to open database {}", database.display()))?;
    storage
        .replace_all(tables)
        .await
        .with_context(|| format!("failed to store tables in {}", database.display()))
}

fn summary(stats: &PipelineStats) -> String {
    format!(
        "articles={} authors={} links={} skipped={}",
        stats.articles, stats.authors, stats.links, stats.records_skipped
    )
}
