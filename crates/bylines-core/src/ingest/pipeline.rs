use std::num::NonZeroUsize;
use std::time::Instant;

use thiserror::Error;

use super::extractor::ArticleExtractor;
use super::normalizer::{Normalizer, RuleTableNormalizer};
use super::resolver::{ArticleTokens, IdentityResolver};
use super::source::{RecordSource, SourceError};
use crate::{Article, NormalizedTables, RawArticle};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Integrity check failed: {0}")]
    Integrity(#[source] crate::Error),
    #[error("Normalization worker panicked")]
    WorkerPanicked,
}

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub records_read: usize,
    pub records_skipped: usize,
    pub articles: usize,
    pub authorless_articles: usize,
    pub tokens: usize,
    pub authors: usize,
    pub links: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub tables: NormalizedTables,
    pub stats: PipelineStats,
}

/// Extractor, normalizer and resolver wired together for one full rebuild.
pub struct NormalizationPipeline {
    normalizer: Box<dyn Normalizer>,
    resolver: IdentityResolver,
    workers: NonZeroUsize,
}

impl NormalizationPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizer: Box::new(RuleTableNormalizer::default()),
            resolver: IdentityResolver::new(),
            workers: NonZeroUsize::MIN,
        }
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Shards byline normalization across `workers` threads.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub async fn run(&self, source: &dyn RecordSource) -> IngestResult<PipelineOutput> {
        tracing::info!("Loading article records from {}", source.describe());
        let records = source.load().await?;
        self.process(records)
    }

    pub fn process(&self, records: Vec<RawArticle>) -> IngestResult<PipelineOutput> {
        let start = Instant::now();
        let records_read = records.len();

        let mut articles = extract_all(records);
        let corpus = self.normalize_all(&mut articles)?;
        let resolution = self.resolver.resolve(&corpus);

        let stats = PipelineStats {
            records_read,
            records_skipped: records_read - articles.len(),
            articles: articles.len(),
            authorless_articles: corpus.iter().filter(|a| a.tokens.is_empty()).count(),
            tokens: corpus.iter().map(|a| a.tokens.len()).sum(),
            authors: resolution.authors.len(),
            links: resolution.links.len(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        let tables = NormalizedTables::new(articles, resolution.authors, resolution.links);
        tables.verify().map_err(IngestError::Integrity)?;

        tracing::info!(
            "Normalized {} articles ({} skipped): {} authors, {} links in {}ms",
            stats.articles,
            stats.records_skipped,
            stats.authors,
            stats.links,
            stats.duration_ms
        );

        Ok(PipelineOutput { tables, stats })
    }

    fn normalize_all(&self, articles: &mut [Article]) -> IngestResult<Vec<ArticleTokens>> {
        let workers = self.workers.get();
        if workers == 1 || articles.len() < 2 {
            return Ok(normalize_chunk(self.normalizer.as_ref(), articles));
        }

        let chunk_size = articles.len().div_ceil(workers);
        let normalizer = self.normalizer.as_ref();

        let shards = std::thread::scope(|scope| {
            let handles: Vec<_> = articles
                .chunks_mut(chunk_size)
                .map(|chunk| scope.spawn(move || normalize_chunk(normalizer, chunk)))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| IngestError::WorkerPanicked))
                .collect::<IngestResult<Vec<_>>>()
        })?;

        Ok(shards.into_iter().flatten().collect())
    }
}

impl Default for NormalizationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_all(records: Vec<RawArticle>) -> Vec<Article> {
    let mut extractor = ArticleExtractor::new();
    let mut articles = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let original_id = record.original_id.clone().unwrap_or_default();
        match extractor.extract(record) {
            Ok(article) => articles.push(article),
            Err(e) => {
                tracing::warn!("Skipping record {position} ({original_id:?}): {e}");
            }
        }
    }

    articles
}

fn normalize_chunk(normalizer: &dyn Normalizer, articles: &mut [Article]) -> Vec<ArticleTokens> {
    articles
        .iter_mut()
        .map(|article| {
            let normalized = normalizer.normalize(&article.authors_raw_text);
            if normalized.tokens.is_empty() && article.has_byline() {
                tracing::warn!(
                    "No authors extracted from byline {:?} of article {}",
                    article.authors_raw_text,
                    article.article_id
                );
            }
            article.authors = normalized.cleaned;
            ArticleTokens::new(article.article_id, normalized.tokens)
        })
        .collect()
}
