mod extractor;
mod normalizer;
mod pipeline;
mod resolver;
mod source;

pub use extractor::{split_timestamp, ArticleExtractor, ExtractionError, ExtractionResult};
pub use normalizer::{
    split_names, NormalizationError, NormalizationResult, NormalizedByline, Normalizer,
    RuleTableNormalizer, SubstitutionRule, NAME_SEPARATOR, NYT_BYLINE_RULES,
};
pub use pipeline::{
    IngestError, IngestResult, NormalizationPipeline, PipelineOutput, PipelineStats,
};
pub use resolver::{ArticleTokens, AuthorRegistry, IdentityResolver, Resolution};
pub use source::{ArchiveSource, MemorySource, RecordSource, SourceError, SourceResult};
