pub mod article;
pub mod author;
pub mod error;
pub mod ingest;
pub mod storage;
pub mod tables;

pub use article::{Article, ArticleId, RawArticle};
pub use author::{ArticleAuthor, Author, AuthorId, AuthorToken};
pub use error::{Error, Result};
pub use storage::Storage;
pub use tables::{NormalizedTables, StagedExport};
