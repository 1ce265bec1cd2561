use thiserror::Error;

use crate::{ArticleId, AuthorId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    #[error("Link ({article_id}, {author_id}) references a missing {missing}")]
    IntegrityViolation {
        article_id: ArticleId,
        author_id: AuthorId,
        missing: &'static str,
    },

    #[error("Duplicate {table} key: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
