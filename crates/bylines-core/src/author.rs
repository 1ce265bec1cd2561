use serde::{Deserialize, Serialize};

use crate::ArticleId;

/// Surrogate key of an author, assigned in order of first appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub i64);

impl AuthorId {
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A single cleaned author name taken from one byline.
///
/// Only constructible through [`AuthorToken::new`], which guarantees the value
/// is non-empty, has no leading or trailing whitespace and no internal runs
/// of more than one space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AuthorToken(String);

impl AuthorToken {
    /// Canonicalizes whitespace in `candidate`; returns `None` when nothing
    /// but whitespace remains.
    #[must_use]
    pub fn new(candidate: &str) -> Option<Self> {
        let collapsed = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(Self(collapsed))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AuthorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthorToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A row of the `author` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub author_id: AuthorId,
    pub author_name: String,
}

impl Author {
    #[must_use]
    pub fn new(author_id: AuthorId, author_name: impl Into<String>) -> Self {
        Self {
            author_id,
            author_name: author_name.into(),
        }
    }
}

/// A row of the `article_author` join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleAuthor {
    pub article_id: ArticleId,
    pub author_id: AuthorId,
}

impl ArticleAuthor {
    #[must_use]
    pub const fn new(article_id: ArticleId, author_id: AuthorId) -> Self {
        Self {
            article_id,
            author_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_collapses_whitespace() {
        let token = AuthorToken::new("  Jane \t  Doe\n").unwrap();
        assert_eq!(token.as_str(), "Jane Doe");
    }

    #[test]
    fn test_token_rejects_blank() {
        assert!(AuthorToken::new("").is_none());
        assert!(AuthorToken::new("   \t ").is_none());
    }

    #[test]
    fn test_token_is_case_sensitive() {
        assert_ne!(AuthorToken::new("jane doe"), AuthorToken::new("Jane Doe"));
    }
}
