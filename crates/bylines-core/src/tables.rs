use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Article, ArticleAuthor, Author, Error, Result};

/// The three related tables produced by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTables {
    #[serde(rename = "article")]
    pub articles: Vec<Article>,
    #[serde(rename = "author")]
    pub authors: Vec<Author>,
    #[serde(rename = "article_author")]
    pub article_authors: Vec<ArticleAuthor>,
}

impl NormalizedTables {
    #[must_use]
    pub fn new(
        articles: Vec<Article>,
        authors: Vec<Author>,
        article_authors: Vec<ArticleAuthor>,
    ) -> Self {
        Self {
            articles,
            authors,
            article_authors,
        }
    }

    #[must_use]
    pub fn author_named(&self, name: &str) -> Option<&Author> {
        self.authors.iter().find(|a| a.author_name == name)
    }

    /// Author names linked to `article`, in link order.
    #[must_use]
    pub fn authors_of(&self, article: crate::ArticleId) -> Vec<&str> {
        self.article_authors
            .iter()
            .filter(|link| link.article_id == article)
            .filter_map(|link| {
                self.authors
                    .iter()
                    .find(|a| a.author_id == link.author_id)
                    .map(|a| a.author_name.as_str())
            })
            .collect()
    }

    /// Checks key uniqueness and that every link points at an existing
    /// article and author.
    pub fn verify(&self) -> Result<()> {
        let mut article_ids = HashSet::with_capacity(self.articles.len());
        for article in &self.articles {
            if !article_ids.insert(article.article_id) {
                return Err(Error::DuplicateKey {
                    table: "article",
                    key: article.article_id.to_string(),
                });
            }
        }

        let mut author_ids = HashSet::with_capacity(self.authors.len());
        let mut author_names = HashSet::with_capacity(self.authors.len());
        for author in &self.authors {
            if !author_ids.insert(author.author_id) {
                return Err(Error::DuplicateKey {
                    table: "author",
                    key: author.author_id.to_string(),
                });
            }
            if !author_names.insert(author.author_name.as_str()) {
                return Err(Error::DuplicateKey {
                    table: "author",
                    key: author.author_name.clone(),
                });
            }
        }

        let mut links = HashSet::with_capacity(self.article_authors.len());
        for link in &self.article_authors {
            let missing = if !article_ids.contains(&link.article_id) {
                Some("article")
            } else if !author_ids.contains(&link.author_id) {
                Some("author")
            } else {
                None
            };
            if let Some(missing) = missing {
                return Err(Error::IntegrityViolation {
                    article_id: link.article_id,
                    author_id: link.author_id,
                    missing,
                });
            }
            if !links.insert(*link) {
                return Err(Error::DuplicateKey {
                    table: "article_author",
                    key: format!("({}, {})", link.article_id, link.author_id),
                });
            }
        }

        Ok(())
    }

    /// Writes all three tables as one JSON document. The file is written
    /// next to `path` first and renamed into place.
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        self.stage_json(path).await?.commit().await
    }

    /// Writes the JSON document to a staging file beside `path` without
    /// making it visible. Call [`StagedExport::commit`] to rename it into
    /// place or [`StagedExport::discard`] to drop it.
    pub async fn stage_json(&self, path: &Path) -> Result<StagedExport> {
        let json = serde_json::to_vec_pretty(self)?;
        let staging = staging_path(path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = tokio::fs::write(&staging, &json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        Ok(StagedExport {
            staging,
            target: path.to_path_buf(),
        })
    }

    pub async fn read_json(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A fully written export that has not been renamed into place yet.
#[derive(Debug)]
#[must_use = "a staged export is invisible until committed"]
pub struct StagedExport {
    staging: PathBuf,
    target: PathBuf,
}

impl StagedExport {
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub async fn commit(self) -> Result<()> {
        if let Err(e) = tokio::fs::rename(&self.staging, &self.target).await {
            let _ = tokio::fs::remove_file(&self.staging).await;
            return Err(e.into());
        }
        tracing::info!("Exported tables to {}", self.target.display());
        Ok(())
    }

    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.staging).await {
            tracing::warn!("Failed to remove {}: {e}", self.staging.display());
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
