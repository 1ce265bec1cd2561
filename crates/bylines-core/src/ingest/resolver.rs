use std::collections::{HashMap, HashSet};

use crate::{ArticleAuthor, ArticleId, Author, AuthorId, AuthorToken};

/// The tokens extracted from one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTokens {
    pub article_id: ArticleId,
    pub tokens: Vec<AuthorToken>,
}

impl ArticleTokens {
    #[must_use]
    pub fn new(article_id: ArticleId, tokens: Vec<AuthorToken>) -> Self {
        Self { article_id, tokens }
    }
}

/// Insertion-ordered set of author names. The position of a name in the
/// arena is its identifier.
#[derive(Debug, Clone, Default)]
pub struct AuthorRegistry {
    authors: Vec<Author>,
    index: HashMap<String, AuthorId>,
}

impl AuthorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier for `token`, allocating the next one the first
    /// time the name is seen. Matching is exact and case-sensitive.
    pub fn intern(&mut self, token: &AuthorToken) -> AuthorId {
        if let Some(&id) = self.index.get(token.as_str()) {
            return id;
        }

        // Vec lengths never exceed isize::MAX, so this always fits.
        let id = AuthorId(i64::try_from(self.authors.len()).unwrap_or(i64::MAX));
        self.authors.push(Author::new(id, token.as_str()));
        self.index.insert(token.as_str().to_string(), id);
        id
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<AuthorId> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    #[must_use]
    pub fn into_authors(self) -> Vec<Author> {
        self.authors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub authors: Vec<Author>,
    pub links: Vec<ArticleAuthor>,
}

/// Collapses the tokens of a whole corpus into distinct authors and the
/// article/author links between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl IdentityResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Articles are scanned by ascending `article_id` and tokens in extracted
    /// order, so identical input always yields identical author ids.
    #[must_use]
    pub fn resolve(&self, articles: &[ArticleTokens]) -> Resolution {
        let mut ordered: Vec<&ArticleTokens> = articles.iter().collect();
        ordered.sort_by_key(|a| a.article_id);

        let mut registry = AuthorRegistry::new();
        let resolved: Vec<(ArticleId, Vec<AuthorId>)> = ordered
            .iter()
            .map(|article| {
                let ids = article.tokens.iter().map(|t| registry.intern(t)).collect();
                (article.article_id, ids)
            })
            .collect();

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for (article_id, author_ids) in resolved {
            for author_id in author_ids {
                let link = ArticleAuthor::new(article_id, author_id);
                if seen.insert(link) {
                    links.push(link);
                }
            }
        }

        tracing::debug!(
            "Resolved {} distinct authors across {} articles into {} links",
            registry.len(),
            ordered.len(),
            links.len()
        );

        Resolution {
            authors: registry.into_authors(),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, names: &[&str]) -> ArticleTokens {
        ArticleTokens::new(
            ArticleId(id),
            names.iter().filter_map(|n| AuthorToken::new(n)).collect(),
        )
    }

    fn author_names(resolution: &Resolution) -> Vec<&str> {
        resolution
            .authors
            .iter()
            .map(|a| a.author_name.as_str())
            .collect()
    }

    #[test]
    fn test_registry_interns_once() {
        let mut registry = AuthorRegistry::new();
        let jane = AuthorToken::new("Jane Doe").unwrap();
        let john = AuthorToken::new("John Smith").unwrap();

        assert_eq!(registry.intern(&jane), AuthorId(0));
        assert_eq!(registry.intern(&john), AuthorId(1));
        assert_eq!(registry.intern(&jane), AuthorId(0));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("John Smith"), Some(AuthorId(1)));
        assert_eq!(registry.get("john smith"), None);
    }

    #[test]
    fn test_ids_match_arena_positions() {
        let mut registry = AuthorRegistry::new();
        for i in 0..500 {
            let token = AuthorToken::new(&format!("Writer {i}")).unwrap();
            assert_eq!(registry.intern(&token), AuthorId(i));
        }

        for (position, author) in registry.into_authors().iter().enumerate() {
            assert_eq!(author.author_id.0, i64::try_from(position).unwrap());
        }
    }

    #[test]
    fn test_shared_author_one_row_two_links() {
        let resolution =
            IdentityResolver::new().resolve(&[article(0, &["Jane Doe"]), article(1, &["Jane Doe"])]);

        assert_eq!(resolution.authors, vec![Author::new(AuthorId(0), "Jane Doe")]);
        assert_eq!(
            resolution.links,
            vec![
                ArticleAuthor::new(ArticleId(0), AuthorId(0)),
                ArticleAuthor::new(ArticleId(1), AuthorId(0)),
            ]
        );
    }

    #[test]
    fn test_first_appearance_order() {
        let resolution = IdentityResolver::new().resolve(&[
            article(0, &["B", "A"]),
            article(1, &["C", "A"]),
            article(2, &["B", "D"]),
        ]);

        assert_eq!(author_names(&resolution), vec!["B", "A", "C", "D"]);
        let ids: Vec<i64> = resolution.authors.iter().map(|a| a.author_id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_scans_by_article_id() {
        let shuffled = IdentityResolver::new().resolve(&[article(1, &["B"]), article(0, &["A"])]);
        let ordered = IdentityResolver::new().resolve(&[article(0, &["A"]), article(1, &["B"])]);

        assert_eq!(shuffled, ordered);
        assert_eq!(author_names(&ordered), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_mentions_collapse() {
        let resolution = IdentityResolver::new().resolve(&[article(0, &["Jane Doe", "Jane Doe"])]);

        assert_eq!(resolution.authors.len(), 1);
        assert_eq!(resolution.links.len(), 1);
    }

    #[test]
    fn test_authorless_articles() {
        let resolution = IdentityResolver::new().resolve(&[article(0, &[]), article(1, &["X"])]);

        assert_eq!(resolution.links, vec![ArticleAuthor::new(ArticleId(1), AuthorId(0))]);
    }

    #[test]
    fn test_exact_matching_only() {
        let resolution = IdentityResolver::new().resolve(&[article(
            0,
            &["J. Smith", "John Smith", "john smith"],
        )]);

        assert_eq!(
            author_names(&resolution),
            vec!["J. Smith", "John Smith", "john smith"]
        );
    }

    #[test]
    fn test_deterministic() {
        let corpus = [
            article(0, &["A", "B"]),
            article(1, &["C"]),
            article(2, &["B", "A", "E"]),
        ];
        let resolver = IdentityResolver::new();

        assert_eq!(resolver.resolve(&corpus), resolver.resolve(&corpus));
    }
}
