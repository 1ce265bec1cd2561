use regex::{NoExpand, Regex};
use thiserror::Error;

use crate::AuthorToken;

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("Invalid rule pattern {pattern:?}: {source}")]
    InvalidRule {
        pattern: String,
        source: regex::Error,
    },
}

pub type NormalizationResult<T> = Result<T, NormalizationError>;

/// Built-in byline cleaning rules, applied top to bottom.
///
/// Order matters: each rule runs on the output of the previous one, so a
/// role prefix must be stripped before the conjunction and publisher rules
/// see the string.
pub const NYT_BYLINE_RULES: &[(&str, &str)] = &[
    // credited-role preambles
    ("By ", ""),
    ("By ‘", ""),
    ("Show.$", "Show"),
    ("Text by ", ""),
    ("Video by ", ""),
    ("Videos by ", ""),
    ("Written by ", ""),
    ("Compiled by ", ""),
    ("Artwork by ", ""),
    ("Produced by ", ""),
    ("Reporting by ", ""),
    ("Selected by ", ""),
    ("Photographs by ", ""),
    ("Interviews by ", ""),
    ("Introduction by ", ""),
    ("Photo Essay by ", ""),
    ("Illustrations by ", ""),
    ("Photographs, Text by ", ""),
    // role phrases between two names
    (" Text by ", ""),
    (" Video by ", ""),
    (" posters by ", ""),
    (" Flowers by ", ""),
    (" photographs by ", ""),
    // separators rewritten to the split character
    (";", ","),
    (" and ", ", "),
    (" with Text by ", ", "),
    (" with Photographs by ", ", "),
    // publisher credit
    (" for The New York Times", ""),
    (" For The New York Times", ""),
];

/// Character the cleaned byline is split on.
pub const NAME_SEPARATOR: char = ',';

#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: &str) -> NormalizationResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| NormalizationError::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: regex,
            replacement: replacement.to_string(),
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every match; the replacement is taken literally.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.replacement))
            .into_owned()
    }
}

/// Result of normalizing one byline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedByline {
    /// The byline after every rule has run, before splitting.
    pub cleaned: String,
    /// Names in the order they appear; may repeat.
    pub tokens: Vec<AuthorToken>,
}

pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw_authors_text: &str) -> NormalizedByline;

    fn tokens(&self, raw_authors_text: &str) -> Vec<AuthorToken> {
        self.normalize(raw_authors_text).tokens
    }
}

/// Applies an ordered rule table, then splits on commas.
#[derive(Debug, Clone)]
pub struct RuleTableNormalizer {
    rules: Vec<SubstitutionRule>,
}

impl RuleTableNormalizer {
    pub fn from_rules<'a, I>(rules: I) -> NormalizationResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        rules
            .into_iter()
            .map(|(pattern, replacement)| SubstitutionRule::new(pattern, replacement))
            .collect::<NormalizationResult<Vec<_>>>()
            .map(|rules| Self { rules })
    }

    /// The New York Times byline table.
    ///
    /// # Panics
    ///
    /// Never in practice: the built-in patterns are covered by tests.
    #[must_use]
    pub fn nyt() -> Self {
        Self::from_rules(NYT_BYLINE_RULES.iter().copied())
            .expect("built-in byline rules are valid regular expressions")
    }

    #[must_use]
    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    #[must_use]
    pub fn clean(&self, raw_authors_text: &str) -> String {
        self.rules
            .iter()
            .fold(raw_authors_text.to_string(), |text, rule| rule.apply(&text))
    }
}

impl Default for RuleTableNormalizer {
    fn default() -> Self {
        Self::nyt()
    }
}

impl Normalizer for RuleTableNormalizer {
    fn normalize(&self, raw_authors_text: &str) -> NormalizedByline {
        let cleaned = self.clean(raw_authors_text);
        let tokens = split_names(&cleaned);
        NormalizedByline { cleaned, tokens }
    }
}

/// Splits a cleaned byline into tokens, dropping the empty ones.
#[must_use]
pub fn split_names(cleaned: &str) -> Vec<AuthorToken> {
    cleaned
        .split(NAME_SEPARATOR)
        .filter_map(AuthorToken::new)
        .collect()
}
