use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Surrogate key of an article: its zero-based position among the records
/// emitted by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl ArticleId {
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One article record as projected out of the upstream archive, before
/// extraction. Every field is optional; the extractor decides which ones are
/// required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub original_id: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub web_url: Option<String>,
    pub snippet: Option<String>,
    pub lead_paragraph: Option<String>,
    pub print_section: Option<String>,
    pub print_page: Option<String>,
    pub source: Option<String>,
    pub headline_main: Option<String>,
    pub headline_print_headline: Option<String>,
    pub pub_date: Option<String>,
    pub document_type: Option<String>,
    pub news_desk: Option<String>,
    pub section_name: Option<String>,
    pub byline_original: Option<String>,
    pub byline_organization: Option<String>,
    pub type_of_material: Option<String>,
    pub word_count: Option<i64>,
}

impl RawArticle {
    #[must_use]
    pub fn new(original_id: impl Into<String>, pub_date: impl Into<String>) -> Self {
        Self {
            original_id: Some(original_id.into()),
            pub_date: Some(pub_date.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_byline(mut self, byline: impl Into<String>) -> Self {
        self.byline_original = Some(byline.into());
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section_name = Some(section.into());
        self
    }

    #[must_use]
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline_main = Some(headline.into());
        self
    }
}

/// A row of the `article` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub article_id: ArticleId,
    pub original_id: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub web_url: Option<String>,
    pub snippet: Option<String>,
    pub lead_paragraph: Option<String>,
    pub print_section: Option<String>,
    pub print_page: Option<String>,
    pub source: Option<String>,
    pub pub_date: String,
    pub document_type: Option<String>,
    pub news_desk: Option<String>,
    pub section_name: Option<String>,
    pub type_of_material: Option<String>,
    pub word_count: i64,
    pub headline_main: Option<String>,
    pub headline_print_headline: Option<String>,
    pub byline_organization: Option<String>,
    pub a_date: NaiveDate,
    pub a_time: NaiveTime,
    /// Byline exactly as supplied; empty when the record had none.
    pub authors_raw_text: String,
    /// Byline after the cleaning rules, before it is split into names.
    pub authors: String,
}

impl Article {
    #[must_use]
    pub fn has_byline(&self) -> bool {
        !self.authors_raw_text.trim().is_empty()
    }
}
