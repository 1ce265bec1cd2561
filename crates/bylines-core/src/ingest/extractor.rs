use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::{Article, ArticleId, RawArticle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Unrecognized publication timestamp: {0:?}")]
    InvalidTimestamp(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Splits a publication timestamp into its date and wall-clock time exactly
/// as written. Offsets are parsed but never applied.
pub fn split_timestamp(raw: &str) -> ExtractionResult<(NaiveDate, NaiveTime)> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let local = dt.naive_local();
        return Ok((local.date(), local.time()));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            let local = dt.naive_local();
            return Ok((local.date(), local.time()));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok((dt.date(), dt.time()));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| (date, NaiveTime::MIN))
        .map_err(|_| ExtractionError::InvalidTimestamp(raw.to_string()))
}

/// Projects raw records into articles, numbering the accepted ones in input
/// order.
#[derive(Debug, Default)]
pub struct ArticleExtractor {
    next_id: i64,
}

impl ArticleExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Number of articles emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> i64 {
        self.next_id
    }

    /// Extracts one record. The identifier is only consumed on success, so a
    /// skipped record leaves no gap.
    pub fn extract(&mut self, raw: RawArticle) -> ExtractionResult<Article> {
        let article = project(ArticleId(self.next_id), raw)?;
        self.next_id += 1;
        Ok(article)
    }
}

fn required(value: Option<String>, field: &'static str) -> ExtractionResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ExtractionError::MissingField(field))
}

fn project(article_id: ArticleId, raw: RawArticle) -> ExtractionResult<Article> {
    let original_id = required(raw.original_id, "original_id")?;
    let pub_date = required(raw.pub_date, "pub_date")?;
    let (a_date, a_time) = split_timestamp(&pub_date)?;

    Ok(Article {
        article_id,
        original_id,
        abstract_text: raw.abstract_text,
        web_url: raw.web_url,
        snippet: raw.snippet,
        lead_paragraph: raw.lead_paragraph,
        print_section: raw.print_section,
        print_page: raw.print_page,
        source: raw.source,
        pub_date,
        document_type: raw.document_type,
        news_desk: raw.news_desk,
        section_name: raw.section_name,
        type_of_material: raw.type_of_material,
        word_count: raw.word_count.unwrap_or(0),
        headline_main: raw.headline_main,
        headline_print_headline: raw.headline_print_headline,
        byline_organization: raw.byline_organization,
        a_date,
        a_time,
        authors_raw_text: raw.byline_original.unwrap_or_default(),
        authors: String::new(),
    })
}
