use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::RawArticle;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed archive file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Produces the ordered sequence of raw article records for one run.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> SourceResult<Vec<RawArticle>>;
}

/// Records that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawArticle>,
}

impl MemorySource {
    #[must_use]
    pub fn new(records: Vec<RawArticle>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn with_record(mut self, record: RawArticle) -> Self {
        self.records.push(record);
        self
    }
}

#[async_trait::async_trait]
impl RecordSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }

    async fn load(&self) -> SourceResult<Vec<RawArticle>> {
        Ok(self.records.clone())
    }
}

/// Reads archive API responses (`{"response": {"docs": [...]}}`, or a bare
/// array of documents) from a single `.json` file or from every `.json` file
/// in a directory, in file-name order.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    path: PathBuf,
}

impl ArchiveSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn archive_files(&self) -> SourceResult<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(self.path.clone())
            } else {
                read_error(&self.path, e)
            }
        })?;

        if metadata.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| read_error(&self.path, e))?;
        let mut files = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_error(&self.path, e))?
        {
            let path = entry.path();
            if !path.is_file() || !is_json_file(&path) {
                tracing::debug!("Skipping non-archive entry {}", path.display());
                continue;
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait::async_trait]
impl RecordSource for ArchiveSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> SourceResult<Vec<RawArticle>> {
        let mut records = Vec::new();

        for file in self.archive_files().await? {
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| read_error(&file, e))?;
            let docs = parse_archive(&bytes).map_err(|source| SourceError::Malformed {
                path: file.clone(),
                source,
            })?;

            tracing::debug!("Read {} documents from {}", docs.len(), file.display());
            records.extend(docs);
        }

        Ok(records)
    }
}

fn read_error(path: &Path, source: std::io::Error) -> SourceError {
    SourceError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArchiveFile {
    Response { response: ArchiveResponse },
    Docs(Vec<ArchiveDocument>),
}

#[derive(Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    docs: Vec<ArchiveDocument>,
}

/// One archive document. Scalars are kept as raw JSON so that a field which
/// is sometimes a number and sometimes a string never rejects the file.
#[derive(Deserialize)]
struct ArchiveDocument {
    #[serde(rename = "_id", default)]
    id: Value,
    #[serde(rename = "abstract", default)]
    abstract_text: Value,
    #[serde(default)]
    web_url: Value,
    #[serde(default)]
    snippet: Value,
    #[serde(default)]
    lead_paragraph: Value,
    #[serde(default)]
    print_section: Value,
    #[serde(default)]
    print_page: Value,
    #[serde(default)]
    source: Value,
    #[serde(default)]
    headline: Value,
    #[serde(default)]
    pub_date: Value,
    #[serde(default)]
    document_type: Value,
    #[serde(default)]
    news_desk: Value,
    #[serde(default)]
    section_name: Value,
    #[serde(default)]
    byline: Value,
    #[serde(default)]
    type_of_material: Value,
    #[serde(default)]
    word_count: Value,
}

impl From<ArchiveDocument> for RawArticle {
    fn from(doc: ArchiveDocument) -> Self {
        Self {
            original_id: scalar_text(&doc.id),
            abstract_text: scalar_text(&doc.abstract_text),
            web_url: scalar_text(&doc.web_url),
            snippet: scalar_text(&doc.snippet),
            lead_paragraph: scalar_text(&doc.lead_paragraph),
            print_section: scalar_text(&doc.print_section),
            print_page: scalar_text(&doc.print_page),
            source: scalar_text(&doc.source),
            headline_main: nested_text(&doc.headline, "main"),
            headline_print_headline: nested_text(&doc.headline, "print_headline"),
            pub_date: scalar_text(&doc.pub_date),
            document_type: scalar_text(&doc.document_type),
            news_desk: scalar_text(&doc.news_desk),
            section_name: scalar_text(&doc.section_name),
            byline_original: nested_text(&doc.byline, "original"),
            byline_organization: nested_text(&doc.byline, "organization"),
            type_of_material: scalar_text(&doc.type_of_material),
            word_count: scalar_integer(&doc.word_count),
        }
    }
}

pub(crate) fn parse_archive(bytes: &[u8]) -> Result<Vec<RawArticle>, serde_json::Error> {
    let docs = match serde_json::from_slice::<ArchiveFile>(bytes)? {
        ArchiveFile::Response { response } => response.docs,
        ArchiveFile::Docs(docs) => docs,
    };
    Ok(docs.into_iter().map(RawArticle::from).collect())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn nested_text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_text)
}

fn scalar_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = r#"{
        "response": {
            "docs": [
                {
                    "_id": "nyt://article/1",
                    "abstract": "An abstract.",
                    "web_url": "https://example.com/1",
                    "headline": {"main": "Main", "print_headline": "Print"},
                    "pub_date": "2020-01-01T05:00:00+0000",
                    "byline": {"original": "By Jane Doe", "organization": null},
                    "print_page": 7,
                    "word_count": 812
                },
                {
                    "_id": "nyt://article/2",
                    "pub_date": "2020-01-02T10:30:00+0000",
                    "byline": [],
                    "word_count": "15"
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_archive_response() {
        let records = parse_archive(ARCHIVE.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].original_id.as_deref(), Some("nyt://article/1"));
        assert_eq!(records[0].headline_main.as_deref(), Some("Main"));
        assert_eq!(records[0].headline_print_headline.as_deref(), Some("Print"));
        assert_eq!(records[0].byline_original.as_deref(), Some("By Jane Doe"));
        assert_eq!(records[0].byline_organization, None);
        assert_eq!(records[0].print_page.as_deref(), Some("7"));
        assert_eq!(records[0].word_count, Some(812));

        assert_eq!(records[1].byline_original, None);
        assert_eq!(records[1].word_count, Some(15));
    }

    #[test]
    fn test_parse_bare_array() {
        let records =
            parse_archive(br#"[{"_id": "a", "pub_date": "2020-01-01"}, {"_id": "b"}]"#).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].pub_date, None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_archive(b"{\"response\": ").is_err());
        assert!(parse_archive(b"42").is_err());
    }

    #[tokio::test]
    async fn test_directory_is_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"[{"_id": "second"}]"#).unwrap();
        std::fs::write(dir.path().join("a.JSON"), r#"[{"_id": "first"}]"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let records = ArchiveSource::new(dir.path()).load().await.unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.original_id.as_deref()).collect();

        assert_eq!(ids, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_malformed_file_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"[{"_id": "ok"}]"#).unwrap();
        std::fs::write(dir.path().join("b.json"), "not json").unwrap();

        let result = ArchiveSource::new(dir.path()).load().await;

        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = ArchiveSource::new(dir.path().join("absent")).load().await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }
}
