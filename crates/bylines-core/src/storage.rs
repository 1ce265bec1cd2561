use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

use crate::{
    Article, ArticleAuthor, ArticleId, Author, AuthorId, Error, NormalizedTables, Result,
};

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS article (
    article_id              INTEGER PRIMARY KEY NOT NULL,
    original_id             TEXT NOT NULL,
    abstract                TEXT,
    web_url                 TEXT,
    snippet                 TEXT,
    lead_paragraph          TEXT,
    print_section           TEXT,
    print_page              TEXT,
    source                  TEXT,
    pub_date                TEXT NOT NULL,
    document_type           TEXT,
    news_desk               TEXT,
    section_name            TEXT,
    type_of_material        TEXT,
    word_count              INTEGER NOT NULL DEFAULT 0,
    headline_main           TEXT,
    headline_print_headline TEXT,
    byline_organization     TEXT,
    a_date                  TEXT NOT NULL,
    a_time                  TEXT NOT NULL,
    authors_raw_text        TEXT NOT NULL DEFAULT '',
    authors                 TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS author (
    author_id   INTEGER PRIMARY KEY NOT NULL,
    author_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS article_author (
    article_id INTEGER NOT NULL REFERENCES article(article_id),
    author_id  INTEGER NOT NULL REFERENCES author(author_id),
    PRIMARY KEY (article_id, author_id)
);

CREATE INDEX IF NOT EXISTS idx_article_author_author ON article_author(author_id);
"#;

const ARTICLE_COLUMNS: &str = "article_id, original_id, abstract, web_url, snippet, \
    lead_paragraph, print_section, print_page, source, pub_date, document_type, news_desk, \
    section_name, type_of_material, word_count, headline_main, headline_print_headline, \
    byline_organization, a_date, a_time, authors_raw_text, authors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub articles: i64,
    pub authors: i64,
    pub article_authors: i64,
}

/// SQLite home of the article, author and article_author tables.
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    /// Opens or creates the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Replaces the contents of all three tables in one transaction. Either
    /// the whole run is committed or nothing changes.
    pub async fn replace_all(&self, tables: &NormalizedTables) -> Result<()> {
        tables.verify()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM article_author")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM author").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM article").execute(&mut *tx).await?;

        for article in &tables.articles {
            insert_article(&mut tx, article).await?;
        }
        for author in &tables.authors {
            insert_author(&mut tx, author).await?;
        }
        for link in &tables.article_authors {
            insert_link(&mut tx, *link).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Stored {} articles, {} authors, {} links",
            tables.articles.len(),
            tables.authors.len(),
            tables.article_authors.len()
        );

        Ok(())
    }

    pub async fn count_rows(&self) -> Result<TableCounts> {
        let (articles, authors, article_authors): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM article),
                (SELECT COUNT(*) FROM author),
                (SELECT COUNT(*) FROM article_author)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TableCounts {
            articles,
            authors,
            article_authors,
        })
    }

    pub async fn get_article(&self, id: ArticleId) -> Result<Article> {
        let row = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article WHERE article_id = ?"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ArticleNotFound(id))?;

        parse_article_row(&row)
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article ORDER BY article_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_article_row).collect()
    }

    pub async fn find_author(&self, name: &str) -> Result<Option<Author>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT author_id, author_name FROM author WHERE author_name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, name)| Author::new(AuthorId(id), name)))
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT author_id, author_name FROM author ORDER BY author_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Author::new(AuthorId(id), name))
            .collect())
    }

    pub async fn list_article_authors(&self) -> Result<Vec<ArticleAuthor>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT article_id, author_id FROM article_author ORDER BY article_id, author_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(article, author)| ArticleAuthor::new(ArticleId(article), AuthorId(author)))
            .collect())
    }

    pub async fn load_tables(&self) -> Result<NormalizedTables> {
        Ok(NormalizedTables::new(
            self.list_articles().await?,
            self.list_authors().await?,
            self.list_article_authors().await?,
        ))
    }
}

async fn insert_article(conn: &mut SqliteConnection, article: &Article) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO article ({ARTICLE_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(article.article_id.get())
    .bind(&article.original_id)
    .bind(&article.abstract_text)
    .bind(&article.web_url)
    .bind(&article.snippet)
    .bind(&article.lead_paragraph)
    .bind(&article.print_section)
    .bind(&article.print_page)
    .bind(&article.source)
    .bind(&article.pub_date)
    .bind(&article.document_type)
    .bind(&article.news_desk)
    .bind(&article.section_name)
    .bind(&article.type_of_material)
    .bind(article.word_count)
    .bind(&article.headline_main)
    .bind(&article.headline_print_headline)
    .bind(&article.byline_organization)
    .bind(article.a_date)
    .bind(article.a_time)
    .bind(&article.authors_raw_text)
    .bind(&article.authors)
    .execute(conn)
    .await
    .map_err(|e| unique_violation(e, "article", || article.article_id.to_string()))?;

    Ok(())
}

async fn insert_author(conn: &mut SqliteConnection, author: &Author) -> Result<()> {
    sqlx::query("INSERT INTO author (author_id, author_name) VALUES (?, ?)")
        .bind(author.author_id.get())
        .bind(&author.author_name)
        .execute(conn)
        .await
        .map_err(|e| unique_violation(e, "author", || author.author_name.clone()))?;

    Ok(())
}

async fn insert_link(conn: &mut SqliteConnection, link: ArticleAuthor) -> Result<()> {
    sqlx::query("INSERT INTO article_author (article_id, author_id) VALUES (?, ?)")
        .bind(link.article_id.get())
        .bind(link.author_id.get())
        .execute(conn)
        .await
        .map_err(|e| {
            unique_violation(e, "article_author", || {
                format!("({}, {})", link.article_id, link.author_id)
            })
        })?;

    Ok(())
}

fn unique_violation(e: sqlx::Error, table: &'static str, key: impl FnOnce() -> String) -> Error {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return Error::DuplicateKey { table, key: key() };
        }
    }
    Error::Database(e)
}

fn parse_article_row(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        article_id: ArticleId(row.try_get("article_id")?),
        original_id: row.try_get("original_id")?,
        abstract_text: row.try_get("abstract")?,
        web_url: row.try_get("web_url")?,
        snippet: row.try_get("snippet")?,
        lead_paragraph: row.try_get("lead_paragraph")?,
        print_section: row.try_get("print_section")?,
        print_page: row.try_get("print_page")?,
        source: row.try_get("source")?,
        pub_date: row.try_get("pub_date")?,
        document_type: row.try_get("document_type")?,
        news_desk: row.try_get("news_desk")?,
        section_name: row.try_get("section_name")?,
        type_of_material: row.try_get("type_of_material")?,
        word_count: row.try_get("word_count")?,
        headline_main: row.try_get("headline_main")?,
        headline_print_headline: row.try_get("headline_print_headline")?,
        byline_organization: row.try_get("byline_organization")?,
        a_date: row.try_get::<NaiveDate, _>("a_date")?,
        a_time: row.try_get::<NaiveTime, _>("a_time")?,
        authors_raw_text: row.try_get("authors_raw_text")?,
        authors: row.try_get("authors")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::NormalizationPipeline;
    use crate::RawArticle;

    fn tables() -> NormalizedTables {
        let records = vec![
            RawArticle::new("nyt://1", "2020-01-01T05:00:00+0000")
                .with_byline("By John Smith and Jane Doe for The New York Times")
                .with_section("U.S."),
            RawArticle::new("nyt://2", "2020-01-02T18:45:10+0000").with_byline("By Jane Doe"),
            RawArticle::new("nyt://3", "2020-01-03T00:00:00+0000"),
        ];
        NormalizationPipeline::new().process(records).unwrap().tables
    }

    #[tokio::test]
    async fn test_replace_all_and_read_back() {
        let storage = Storage::open_memory().await.unwrap();
        let tables = tables();

        storage.replace_all(&tables).await.unwrap();

        let counts = storage.count_rows().await.unwrap();
        assert_eq!(
            counts,
            TableCounts {
                articles: 3,
                authors: 2,
                article_authors: 3,
            }
        );
        assert_eq!(storage.load_tables().await.unwrap(), tables);

        let article = storage.get_article(ArticleId(1)).await.unwrap();
        assert_eq!(article.a_time, NaiveTime::from_hms_opt(18, 45, 10).unwrap());
        assert_eq!(article.authors, "Jane Doe");

        let jane = storage.find_author("Jane Doe").await.unwrap().unwrap();
        assert_eq!(jane.author_id, AuthorId(1));
        assert!(storage.find_author("jane doe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_rows() {
        let storage = Storage::open_memory().await.unwrap();
        storage.replace_all(&tables()).await.unwrap();

        let smaller = NormalizationPipeline::new()
            .process(vec![
                RawArticle::new("nyt://9", "2021-05-05").with_byline("By Solo Writer")
            ])
            .unwrap()
            .tables;
        storage.replace_all(&smaller).await.unwrap();

        assert_eq!(storage.load_tables().await.unwrap(), smaller);
    }

    #[tokio::test]
    async fn test_invalid_tables_are_not_written() {
        let storage = Storage::open_memory().await.unwrap();
        let good = tables();
        storage.replace_all(&good).await.unwrap();

        let mut broken = tables();
        broken
            .article_authors
            .push(ArticleAuthor::new(ArticleId(0), AuthorId(42)));

        let result = storage.replace_all(&broken).await;

        assert!(matches!(result, Err(Error::IntegrityViolation { .. })));
        assert_eq!(storage.load_tables().await.unwrap(), good);
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back() {
        let storage = Storage::open_memory().await.unwrap();
        let good = tables();
        storage.replace_all(&good).await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_author BEFORE INSERT ON author
            WHEN NEW.author_name = 'Rejected Name'
            BEGIN
                SELECT RAISE(ABORT, 'rejected');
            END
            "#,
        )
        .execute(&storage.pool)
        .await
        .unwrap();

        let failing = NormalizationPipeline::new()
            .process(vec![
                RawArticle::new("nyt://7", "2021-05-05").with_byline("By Okay Name"),
                RawArticle::new("nyt://8", "2021-05-06").with_byline("By Rejected Name"),
            ])
            .unwrap()
            .tables;

        let result = storage.replace_all(&failing).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(storage.load_tables().await.unwrap(), good);
    }

    #[tokio::test]
    async fn test_open_file_with_url_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run?mode=ro#1.db");

        let storage = Storage::open(&path).await.unwrap();
        storage.replace_all(&tables()).await.unwrap();
        drop(storage);

        assert!(path.exists());
        let reopened = Storage::open(&path).await.unwrap();
        assert_eq!(reopened.count_rows().await.unwrap().authors, 2);
        assert_eq!(reopened.load_tables().await.unwrap(), tables());
    }

    #[tokio::test]
    async fn test_missing_article() {
        let storage = Storage::open_memory().await.unwrap();
        let result = storage.get_article(ArticleId(0)).await;

        assert!(matches!(result, Err(Error::ArticleNotFound(ArticleId(0)))));
    }
}
