use std::path::{Path, PathBuf};

use ae_core::{Article, ArticleFields, ArticleFilter, ArticleId, ArticleRef, ArticleStorage, ArticleType, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use crate::StorageBackend;

const DEFAULT_DB_PATH: &str = "articles.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        url TEXT,
        author TEXT NOT NULL,
        published_date TEXT,
        image_url TEXT,
        kind TEXT NOT NULL,
        original_article_id TEXT,
        refs TEXT NOT NULL,
        scraped INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_kind_created ON articles (kind, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_articles_original ON articles (original_article_id)",
];

const COLUMNS: &str = "id, title, content, url, author, published_date, image_url, kind, \
                       original_article_id, refs, scraped, created_at, updated_at";

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn backend_name() -> &'static str {
        "sqlite"
    }

    async fn connect(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| storage_error("connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("run migration {}", i), e))?;
        }
        debug!("SQLite database ready at {}", db_path.display());

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn find(&self, filter: &ArticleFilter, skip: u64, limit: Option<u64>) -> Result<Vec<Article>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM articles", COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(limit.map_or(-1, clamp_i64));
        qb.push(" OFFSET ");
        qb.push_bind(clamp_i64(skip));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("find articles", e))?;
        rows.iter().map(article_from_row).collect()
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles");
        push_filter(&mut qb, filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("count articles", e))?;
        Ok(count as u64)
    }

    async fn get(&self, id: &ArticleId) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("get article", e))?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn insert(&self, mut fields: ArticleFields) -> Result<Article> {
        fields.published_date = fields.published_date.map(|date| date.trunc_subsecs(6));
        let article = Article::from_fields(ArticleId::new(), fields, Utc::now().trunc_subsecs(6));
        let refs = serde_json::to_string(&article.references)?;

        sqlx::query(&format!(
            "INSERT INTO articles ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLUMNS
        ))
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.url.as_deref())
        .bind(&article.author)
        .bind(article.published_date.map(format_timestamp))
        .bind(article.image_url.as_deref())
        .bind(article.kind.as_str())
        .bind(article.original_id().map(|id| id.to_string()))
        .bind(refs)
        .bind(article.scraped)
        .bind(format_timestamp(article.created_at))
        .bind(format_timestamp(article.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("store article", e))?;

        Ok(article)
    }

    async fn replace(&self, id: &ArticleId, fields: ArticleFields) -> Result<Option<Article>> {
        let refs = serde_json::to_string(&fields.references)?;
        let result = sqlx::query(
            r#"
            UPDATE articles SET
                title = ?, content = ?, url = ?, author = ?, published_date = ?,
                image_url = ?, kind = ?, original_article_id = ?, refs = ?,
                scraped = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(fields.url.as_deref())
        .bind(&fields.author)
        .bind(fields.published_date.map(format_timestamp))
        .bind(fields.image_url.as_deref())
        .bind(fields.kind.as_str())
        .bind(fields.original_article_id.map(|id| id.to_string()))
        .bind(refs)
        .bind(fields.scraped)
        .bind(format_timestamp(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("update article", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: &ArticleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete article", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_with_dependents(&self, id: &ArticleId) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        let own = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("delete article", e))?
            .rows_affected();
        if own == 0 {
            tx.rollback()
                .await
                .map_err(|e| storage_error("roll back transaction", e))?;
            return Ok(0);
        }

        let dependents = sqlx::query("DELETE FROM articles WHERE original_article_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("delete updated versions", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| storage_error("commit transaction", e))?;
        Ok(own + dependents)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ArticleFilter) {
    let mut keyword = " WHERE ";
    if let Some(kind) = filter.kind {
        qb.push(keyword).push("kind = ").push_bind(kind.as_str());
        keyword = " AND ";
    }
    if let Some(id) = filter.original_article_id {
        qb.push(keyword)
            .push("original_article_id = ")
            .push_bind(id.to_string());
    }
}

/// SQLite reads a negative OFFSET as zero, so out-of-range values must saturate.
fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Fixed-width UTC timestamps, so text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::storage(format!("Failed to parse date {}: {}", raw, e)))
}

fn storage_error(action: &str, e: sqlx::Error) -> Error {
    Error::storage(format!("Failed to {}: {}", action, e))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let column = |e: sqlx::Error| storage_error("read article row", e);

    let id: String = row.try_get("id").map_err(column)?;
    let kind: String = row.try_get("kind").map_err(column)?;
    let original_article_id: Option<String> = row.try_get("original_article_id").map_err(column)?;
    let published_date: Option<String> = row.try_get("published_date").map_err(column)?;
    let refs: String = row.try_get("refs").map_err(column)?;
    let created_at: String = row.try_get("created_at").map_err(column)?;
    let updated_at: String = row.try_get("updated_at").map_err(column)?;

    Ok(Article {
        id: parse_id(&id)?,
        title: row.try_get("title").map_err(column)?,
        content: row.try_get("content").map_err(column)?,
        url: row.try_get("url").map_err(column)?,
        author: row.try_get("author").map_err(column)?,
        published_date: published_date.as_deref().map(parse_timestamp).transpose()?,
        image_url: row.try_get("image_url").map_err(column)?,
        kind: kind
            .parse::<ArticleType>()
            .map_err(|_| Error::storage(format!("Unknown article type in database: {}", kind)))?,
        original_article_id: original_article_id
            .as_deref()
            .map(parse_id)
            .transpose()?
            .map(ArticleRef::Unresolved),
        references: serde_json::from_str(&refs)?,
        scraped: row.try_get("scraped").map_err(column)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_id(raw: &str) -> Result<ArticleId> {
    raw.parse()
        .map_err(|_| Error::storage(format!("Invalid article id in database: {}", raw)))
}
