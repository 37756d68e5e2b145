//! Review/product record store, raw page snapshots, and HTTP fetch utilities.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crit_core::{
    Category, IssueReport, NewReview, Product, Review, ReviewerMentions, Sentiment,
};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const CRATE_NAME: &str = "crit-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("product not found")]
    ProductNotFound,
    #[error("review {0} not found")]
    ReviewNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("issue payload serialization: {0}")]
    IssuePayload(#[from] serde_json::Error),
}

/// Record-oriented store for products and their ordered review collections.
///
/// `replace_issues` swaps a product's derived issue set atomically; callers
/// serialize extraction per product on top of this.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_or_create_product(&self, pid: &str, name: &str) -> Result<Product, StoreError>;
    async fn product_by_pid(&self, pid: &str) -> Result<Product, StoreError>;
    /// First product whose name contains `fragment`, case-insensitive.
    async fn product_by_name(&self, fragment: &str) -> Result<Product, StoreError>;
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn insert_review(&self, product_id: i64, review: NewReview)
        -> Result<i64, StoreError>;
    /// Reviews in insertion order.
    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StoreError>;
    async fn update_sentiment(
        &self,
        review_id: i64,
        sentiment: Sentiment,
        score: f64,
    ) -> Result<(), StoreError>;
    /// Rewrites the normalizer-owned fields of a stored review.
    async fn update_cleaned_fields(&self, review: &Review) -> Result<(), StoreError>;
    async fn mark_critical(&self, review_id: i64, category: Category) -> Result<(), StoreError>;
    async fn delete_review(&self, review_id: i64) -> Result<(), StoreError>;

    async fn replace_issues(
        &self,
        product_id: i64,
        issues: &[IssueReport],
    ) -> Result<usize, StoreError>;
    async fn issues_for_product(&self, product_id: i64) -> Result<Vec<IssueReport>, StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    next_product_id: i64,
    next_review_id: i64,
    products: Vec<Product>,
    reviews: BTreeMap<i64, Vec<Review>>,
    issues: BTreeMap<i64, Vec<IssueReport>>,
}

/// In-memory store; the default backend for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn get_or_create_product(&self, pid: &str, name: &str) -> Result<Product, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.products.iter().find(|p| p.pid == pid) {
            return Ok(existing.clone());
        }
        inner.next_product_id += 1;
        let product = Product {
            id: inner.next_product_id,
            pid: pid.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn product_by_pid(&self, pid: &str) -> Result<Product, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .products
            .iter()
            .find(|p| p.pid == pid)
            .cloned()
            .ok_or(StoreError::ProductNotFound)
    }

    async fn product_by_name(&self, fragment: &str) -> Result<Product, StoreError> {
        let needle = fragment.to_lowercase();
        let inner = self.inner.lock().await;
        inner
            .products
            .iter()
            .find(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .ok_or(StoreError::ProductNotFound)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.inner.lock().await.products.clone())
    }

    async fn insert_review(
        &self,
        product_id: i64,
        review: NewReview,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::ProductNotFound);
        }
        inner.next_review_id += 1;
        let id = inner.next_review_id;
        let stored = Review {
            id,
            product_id,
            reviewer: review.reviewer,
            rating: review.rating,
            verified: review.verified,
            text: review.text,
            title: review.title,
            location: review.location,
            review_date: review.review_date,
            sentiment: None,
            sentiment_score: None,
            is_critical: false,
            category: review.category,
        };
        inner.reviews.entry(product_id).or_default().push(stored);
        Ok(id)
    }

    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.reviews.get(&product_id).cloned().unwrap_or_default())
    }

    async fn update_sentiment(
        &self,
        review_id: i64,
        sentiment: Sentiment,
        score: f64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for reviews in inner.reviews.values_mut() {
            if let Some(review) = reviews.iter_mut().find(|r| r.id == review_id) {
                review.sentiment = Some(sentiment);
                review.sentiment_score = Some(score);
                return Ok(());
            }
        }
        Err(StoreError::ReviewNotFound(review_id))
    }

    async fn update_cleaned_fields(&self, review: &Review) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for reviews in inner.reviews.values_mut() {
            if let Some(stored) = reviews.iter_mut().find(|r| r.id == review.id) {
                stored.reviewer = review.reviewer.clone();
                stored.rating = review.rating;
                stored.text = review.text.clone();
                stored.title = review.title.clone();
                stored.review_date = review.review_date.clone();
                return Ok(());
            }
        }
        Err(StoreError::ReviewNotFound(review.id))
    }

    async fn mark_critical(&self, review_id: i64, category: Category) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for reviews in inner.reviews.values_mut() {
            if let Some(review) = reviews.iter_mut().find(|r| r.id == review_id) {
                review.is_critical = true;
                review.category = category;
                return Ok(());
            }
        }
        Err(StoreError::ReviewNotFound(review_id))
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for reviews in inner.reviews.values_mut() {
            if let Some(pos) = reviews.iter().position(|r| r.id == review_id) {
                reviews.remove(pos);
                return Ok(());
            }
        }
        Err(StoreError::ReviewNotFound(review_id))
    }

    async fn replace_issues(
        &self,
        product_id: i64,
        issues: &[IssueReport],
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::ProductNotFound);
        }
        inner.issues.insert(product_id, issues.to_vec());
        Ok(issues.len())
    }

    async fn issues_for_product(&self, product_id: i64) -> Result<Vec<IssueReport>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.issues.get(&product_id).cloned().unwrap_or_default())
    }
}

/// SQLite-backed store (WAL, foreign keys on, cascade deletes).
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;
            }
        }
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pid TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                reviewer TEXT NOT NULL,
                rating REAL,
                verified INTEGER NOT NULL DEFAULT 1,
                text TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                location TEXT,
                review_date TEXT NOT NULL DEFAULT '',
                sentiment TEXT,
                sentiment_score REAL,
                is_critical INTEGER NOT NULL DEFAULT 0,
                category TEXT NOT NULL DEFAULT 'other'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS issues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                label TEXT NOT NULL,
                mentions INTEGER NOT NULL,
                avg_severity REAL NOT NULL,
                top_reviewers TEXT NOT NULL,
                evidence TEXT NOT NULL,
                strategy TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, StoreError> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Product {
        id: row.try_get("id")?,
        pid: row.try_get("pid")?,
        name: row.try_get("name")?,
        created_at,
    })
}

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> Result<Review, StoreError> {
    let sentiment: Option<String> = row.try_get("sentiment")?;
    let category: String = row.try_get("category")?;
    Ok(Review {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        reviewer: row.try_get("reviewer")?,
        rating: row.try_get("rating")?,
        verified: row.try_get("verified")?,
        text: row.try_get("text")?,
        title: row.try_get("title")?,
        location: row.try_get("location")?,
        review_date: row.try_get("review_date")?,
        sentiment: sentiment.as_deref().and_then(Sentiment::parse),
        sentiment_score: row.try_get("sentiment_score")?,
        is_critical: row.try_get("is_critical")?,
        category: Category::parse(&category),
    })
}

#[async_trait]
impl ReviewStore for SqliteStore {
    async fn get_or_create_product(&self, pid: &str, name: &str) -> Result<Product, StoreError> {
        if let Some(row) = sqlx::query("SELECT id, pid, name, created_at FROM products WHERE pid = ?")
            .bind(pid)
            .fetch_optional(&self.pool)
            .await?
        {
            return row_to_product(&row);
        }
        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO products (pid, name, created_at) VALUES (?, ?, ?)")
            .bind(pid)
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(Product {
            id: result.last_insert_rowid(),
            pid: pid.to_string(),
            name: name.to_string(),
            created_at,
        })
    }

    async fn product_by_pid(&self, pid: &str) -> Result<Product, StoreError> {
        let row = sqlx::query("SELECT id, pid, name, created_at FROM products WHERE pid = ?")
            .bind(pid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ProductNotFound)?;
        row_to_product(&row)
    }

    async fn product_by_name(&self, fragment: &str) -> Result<Product, StoreError> {
        let row = sqlx::query(
            "SELECT id, pid, name, created_at FROM products \
             WHERE lower(name) LIKE '%' || lower(?) || '%' ORDER BY id LIMIT 1",
        )
        .bind(fragment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ProductNotFound)?;
        row_to_product(&row)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT id, pid, name, created_at FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn insert_review(
        &self,
        product_id: i64,
        review: NewReview,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews
                (product_id, reviewer, rating, verified, text, title, location, review_date, category)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product_id)
        .bind(&review.reviewer)
        .bind(review.rating)
        .bind(review.verified)
        .bind(&review.text)
        .bind(&review.title)
        .bind(&review.location)
        .bind(&review.review_date)
        .bind(review.category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.message().contains("FOREIGN KEY") => {
                StoreError::ProductNotFound
            }
            other => StoreError::Database(other),
        })?;
        Ok(result.last_insert_rowid())
    }

    async fn reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE product_id = ? ORDER BY id")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_review).collect()
    }

    async fn update_sentiment(
        &self,
        review_id: i64,
        sentiment: Sentiment,
        score: f64,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE reviews SET sentiment = ?, sentiment_score = ? WHERE id = ?")
                .bind(sentiment.as_str())
                .bind(score)
                .bind(review_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ReviewNotFound(review_id));
        }
        Ok(())
    }

    async fn update_cleaned_fields(&self, review: &Review) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE reviews SET reviewer = ?, rating = ?, text = ?, title = ?, review_date = ? \
             WHERE id = ?",
        )
        .bind(&review.reviewer)
        .bind(review.rating)
        .bind(&review.text)
        .bind(&review.title)
        .bind(&review.review_date)
        .bind(review.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ReviewNotFound(review.id));
        }
        Ok(())
    }

    async fn mark_critical(&self, review_id: i64, category: Category) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE reviews SET is_critical = 1, category = ? WHERE id = ?")
            .bind(category.as_str())
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ReviewNotFound(review_id));
        }
        Ok(())
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ReviewNotFound(review_id));
        }
        Ok(())
    }

    async fn replace_issues(
        &self,
        product_id: i64,
        issues: &[IssueReport],
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM issues WHERE product_id = ?")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        for issue in issues {
            sqlx::query(
                r#"
                INSERT INTO issues
                    (product_id, label, mentions, avg_severity, top_reviewers, evidence, strategy)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(product_id)
            .bind(&issue.label)
            .bind(issue.mentions as i64)
            .bind(issue.avg_severity)
            .bind(serde_json::to_string(&issue.top_reviewers)?)
            .bind(serde_json::to_string(&issue.evidence)?)
            .bind(issue.strategy.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(issues.len())
    }

    async fn issues_for_product(&self, product_id: i64) -> Result<Vec<IssueReport>, StoreError> {
        let rows = sqlx::query(
            "SELECT label, mentions, avg_severity, top_reviewers, evidence, strategy \
             FROM issues WHERE product_id = ? ORDER BY mentions DESC, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let top_reviewers: Vec<ReviewerMentions> =
                serde_json::from_str(row.try_get::<String, _>("top_reviewers")?.as_str())?;
            let evidence: Vec<String> =
                serde_json::from_str(row.try_get::<String, _>("evidence")?.as_str())?;
            let strategy: String = row.try_get("strategy")?;
            out.push(IssueReport {
                label: row.try_get("label")?,
                mentions: row.try_get::<i64, _>("mentions")? as u32,
                avg_severity: row.try_get("avg_severity")?,
                top_reviewers,
                evidence,
                strategy: if strategy == "frequency" {
                    crit_core::IssueStrategy::Frequency
                } else {
                    crit_core::IssueStrategy::Topics
                },
            });
        }
        Ok(out)
    }
}

/// Stored raw-page snapshot descriptor.
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub content_hash: String,
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub byte_size: usize,
    pub deduplicated: bool,
}

/// Hash-addressed snapshots of scraped review pages, one tree per day.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Store a scraped page immutably; identical content for the same
    /// marketplace/pid lands on the same path and is not rewritten.
    pub async fn store_page(
        &self,
        fetched_at: DateTime<Utc>,
        marketplace: &str,
        pid: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredPage> {
        let content_hash = Self::sha256_hex(bytes);
        let relative_path = PathBuf::from(fetched_at.format("%Y%m%d").to_string())
            .join(marketplace)
            .join(pid)
            .join(format!("{content_hash}.html"));
        let absolute_path = self.root.join(&relative_path);

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&absolute_path).await? {
            return Ok(StoredPage {
                content_hash,
                relative_path,
                absolute_path,
                byte_size: bytes.len(),
                deduplicated: true,
            });
        }

        let temp_path = absolute_path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        match fs::rename(&temp_path, &absolute_path).await {
            Ok(()) => Ok(StoredPage {
                content_hash,
                relative_path,
                absolute_path,
                byte_size: bytes.len(),
                deduplicated: false,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                let _ = fs::remove_file(&temp_path).await;
                Ok(StoredPage {
                    content_hash,
                    relative_path,
                    absolute_path,
                    byte_size: bytes.len(),
                    deduplicated: true,
                })
            }
            Err(err) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(err.into())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

fn status_is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn error_is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Single-page HTTP fetcher with an explicit timeout and bounded retry.
///
/// Resilience to slow or flaky marketplaces lives here, not in the
/// pipeline; the pipeline never retries.
#[derive(Debug)]
pub struct PageFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
}

impl PageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            backoff: BackoffPolicy::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error: Option<reqwest::Error> = None;
        for attempt in 0..=self.backoff.max_retries {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();
                    if status.is_success() {
                        return Ok(resp.text().await?);
                    }
                    if status_is_retryable(status) && attempt < self.backoff.max_retries {
                        debug!(%url, %status, attempt, "retrying page fetch");
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: final_url,
                    });
                }
                Err(err) => {
                    if error_is_retryable(&err) && attempt < self.backoff.max_retries {
                        debug!(%url, attempt, "retrying page fetch after request error");
                        last_error = Some(err);
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Request(err));
                }
            }
        }
        match last_error {
            Some(err) => Err(FetchError::Request(err)),
            None => Err(FetchError::HttpStatus {
                status: 0,
                url: url.to_string(),
            }),
        }
    }
}
