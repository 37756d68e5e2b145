//! Core domain model and operation-summary types for CRIT.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "crit-core";

/// Binary review-level sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// Aspect bucket a review is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Product,
    Delivery,
    Seller,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Product => "product",
            Category::Delivery => "delivery",
            Category::Seller => "seller",
            Category::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "product" => Category::Product,
            "delivery" => Category::Delivery,
            "seller" => Category::Seller,
            _ => Category::Other,
        }
    }
}

/// Raw scraped review record as handed over by a marketplace adapter.
///
/// Every field is optional; the normalizer decides what is usable.
/// `rating` stays a string here because scraped pages deliver text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// Catalog item whose reviews are being analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub pid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted customer review.
///
/// `rating` is `None` only for rows that entered through the raw path with
/// an unparseable scraped value; the normalizer guarantees `Some` within
/// [1.0, 5.0] for everything it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub reviewer: String,
    pub rating: Option<f64>,
    pub verified: bool,
    pub text: String,
    pub title: String,
    pub location: Option<String>,
    pub review_date: String,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub is_critical: bool,
    pub category: Category,
}

/// Insert contract for a review; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub reviewer: String,
    pub rating: Option<f64>,
    pub verified: bool,
    pub text: String,
    pub title: String,
    pub location: Option<String>,
    pub review_date: String,
    pub category: Category,
}

/// Extraction strategy that produced an issue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStrategy {
    Topics,
    Frequency,
}

impl IssueStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStrategy::Topics => "topics",
            IssueStrategy::Frequency => "frequency",
        }
    }
}

/// Reviewer mention count inside one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerMentions {
    pub reviewer: String,
    pub mentions: u32,
}

/// One extracted complaint topic or phrase, fully regenerated per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub label: String,
    pub mentions: u32,
    pub avg_severity: f64,
    pub top_reviewers: Vec<ReviewerMentions>,
    pub evidence: Vec<String>,
    pub strategy: IssueStrategy,
}

/// Confidence the topic model assigns to one label for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub label: String,
    pub confidence: f64,
}

/// Ingestion boundary return contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub saved: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Clean-and-normalize return contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanSummary {
    pub cleaned: usize,
    pub deleted: usize,
}

/// Sentiment scoring return contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub scored: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Issue extraction return contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reviews_analyzed: usize,
    pub critical_reviews: usize,
    pub classification_failures: usize,
    pub issues: Vec<IssueReport>,
    pub text_summary: String,
    pub reports_dir: Option<String>,
}
