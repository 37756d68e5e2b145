//! Dashboard statistics, data-quality signals, and the product digest.

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use crit_core::{Product, Review};
use crit_storage::ReviewStore;
use serde::Serialize;
use tokio::time::timeout;
use tracing::warn;

use crate::model::Summarizer;
use crate::text::{round1, round2};

#[derive(Debug, Clone, Serialize)]
pub struct SentimentCount {
    pub sentiment: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentReview {
    pub reviewer: String,
    pub rating: Option<f64>,
    pub text: String,
    pub sentiment: String,
    pub review_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub total_reviews: usize,
    pub avg_rating: f64,
    pub sentiment_counts: Vec<SentimentCount>,
    pub recent_reviews: Vec<RecentReview>,
}

fn human_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%b %d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn display_row(review: &Review) -> RecentReview {
    RecentReview {
        reviewer: review.reviewer.clone(),
        rating: review.rating,
        text: review.text.clone(),
        sentiment: review
            .sentiment
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "neutral".to_string()),
        review_date: human_date(&review.review_date),
    }
}

/// Dashboard aggregates. Unparseable ratings stay out of the average on
/// both sides of the division; an empty set falls back to the configured
/// default instead of erroring.
pub async fn product_stats(
    store: &dyn ReviewStore,
    product: &Product,
    fallback_avg_rating: f64,
) -> Result<ProductStats> {
    let reviews = store.reviews_for_product(product.id).await?;
    let ratings: Vec<f64> = reviews.iter().filter_map(|r| r.rating).collect();
    let avg_rating = if ratings.is_empty() {
        fallback_avg_rating
    } else {
        round2(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let mut sentiment_counts: Vec<SentimentCount> = Vec::new();
    let mut recent_reviews = Vec::with_capacity(reviews.len());
    for review in reviews.iter().rev() {
        let bucket = review
            .sentiment
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        match sentiment_counts.iter_mut().find(|c| c.sentiment == bucket) {
            Some(count) => count.count += 1,
            None => sentiment_counts.push(SentimentCount {
                sentiment: bucket,
                count: 1,
            }),
        }
        recent_reviews.push(display_row(review));
    }

    Ok(ProductStats {
        total_reviews: reviews.len(),
        avg_rating,
        sentiment_counts,
        recent_reviews,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityIssue {
    pub issue: String,
    pub severity: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQualityReport {
    pub total_reviews: usize,
    pub issues: Vec<QualityIssue>,
}

/// Data-quality signals the dashboard surfaces alongside the complaint
/// issues: records that will skew or fall out of the aggregates.
pub async fn data_quality_report(
    store: &dyn ReviewStore,
    product: &Product,
) -> Result<DataQualityReport> {
    let reviews = store.reviews_for_product(product.id).await?;
    let denominator = reviews.len().max(1) as f64;
    let mut issues = Vec::new();

    let mut push = |issue: &str, severity: &str, count: usize| {
        if count > 0 {
            issues.push(QualityIssue {
                issue: issue.to_string(),
                severity: severity.to_string(),
                count,
                percent: round1(count as f64 / denominator * 100.0),
            });
        }
    };

    push(
        "Missing rating / avg fallback used",
        "High",
        reviews.iter().filter(|r| r.rating.is_none()).count(),
    );
    push(
        "Reviewer name missing",
        "High",
        reviews.iter().filter(|r| r.reviewer.trim().is_empty()).count(),
    );
    push(
        "Unknown sentiment",
        "Medium",
        reviews.iter().filter(|r| r.sentiment.is_none()).count(),
    );
    push(
        "Short / truncated review text",
        "Medium",
        reviews.iter().filter(|r| r.text.chars().count() < 20).count(),
    );

    Ok(DataQualityReport {
        total_reviews: reviews.len(),
        issues,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingCount {
    pub rating: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDigest {
    pub summary: String,
    pub total_reviews: usize,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
    pub sample_reviews: Vec<RecentReview>,
}

const DIGEST_MIN_WORDS: usize = 50;

/// One-paragraph digest of a product's corpus via the summarization
/// capability, with the corpus stats the dashboard shows next to it.
pub async fn summarize_product(
    summarizer: &dyn Summarizer,
    store: &dyn ReviewStore,
    product: &Product,
    summarize_timeout: Duration,
) -> Result<ProductDigest> {
    let reviews = store.reviews_for_product(product.id).await?;
    let combined = reviews
        .iter()
        .map(|r| r.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let summary = if combined.split_whitespace().count() > DIGEST_MIN_WORDS {
        match timeout(summarize_timeout, summarizer.summarize(&combined)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                warn!(pid = %product.pid, error = %err, "summarization failed");
                "Unable to generate summary due to processing constraints.".to_string()
            }
            Err(_) => {
                warn!(pid = %product.pid, "summarization timed out");
                "Unable to generate summary due to processing constraints.".to_string()
            }
        }
    } else {
        "Insufficient review content for meaningful summarization.".to_string()
    };

    let ratings: Vec<f64> = reviews.iter().filter_map(|r| r.rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        round2(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };
    let mut rating_distribution: Vec<RatingCount> = Vec::new();
    for rating in &ratings {
        let key = format!("{rating:.1}");
        match rating_distribution.iter_mut().find(|c| c.rating == key) {
            Some(count) => count.count += 1,
            None => rating_distribution.push(RatingCount {
                rating: key,
                count: 1,
            }),
        }
    }
    rating_distribution.sort_by(|a, b| b.rating.cmp(&a.rating));

    let sample_reviews = reviews.iter().take(3).map(display_row).collect();

    Ok(ProductDigest {
        summary,
        total_reviews: reviews.len(),
        average_rating,
        rating_distribution,
        sample_reviews,
    })
}
