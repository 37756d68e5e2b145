//! Sentence-level sentiment aggregation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crit_core::{Product, ScoreSummary, Sentiment};
use crit_storage::ReviewStore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::model::SentimentModel;
use crate::text::{round3, sentences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Only reviews without a stored label.
    MissingOnly,
    /// Every review, overwriting prior labels.
    All,
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Sentence-level sentiment aggregation: median decides, majority vote
/// breaks the boundary case, the mean becomes the stored confidence.
///
/// The median is robust to a single extreme sentence; the mean alone would
/// let one outlier clause flip an otherwise consistent review.
pub struct SentimentAnalyzer {
    model: Arc<dyn SentimentModel>,
    classify_timeout: Duration,
}

impl SentimentAnalyzer {
    pub fn new(model: Arc<dyn SentimentModel>, classify_timeout: Duration) -> Self {
        Self {
            model,
            classify_timeout,
        }
    }

    /// `None` means the text produced no sentences; the review stays
    /// unscored.
    pub async fn score_text(&self, text: &str) -> Result<Option<(Sentiment, f64)>> {
        let mut weighted: Vec<f64> = Vec::new();
        let mut positive = 0usize;

        for sentence in sentences(text) {
            let result = timeout(self.classify_timeout, self.model.classify(sentence))
                .await
                .map_err(|_| anyhow!("sentiment classification timed out"))??;
            let confidence = result.confidence.clamp(0.0, 1.0);
            match result.label {
                Sentiment::Positive => {
                    positive += 1;
                    weighted.push(confidence);
                }
                Sentiment::Negative => weighted.push(1.0 - confidence),
            }
        }

        if weighted.is_empty() {
            return Ok(None);
        }

        let mean = weighted.iter().sum::<f64>() / weighted.len() as f64;
        let majority = if 2 * positive >= weighted.len() {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        };
        let label = if median(&weighted) >= 0.5 {
            Sentiment::Positive
        } else {
            majority
        };
        Ok(Some((label, round3(mean))))
    }

    /// Score a product's reviews. Per-record failures are absorbed into the
    /// summary; the batch continues.
    pub async fn score_product(
        &self,
        store: &dyn ReviewStore,
        product: &Product,
        mode: ScoreMode,
    ) -> Result<ScoreSummary> {
        let reviews = store.reviews_for_product(product.id).await?;
        let mut summary = ScoreSummary::default();
        for review in reviews {
            if mode == ScoreMode::MissingOnly && review.sentiment.is_some() {
                continue;
            }
            match self.score_text(&review.text).await {
                Ok(Some((label, score))) => {
                    store.update_sentiment(review.id, label, score).await?;
                    summary.scored += 1;
                }
                Ok(None) => summary.skipped += 1,
                Err(err) => {
                    warn!(review_id = review.id, error = %err, "skipping unclassifiable review");
                    summary.failed += 1;
                }
            }
        }
        info!(
            pid = %product.pid,
            scored = summary.scored,
            skipped = summary.skipped,
            failed = summary.failed,
            "sentiment pass finished"
        );
        Ok(summary)
    }
}
