//! Critical-issue extraction: topic-classification and frequency-heuristic
//! strategies, severity scoring, evidence selection, and per-label
//! summaries.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crit_core::{
    Category, ExtractSummary, IssueReport, IssueStrategy, Product, Review, ReviewerMentions,
    Sentiment, TopicScore,
};
use crit_storage::ReviewStore;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::TopicModel;
use crate::rules::TopicRule;
use crate::text::{alpha_words, round2, sentences};

const MAX_ISSUES_PER_REVIEW: usize = 5;
const MAX_EVIDENCE_PER_TOPIC: usize = 2;
const TOPIC_ACCEPT_THRESHOLD: f64 = 0.4;

/// Strong complaint vocabulary; occurrence count drives the intensity
/// multiplier used in severity scoring and evidence ranking.
const STRONG_NEGATIVE_WORDS: &[&str] = &[
    "terrible",
    "worst",
    "horrible",
    "disgusting",
    "hate",
    "awful",
    "painful",
];

const FREQUENCY_STOP_WORDS: &[&str] = &[
    "the", "and", "this", "that", "with", "from", "have", "been", "just", "very", "also", "but",
    "are", "too", "not", "for", "you", "your", "was", "has", "had", "its", "they", "them", "their",
    "there", "after", "more", "less", "when", "where", "which", "then", "than", "what", "why",
    "how", "can", "could", "would", "should", "may", "might", "did", "does", "done", "into",
    "over", "under", "onto", "upon",
];

/// Generic filler that keeps showing up in complaint text without naming
/// an issue.
const FREQUENCY_BAN_WORDS: &[&str] = &[
    "good", "great", "nice", "awesome", "perfect", "amazing", "product", "quality",
];

/// 1.0–2.0 multiplier scaling with strong complaint-word occurrences.
pub fn language_intensity(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let count: usize = STRONG_NEGATIVE_WORDS
        .iter()
        .map(|word| lower.matches(word).count())
        .sum();
    1.0 + (count as f64 * 0.3).min(1.0)
}

/// Pick up to `max_samples` supporting sentences for a topic: keyword
/// matches first, most intense sentences as the fallback.
pub fn evidence_sentences(text: &str, label: &str, max_samples: usize) -> Vec<String> {
    let mut clean: Vec<String> = Vec::new();
    for span in sentences(text) {
        let scrubbed = span.replace("read more", "").replace("READ MORE", "");
        let scrubbed = scrubbed.trim().to_string();
        if !scrubbed.is_empty() && !clean.contains(&scrubbed) {
            clean.push(scrubbed);
        }
    }

    let keywords: Vec<String> = label
        .split_whitespace()
        .filter(|w| w.len() >= 3)
        .map(str::to_lowercase)
        .collect();
    let mut evidence: Vec<String> = clean
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .cloned()
        .collect();

    if evidence.is_empty() {
        let mut ranked = clean;
        ranked.sort_by(|a, b| {
            language_intensity(b)
                .partial_cmp(&language_intensity(a))
                .unwrap_or(Ordering::Equal)
        });
        evidence = ranked;
    }
    evidence.truncate(max_samples);
    evidence
}

fn category_for_label(label: &str) -> Category {
    if label.contains("delivery") || label.contains("packaging") {
        Category::Delivery
    } else {
        Category::Product
    }
}

#[derive(Debug, Clone)]
struct ReviewIssue {
    severity: f64,
    evidence: Vec<String>,
    reviewer: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub strategy: IssueStrategy,
    /// Only reviews rated at or below this take part in the topic strategy.
    pub min_rating: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategy: IssueStrategy::Topics,
            min_rating: 3.0,
        }
    }
}

/// Scans a product's review corpus for recurring complaints and atomically
/// replaces the product's recorded issue set.
pub struct IssueExtractor {
    topic_model: Arc<dyn TopicModel>,
    rules: Vec<TopicRule>,
    classify_timeout: Duration,
    // Same-product runs must not interleave around the replace; different
    // products stay independent.
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl IssueExtractor {
    pub fn new(
        topic_model: Arc<dyn TopicModel>,
        rules: Vec<TopicRule>,
        classify_timeout: Duration,
    ) -> Self {
        Self {
            topic_model,
            rules,
            classify_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn product_lock(&self, product_id: i64) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().await;
        map.entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn base_weight(&self, label: &str) -> f64 {
        self.rules
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.base_weight)
            .unwrap_or(1.0)
    }

    pub async fn extract(
        &self,
        store: &dyn ReviewStore,
        product: &Product,
        options: &ExtractOptions,
    ) -> Result<ExtractSummary> {
        let lock = self.product_lock(product.id).await;
        let _guard = lock.lock().await;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let (analyzed, critical, failures, issues) = match options.strategy {
            IssueStrategy::Topics => {
                self.extract_topics(store, product, options.min_rating).await?
            }
            IssueStrategy::Frequency => self.extract_frequency(store, product).await?,
        };
        store.replace_issues(product.id, &issues).await?;

        let text_summary = narrative_summary(&issues, analyzed);
        info!(
            pid = %product.pid,
            strategy = options.strategy.as_str(),
            analyzed,
            issues = issues.len(),
            "issue extraction finished"
        );
        Ok(ExtractSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            reviews_analyzed: analyzed,
            critical_reviews: critical,
            classification_failures: failures,
            issues,
            text_summary,
            reports_dir: None,
        })
    }

    async fn extract_topics(
        &self,
        store: &dyn ReviewStore,
        product: &Product,
        min_rating: f64,
    ) -> Result<(usize, usize, usize, Vec<IssueReport>)> {
        let reviews = store.reviews_for_product(product.id).await?;
        let selected: Vec<&Review> = reviews
            .iter()
            .filter(|r| matches!(r.rating, Some(rating) if rating <= min_rating))
            .collect();

        let mut grouped: Vec<(String, Vec<ReviewIssue>)> = Vec::new();
        let mut critical = 0usize;
        let mut failures = 0usize;

        for review in &selected {
            if review.text.is_empty() {
                continue;
            }
            let scores = match timeout(
                self.classify_timeout,
                self.topic_model.classify(&review.text),
            )
            .await
            {
                Ok(Ok(scores)) => scores,
                Ok(Err(err)) => {
                    warn!(review_id = review.id, error = %err, "topic classification failed; skipping review");
                    failures += 1;
                    continue;
                }
                Err(_) => {
                    warn!(review_id = review.id, "topic classification timed out; skipping review");
                    failures += 1;
                    continue;
                }
            };

            let mut accepted: Vec<TopicScore> = scores
                .into_iter()
                .filter(|s| s.confidence > TOPIC_ACCEPT_THRESHOLD)
                .collect();
            accepted.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            });
            accepted.truncate(MAX_ISSUES_PER_REVIEW);
            if accepted.is_empty() {
                continue;
            }

            let intensity = language_intensity(&review.text);
            for topic in &accepted {
                let severity = round2(
                    (self.base_weight(&topic.label) * topic.confidence * intensity).min(10.0),
                );
                let issue = ReviewIssue {
                    severity,
                    evidence: evidence_sentences(
                        &review.text,
                        &topic.label,
                        MAX_EVIDENCE_PER_TOPIC,
                    ),
                    reviewer: review.reviewer.clone(),
                };
                match grouped.iter_mut().find(|(label, _)| label == &topic.label) {
                    Some((_, list)) => list.push(issue),
                    None => grouped.push((topic.label.clone(), vec![issue])),
                }
            }

            store
                .mark_critical(review.id, category_for_label(&accepted[0].label))
                .await?;
            critical += 1;
        }

        Ok((selected.len(), critical, failures, summarize_topics(&grouped)))
    }

    /// No-model fallback: frequent unigrams/bigrams across the product's
    /// negative reviews.
    async fn extract_frequency(
        &self,
        store: &dyn ReviewStore,
        product: &Product,
    ) -> Result<(usize, usize, usize, Vec<IssueReport>)> {
        let reviews = store.reviews_for_product(product.id).await?;
        let negative: Vec<&Review> = reviews
            .iter()
            .filter(|r| r.sentiment == Some(Sentiment::Negative))
            .collect();
        if negative.is_empty() {
            return Ok((0, 0, 0, Vec::new()));
        }

        let blob = negative
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let stop: HashSet<&str> = FREQUENCY_STOP_WORDS.iter().copied().collect();
        let words: Vec<String> = alpha_words(&blob)
            .into_iter()
            .filter(|w| !stop.contains(w.as_str()))
            .collect();

        let mut merged: HashMap<String, u32> = HashMap::new();
        for word in &words {
            *merged.entry(word.clone()).or_default() += 1;
        }
        for pair in words.windows(2) {
            *merged.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
        }

        let ban: HashSet<&str> = FREQUENCY_BAN_WORDS.iter().copied().collect();
        let mut candidates: Vec<(String, u32)> = merged
            .into_iter()
            .filter(|(phrase, _)| !ban.contains(phrase.as_str()))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(5);

        let issues = candidates
            .into_iter()
            .map(|(phrase, frequency)| IssueReport {
                label: phrase,
                mentions: frequency,
                avg_severity: 0.0,
                top_reviewers: Vec::new(),
                evidence: Vec::new(),
                strategy: IssueStrategy::Frequency,
            })
            .collect();
        Ok((negative.len(), 0, 0, issues))
    }
}

fn summarize_topics(grouped: &[(String, Vec<ReviewIssue>)]) -> Vec<IssueReport> {
    let mut out = Vec::with_capacity(grouped.len());
    for (label, list) in grouped {
        let mentions = list.len() as u32;
        let avg_severity =
            round2(list.iter().map(|i| i.severity).sum::<f64>() / list.len() as f64);

        let mut reviewer_counts: Vec<ReviewerMentions> = Vec::new();
        for issue in list {
            match reviewer_counts
                .iter_mut()
                .find(|c| c.reviewer == issue.reviewer)
            {
                Some(count) => count.mentions += 1,
                None => reviewer_counts.push(ReviewerMentions {
                    reviewer: issue.reviewer.clone(),
                    mentions: 1,
                }),
            }
        }
        // Stable sort keeps first-seen order among equal counts.
        reviewer_counts.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        reviewer_counts.truncate(3);

        let mut evidence: Vec<String> = Vec::new();
        'collect: for issue in list {
            for sample in &issue.evidence {
                if !evidence.contains(sample) {
                    evidence.push(sample.clone());
                    if evidence.len() >= MAX_EVIDENCE_PER_TOPIC {
                        break 'collect;
                    }
                }
            }
        }

        out.push(IssueReport {
            label: label.clone(),
            mentions,
            avg_severity,
            top_reviewers: reviewer_counts,
            evidence,
            strategy: IssueStrategy::Topics,
        });
    }
    out.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    out
}

fn narrative_summary(issues: &[IssueReport], total_reviews: usize) -> String {
    if issues.is_empty() {
        return "No critical issues detected.".to_string();
    }
    let top = &issues[..issues.len().min(3)];
    let mut parts = vec![format!("We analyzed {total_reviews} reviews in total.")];
    parts.push(format!(
        "The most common problem was '{}' ({} mentions).",
        top[0].label, top[0].mentions
    ));
    if top.len() > 1 {
        let others = top[1..]
            .iter()
            .map(|issue| format!("'{}' (avg severity {}/10)", issue.label, issue.avg_severity))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Other notable issues include {others}."));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeywordTopicModel;
    use crate::normalize::ingest_reviews;
    use crate::rules::default_topic_rules;
    use async_trait::async_trait;
    use crit_core::RawReview;
    use crit_storage::MemoryStore;

    fn raw(reviewer: &str, rating: &str, text: &str) -> RawReview {
        RawReview {
            reviewer_name: Some(reviewer.to_string()),
            rating: Some(rating.to_string()),
            review_text: Some(text.to_string()),
            ..RawReview::default()
        }
    }

    #[test]
    fn intensity_scales_and_caps() {
        assert_eq!(language_intensity("all good here"), 1.0);
        assert!((language_intensity("terrible, just terrible and the worst") - 1.9).abs() < 1e-9);
        assert_eq!(
            language_intensity("terrible horrible awful worst hate painful"),
            2.0
        );
    }

    #[test]
    fn evidence_prefers_keyword_matches_then_intensity() {
        let text = "Delivery was late. The box arrived crushed. Works though.";
        let matched = evidence_sentences(text, "delivery or packaging issue", 2);
        assert_eq!(matched, vec!["Delivery was late".to_string()]);

        let fallback = evidence_sentences(
            "Absolutely terrible. It is fine otherwise.",
            "value for money complaint",
            2,
        );
        assert_eq!(fallback[0], "Absolutely terrible");
        assert_eq!(fallback.len(), 2);
    }

    struct ScriptedTopicModel {
        scores: Vec<TopicScore>,
    }

    #[async_trait]
    impl TopicModel for ScriptedTopicModel {
        async fn classify(&self, _text: &str) -> Result<Vec<TopicScore>> {
            Ok(self.scores.clone())
        }
    }

    fn score(label: &str, confidence: f64) -> TopicScore {
        TopicScore {
            label: label.to_string(),
            confidence,
        }
    }

    #[tokio::test]
    async fn topic_extraction_flags_critical_and_ranks_issues() {
        let store = MemoryStore::new();
        let (product, _) = ingest_reviews(
            &store,
            "P1",
            "Trimmer",
            &[
                raw("Asha", "2", "The blade is broken and the product stopped. Terrible."),
                raw("Vik", "1", "Broken on arrival, defect everywhere."),
                raw("Neel", "5", "Flawless, love it completely."),
            ],
        )
        .await
        .unwrap();

        let model = ScriptedTopicModel {
            scores: vec![
                score("product defect", 0.9),
                score("general dissatisfaction", 0.5),
                score("performance problem", 0.2),
            ],
        };
        let extractor = IssueExtractor::new(
            Arc::new(model),
            default_topic_rules(),
            Duration::from_secs(5),
        );
        let summary = extractor
            .extract(&store, &product, &ExtractOptions::default())
            .await
            .unwrap();

        // The 5-star review sits above the min-rating threshold.
        assert_eq!(summary.reviews_analyzed, 2);
        assert_eq!(summary.critical_reviews, 2);
        assert_eq!(summary.issues.len(), 2);
        assert_eq!(summary.issues[0].label, "product defect");
        assert_eq!(summary.issues[0].mentions, 2);
        assert!(summary.issues[0].avg_severity <= 10.0);
        assert!(summary.text_summary.contains("product defect"));

        let reviews = store.reviews_for_product(product.id).await.unwrap();
        assert!(reviews[0].is_critical);
        assert_eq!(reviews[0].category, Category::Product);
        assert!(!reviews[2].is_critical);

        let stored = store.issues_for_product(product.id).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn topic_acceptance_is_capped_at_five() {
        let store = MemoryStore::new();
        let (product, _) = ingest_reviews(
            &store,
            "P1",
            "Trimmer",
            &[raw("Asha", "1", "Everything about this is wrong.")],
        )
        .await
        .unwrap();

        let model = ScriptedTopicModel {
            scores: vec![
                score("health safety problem", 0.95),
                score("product defect", 0.9),
                score("performance problem", 0.85),
                score("delivery or packaging issue", 0.8),
                score("taste or consumption issue", 0.75),
                score("value for money complaint", 0.7),
                score("general dissatisfaction", 0.65),
            ],
        };
        let extractor = IssueExtractor::new(
            Arc::new(model),
            default_topic_rules(),
            Duration::from_secs(5),
        );
        let summary = extractor
            .extract(&store, &product, &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(summary.issues.len(), MAX_ISSUES_PER_REVIEW);
    }

    #[tokio::test]
    async fn severity_combines_base_confidence_and_intensity() {
        let store = MemoryStore::new();
        let (product, _) = ingest_reviews(
            &store,
            "P1",
            "Trimmer",
            &[raw("Asha", "1", "terrible terrible rash from this thing")],
        )
        .await
        .unwrap();

        let model = ScriptedTopicModel {
            scores: vec![score("health safety problem", 0.5)],
        };
        let extractor = IssueExtractor::new(
            Arc::new(model),
            default_topic_rules(),
            Duration::from_secs(5),
        );
        let summary = extractor
            .extract(&store, &product, &ExtractOptions::default())
            .await
            .unwrap();
        // base 9.0 * 0.5 conf * 1.6 intensity = 7.2
        assert_eq!(summary.issues[0].avg_severity, 7.2);
    }

    async fn seed_negative_reviews(store: &MemoryStore) -> Product {
        let (product, _) = ingest_reviews(
            store,
            "P1",
            "Trimmer",
            &[
                raw("Asha", "2", "battery died quickly and battery drains"),
                raw("Vik", "1", "battery died after one charge"),
                raw("Neel", "2", "blade rusted and blade chipped"),
            ],
        )
        .await
        .unwrap();
        let reviews = store.reviews_for_product(product.id).await.unwrap();
        for review in reviews {
            store
                .update_sentiment(review.id, Sentiment::Negative, 0.1)
                .await
                .unwrap();
        }
        product
    }

    #[tokio::test]
    async fn frequency_strategy_ranks_phrases_and_is_idempotent() {
        let store = MemoryStore::new();
        let product = seed_negative_reviews(&store).await;
        let extractor = IssueExtractor::new(
            Arc::new(KeywordTopicModel::default()),
            default_topic_rules(),
            Duration::from_secs(5),
        );
        let options = ExtractOptions {
            strategy: IssueStrategy::Frequency,
            min_rating: 3.0,
        };

        let first = extractor.extract(&store, &product, &options).await.unwrap();
        assert_eq!(first.issues.len(), 5);
        assert_eq!(first.issues[0].label, "battery");
        assert_eq!(first.issues[0].mentions, 3);
        assert_eq!(first.issues[1].label, "battery died");
        assert_eq!(first.issues[1].mentions, 2);
        assert!(first.issues.iter().all(|i| i.strategy == IssueStrategy::Frequency));

        let second = extractor.extract(&store, &product, &options).await.unwrap();
        assert_eq!(first.issues, second.issues);
        let stored = store.issues_for_product(product.id).await.unwrap();
        assert_eq!(stored.len(), 5);
    }

    #[tokio::test]
    async fn frequency_strategy_without_negative_reviews_clears_issues() {
        let store = MemoryStore::new();
        let (product, _) = ingest_reviews(
            &store,
            "P1",
            "Trimmer",
            &[raw("Asha", "5", "really lovely little device")],
        )
        .await
        .unwrap();
        let extractor = IssueExtractor::new(
            Arc::new(KeywordTopicModel::default()),
            default_topic_rules(),
            Duration::from_secs(5),
        );
        let summary = extractor
            .extract(
                &store,
                &product,
                &ExtractOptions {
                    strategy: IssueStrategy::Frequency,
                    min_rating: 3.0,
                },
            )
            .await
            .unwrap();
        assert!(summary.issues.is_empty());
        assert_eq!(summary.text_summary, "No critical issues detected.");
    }
}
