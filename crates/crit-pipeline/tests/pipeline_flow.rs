//! End-to-end pipeline flow over the in-memory store: ingest, score,
//! extract, aggregate.

use std::sync::Arc;
use std::time::Duration;

use crit_core::{IssueStrategy, RawReview, Sentiment};
use crit_pipeline::{
    default_topic_rules, ingest_reviews, product_stats, ExtractOptions, IssueExtractor,
    KeywordTopicModel, LexiconSentimentModel, ScoreMode, SentimentAnalyzer,
};
use crit_storage::{MemoryStore, ReviewStore};

fn raw(reviewer: &str, rating: &str, text: &str, date: &str) -> RawReview {
    RawReview {
        reviewer_name: Some(reviewer.to_string()),
        rating: Some(rating.to_string()),
        title: None,
        review_text: Some(text.to_string()),
        location: None,
        date: Some(date.to_string()),
        verified: Some(true),
    }
}

#[tokio::test]
async fn full_pipeline_from_raw_reviews_to_dashboard_stats() {
    let store = MemoryStore::new();

    let raws = vec![
        raw(
            "asha patel",
            "2.0",
            "Terrible product. It broke in two days. Waste of money.",
            "21 August 2025",
        ),
        raw("Vik", "5.0", "Excellent trimmer. Love it.", "2025-08-01"),
        // Duplicate of the first record in different case.
        raw(
            "Asha Patel",
            "2.0",
            "terrible product. it broke in two days. waste of money.",
            "",
        ),
        raw("Outlier", "9.9", "This rating is way out of range", ""),
        raw("Tiny", "4.0", "bad", ""),
    ];

    let (product, ingest) = ingest_reviews(&store, "P1", "Steel Trimmer", &raws)
        .await
        .unwrap();
    assert_eq!(ingest.saved, 2);
    assert_eq!(ingest.duplicates, 1);
    assert_eq!(ingest.rejected, 2);

    let reviews = store.reviews_for_product(product.id).await.unwrap();
    assert_eq!(reviews[0].reviewer, "Asha Patel");
    assert_eq!(reviews[0].review_date, "2025-08-21");

    let analyzer = SentimentAnalyzer::new(
        Arc::new(LexiconSentimentModel::default()),
        Duration::from_secs(5),
    );
    let scored = analyzer
        .score_product(&store, &product, ScoreMode::MissingOnly)
        .await
        .unwrap();
    assert_eq!(scored.scored, 2);
    assert_eq!(scored.failed, 0);

    let reviews = store.reviews_for_product(product.id).await.unwrap();
    assert_eq!(reviews[0].sentiment, Some(Sentiment::Negative));
    assert_eq!(reviews[1].sentiment, Some(Sentiment::Positive));

    let extractor = IssueExtractor::new(
        Arc::new(KeywordTopicModel::default()),
        default_topic_rules(),
        Duration::from_secs(5),
    );
    let summary = extractor
        .extract(&store, &product, &ExtractOptions::default())
        .await
        .unwrap();
    // Only the 2-star review sits at or below the default threshold.
    assert_eq!(summary.reviews_analyzed, 1);
    assert_eq!(summary.critical_reviews, 1);
    assert!(!summary.issues.is_empty());
    assert!(summary
        .issues
        .iter()
        .any(|i| i.label == "value for money complaint"));
    assert!(summary.issues.iter().all(|i| i.avg_severity <= 10.0));

    let reviews = store.reviews_for_product(product.id).await.unwrap();
    assert!(reviews[0].is_critical);
    assert!(!reviews[1].is_critical);

    let frequency = extractor
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
    assert!(frequency
        .issues
        .iter()
        .all(|i| i.strategy == IssueStrategy::Frequency));
    let stored = store.issues_for_product(product.id).await.unwrap();
    assert_eq!(stored.len(), frequency.issues.len());

    let stats = product_stats(&store, &product, 2.4).await.unwrap();
    assert_eq!(stats.total_reviews, 2);
    assert_eq!(stats.avg_rating, 3.5);
    assert_eq!(stats.recent_reviews[0].reviewer, "Vik");
    let negative = stats
        .sentiment_counts
        .iter()
        .find(|c| c.sentiment == "negative")
        .unwrap();
    assert_eq!(negative.count, 1);
}
