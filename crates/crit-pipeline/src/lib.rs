//! Review-to-insight pipeline: normalization, sentiment scoring, critical
//! issue extraction, and dashboard statistics.

pub mod config;
pub mod issues;
pub mod model;
pub mod normalize;
pub mod report;
pub mod rules;
pub mod sentiment;
pub mod stats;
mod text;

pub const CRATE_NAME: &str = "crit-pipeline";

pub use config::AppConfig;
pub use issues::{evidence_sentences, language_intensity, ExtractOptions, IssueExtractor};
pub use model::{
    KeywordTopicModel, LeadSentenceSummarizer, LexiconSentimentModel, SentenceSentiment,
    SentimentModel, Summarizer, TopicModel,
};
pub use normalize::{
    clean_all, clean_product, clean_text, ingest_reviews, normalize_date, Normalizer,
    RejectReason, ANONYMOUS_REVIEWER,
};
pub use report::write_issue_reports;
pub use rules::{
    default_lexicon_rules, default_topic_rules, load_lexicon_rules, load_topic_rules,
    LexiconRules, TopicRule, WeightedWord,
};
pub use sentiment::{ScoreMode, SentimentAnalyzer};
pub use stats::{
    data_quality_report, product_stats, summarize_product, DataQualityReport, ProductDigest,
    ProductStats, QualityIssue, RatingCount, RecentReview, SentimentCount,
};
pub use text::{sentences, Sentences};
