//! Model capabilities the pipeline depends on, plus deterministic default
//! implementations that run offline. Constructed once and passed in; tests
//! substitute scripted stubs.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crit_core::{Sentiment, TopicScore};

use crate::rules::{default_lexicon_rules, default_topic_rules, LexiconRules, TopicRule};
use crate::text::{alpha_words, sentences};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceSentiment {
    pub label: Sentiment,
    pub confidence: f64,
}

/// Binary sentence-level sentiment capability.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn classify(&self, sentence: &str) -> Result<SentenceSentiment>;
}

/// Zero-shot style multi-label topic capability over the closed label set.
#[async_trait]
pub trait TopicModel: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Vec<TopicScore>>;
}

/// Free-text summarization capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Deterministic weighted-lexicon sentiment model; the offline default.
pub struct LexiconSentimentModel {
    positive: HashMap<String, f64>,
    negative: HashMap<String, f64>,
}

impl LexiconSentimentModel {
    pub fn new(rules: &LexiconRules) -> Self {
        Self {
            positive: rules
                .positive
                .iter()
                .map(|w| (w.word.to_lowercase(), w.weight))
                .collect(),
            negative: rules
                .negative
                .iter()
                .map(|w| (w.word.to_lowercase(), w.weight))
                .collect(),
        }
    }
}

impl Default for LexiconSentimentModel {
    fn default() -> Self {
        Self::new(&default_lexicon_rules())
    }
}

#[async_trait]
impl SentimentModel for LexiconSentimentModel {
    async fn classify(&self, sentence: &str) -> Result<SentenceSentiment> {
        let mut signed = 0.0;
        for word in alpha_words(sentence) {
            if let Some(weight) = self.positive.get(&word) {
                signed += weight;
            }
            if let Some(weight) = self.negative.get(&word) {
                signed -= weight;
            }
        }
        let label = if signed >= 0.0 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        };
        let confidence = 0.5 + (signed.abs() * 0.1).min(0.45);
        Ok(SentenceSentiment { label, confidence })
    }
}

/// Keyword-hit topic model; one confidence per label, independently.
pub struct KeywordTopicModel {
    rules: Vec<TopicRule>,
}

impl KeywordTopicModel {
    pub fn new(rules: Vec<TopicRule>) -> Self {
        Self { rules }
    }
}

impl Default for KeywordTopicModel {
    fn default() -> Self {
        Self::new(default_topic_rules())
    }
}

#[async_trait]
impl TopicModel for KeywordTopicModel {
    async fn classify(&self, text: &str) -> Result<Vec<TopicScore>> {
        let lower = text.to_lowercase();
        Ok(self
            .rules
            .iter()
            .map(|rule| {
                let hits = rule
                    .keywords
                    .iter()
                    .filter(|k| lower.contains(&k.to_lowercase()))
                    .count();
                let confidence = if hits == 0 {
                    0.0
                } else {
                    (0.45 + 0.2 * hits as f64).min(0.95)
                };
                TopicScore {
                    label: rule.label.clone(),
                    confidence,
                }
            })
            .collect())
    }
}

/// Extractive fallback summarizer: leads with the first sentences.
pub struct LeadSentenceSummarizer {
    pub max_sentences: usize,
}

impl Default for LeadSentenceSummarizer {
    fn default() -> Self {
        Self { max_sentences: 3 }
    }
}

#[async_trait]
impl Summarizer for LeadSentenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let lead: Vec<&str> = sentences(text).take(self.max_sentences.max(1)).collect();
        if lead.is_empty() {
            return Err(anyhow!("nothing to summarize"));
        }
        Ok(format!("{}.", lead.join(". ")))
    }
}
