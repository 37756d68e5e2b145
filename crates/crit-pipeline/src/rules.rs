//! Topic and sentiment-lexicon rules: built-in defaults with optional YAML
//! overrides under the rules directory.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRule {
    pub label: String,
    pub base_weight: f64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopicRulesFile {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    rules: Vec<TopicRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedWord {
    pub word: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconRules {
    #[serde(default)]
    pub positive: Vec<WeightedWord>,
    #[serde(default)]
    pub negative: Vec<WeightedWord>,
}

#[derive(Debug, Clone, Deserialize)]
struct LexiconFile {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    positive: Vec<WeightedWord>,
    #[serde(default)]
    negative: Vec<WeightedWord>,
}

fn rule(label: &str, base_weight: f64, keywords: &[&str]) -> TopicRule {
    TopicRule {
        label: label.to_string(),
        base_weight,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// The closed issue-label set with per-label base weights, health/safety
/// highest.
pub fn default_topic_rules() -> Vec<TopicRule> {
    vec![
        rule(
            "health safety problem",
            9.0,
            &["health", "safety", "rash", "allergy", "allergic", "burn", "cut", "bleed", "injury", "infection"],
        ),
        rule(
            "product defect",
            8.0,
            &["defect", "defective", "broken", "broke", "damaged", "crack", "stopped", "dead", "faulty", "fake"],
        ),
        rule(
            "performance problem",
            7.0,
            &["performance", "slow", "weak", "battery", "heating", "lag", "noisy", "noise", "charge"],
        ),
        rule(
            "delivery or packaging issue",
            5.0,
            &["delivery", "delivered", "late", "packaging", "package", "box", "seal", "missing", "shipping", "courier"],
        ),
        rule(
            "taste or consumption issue",
            4.0,
            &["taste", "flavor", "smell", "odor", "stale", "expired", "texture"],
        ),
        rule(
            "value for money complaint",
            3.0,
            &["price", "expensive", "overpriced", "money", "worth", "costly", "waste"],
        ),
        rule(
            "general dissatisfaction",
            2.0,
            &["disappointed", "bad", "useless", "poor", "unhappy", "regret", "return", "refund"],
        ),
    ]
}

fn weighted(word: &str, weight: f64) -> WeightedWord {
    WeightedWord {
        word: word.to_string(),
        weight,
    }
}

pub fn default_lexicon_rules() -> LexiconRules {
    LexiconRules {
        positive: vec![
            weighted("good", 1.0),
            weighted("nice", 1.0),
            weighted("fine", 1.0),
            weighted("smooth", 1.0),
            weighted("fast", 1.0),
            weighted("comfortable", 1.0),
            weighted("worth", 1.0),
            weighted("great", 2.0),
            weighted("best", 2.0),
            weighted("love", 2.0),
            weighted("happy", 2.0),
            weighted("satisfied", 2.0),
            weighted("recommend", 2.0),
            weighted("excellent", 3.0),
            weighted("amazing", 3.0),
            weighted("awesome", 3.0),
            weighted("perfect", 3.0),
            weighted("fantastic", 3.0),
        ],
        negative: vec![
            weighted("slow", 1.0),
            weighted("cheap", 1.0),
            weighted("stopped", 1.0),
            weighted("return", 1.0),
            weighted("refund", 1.0),
            weighted("bad", 2.0),
            weighted("poor", 2.0),
            weighted("broken", 2.0),
            weighted("defective", 2.0),
            weighted("useless", 2.0),
            weighted("disappointed", 2.0),
            weighted("waste", 2.0),
            weighted("terrible", 3.0),
            weighted("worst", 3.0),
            weighted("horrible", 3.0),
            weighted("awful", 3.0),
            weighted("hate", 3.0),
            weighted("disgusting", 3.0),
            weighted("painful", 3.0),
        ],
    }
}

pub fn load_topic_rules(rules_dir: &Path) -> Result<Vec<TopicRule>> {
    let path = rules_dir.join("topics.yaml");
    if !path.exists() {
        return Ok(default_topic_rules());
    }
    let file: TopicRulesFile = serde_yaml::from_str(
        &std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
    )
    .with_context(|| format!("parsing {}", path.display()))?;
    if file.rules.is_empty() {
        return Ok(default_topic_rules());
    }
    Ok(file.rules)
}

pub fn load_lexicon_rules(rules_dir: &Path) -> Result<LexiconRules> {
    let path = rules_dir.join("lexicon.yaml");
    if !path.exists() {
        return Ok(default_lexicon_rules());
    }
    let file: LexiconFile = serde_yaml::from_str(
        &std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
    )
    .with_context(|| format!("parsing {}", path.display()))?;
    if file.positive.is_empty() && file.negative.is_empty() {
        return Ok(default_lexicon_rules());
    }
    Ok(LexiconRules {
        positive: file.positive,
        negative: file.negative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_when_rule_files_are_absent() {
        let dir = tempdir().expect("tempdir");
        let topics = load_topic_rules(dir.path()).unwrap();
        assert_eq!(topics.len(), 7);
        assert_eq!(topics[0].label, "health safety problem");
        assert_eq!(topics[0].base_weight, 9.0);

        let lexicon = load_lexicon_rules(dir.path()).unwrap();
        assert!(!lexicon.positive.is_empty());
        assert!(!lexicon.negative.is_empty());
    }

    #[test]
    fn yaml_override_replaces_topic_rules() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("topics.yaml"),
            "version: 1\nrules:\n  - label: battery trouble\n    base_weight: 6.0\n    keywords: [battery, charge]\n",
        )
        .unwrap();
        let topics = load_topic_rules(dir.path()).unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].label, "battery trouble");
        assert_eq!(topics[0].keywords, vec!["battery", "charge"]);
    }
}
