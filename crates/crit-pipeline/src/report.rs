//! Extraction-run report directory: markdown + JSON issue lists, the
//! narrative summary, and Parquet snapshots with a hashed manifest.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{BooleanArray, Float64Array, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field as ArrowField, Schema};
use crit_core::{ExtractSummary, IssueReport, Product, Review};
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::fs;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotManifest {
    pub schema_version: u32,
    pub files: Vec<SnapshotManifestFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotManifestFile {
    pub name: String,
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

pub async fn write_issue_reports(
    reports_root: &Path,
    product: &Product,
    summary: &ExtractSummary,
    reviews: &[Review],
) -> Result<PathBuf> {
    let reports_dir = reports_root.join(summary.run_id.to_string());
    fs::create_dir_all(&reports_dir)
        .await
        .with_context(|| format!("creating {}", reports_dir.display()))?;

    let mut lines = vec![
        format!("# Critical Issues — {}", product.name),
        String::new(),
        format!("- Run ID: `{}`", summary.run_id),
        format!("- Started: {}", summary.started_at),
        format!("- Finished: {}", summary.finished_at),
        format!("- Reviews analyzed: {}", summary.reviews_analyzed),
        format!("- Critical reviews: {}", summary.critical_reviews),
        format!(
            "- Classification failures: {}",
            summary.classification_failures
        ),
        String::new(),
    ];
    for issue in &summary.issues {
        lines.push(format!("## {}", issue.label));
        lines.push(format!("- Mentions: {}", issue.mentions));
        lines.push(format!("- Avg severity: {}/10", issue.avg_severity));
        for sample in &issue.evidence {
            lines.push(format!("  - {sample}"));
        }
        lines.push(String::new());
    }
    fs::write(reports_dir.join("issues.md"), lines.join("\n"))
        .await
        .context("writing issues.md")?;

    let issues_json = serde_json::to_vec_pretty(summary).context("serializing issue summary")?;
    fs::write(reports_dir.join("issues.json"), issues_json)
        .await
        .context("writing issues.json")?;

    fs::write(reports_dir.join("summary.txt"), &summary.text_summary)
        .await
        .context("writing summary.txt")?;

    let snapshot_dir = reports_dir.join("snapshots");
    fs::create_dir_all(&snapshot_dir)
        .await
        .with_context(|| format!("creating {}", snapshot_dir.display()))?;
    let reviews_path = snapshot_dir.join("reviews.parquet");
    let issues_path = snapshot_dir.join("issues.parquet");
    write_reviews_parquet(&reviews_path, reviews)?;
    write_issues_parquet(&issues_path, &summary.issues)?;

    let manifest = SnapshotManifest {
        schema_version: 1,
        files: vec![
            manifest_entry("reviews", &reports_dir, &reviews_path)?,
            manifest_entry("issues", &reports_dir, &issues_path)?,
        ],
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("serializing snapshot manifest")?;
    fs::write(snapshot_dir.join("manifest.json"), manifest_bytes)
        .await
        .context("writing manifest.json")?;

    Ok(reports_dir)
}

fn write_parquet(path: &Path, batch: RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("opening parquet writer {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("writing record batch {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing parquet writer {}", path.display()))?;
    Ok(())
}

fn write_reviews_parquet(path: &Path, reviews: &[Review]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("reviewer", DataType::Utf8, false),
        ArrowField::new("rating", DataType::Float64, true),
        ArrowField::new("sentiment", DataType::Utf8, true),
        ArrowField::new("sentiment_score", DataType::Float64, true),
        ArrowField::new("is_critical", DataType::Boolean, false),
        ArrowField::new("category", DataType::Utf8, false),
        ArrowField::new("review_date", DataType::Utf8, false),
    ]));

    let reviewers = StringArray::from(
        reviews
            .iter()
            .map(|r| Some(r.reviewer.as_str()))
            .collect::<Vec<_>>(),
    );
    let ratings = Float64Array::from(reviews.iter().map(|r| r.rating).collect::<Vec<_>>());
    let sentiments = StringArray::from(
        reviews
            .iter()
            .map(|r| r.sentiment.map(|s| s.as_str()))
            .collect::<Vec<_>>(),
    );
    let scores =
        Float64Array::from(reviews.iter().map(|r| r.sentiment_score).collect::<Vec<_>>());
    let criticals = BooleanArray::from(reviews.iter().map(|r| r.is_critical).collect::<Vec<_>>());
    let categories = StringArray::from(
        reviews
            .iter()
            .map(|r| Some(r.category.as_str()))
            .collect::<Vec<_>>(),
    );
    let dates = StringArray::from(
        reviews
            .iter()
            .map(|r| Some(r.review_date.as_str()))
            .collect::<Vec<_>>(),
    );

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(reviewers),
            Arc::new(ratings),
            Arc::new(sentiments),
            Arc::new(scores),
            Arc::new(criticals),
            Arc::new(categories),
            Arc::new(dates),
        ],
    )
    .context("building reviews record batch")?;
    write_parquet(path, batch)
}

fn write_issues_parquet(path: &Path, issues: &[IssueReport]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("label", DataType::Utf8, false),
        ArrowField::new("mentions", DataType::UInt32, false),
        ArrowField::new("avg_severity", DataType::Float64, false),
        ArrowField::new("strategy", DataType::Utf8, false),
    ]));

    let labels = StringArray::from(
        issues
            .iter()
            .map(|i| Some(i.label.as_str()))
            .collect::<Vec<_>>(),
    );
    let mentions = UInt32Array::from(issues.iter().map(|i| i.mentions).collect::<Vec<_>>());
    let severities =
        Float64Array::from(issues.iter().map(|i| i.avg_severity).collect::<Vec<_>>());
    let strategies = StringArray::from(
        issues
            .iter()
            .map(|i| Some(i.strategy.as_str()))
            .collect::<Vec<_>>(),
    );

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(labels),
            Arc::new(mentions),
            Arc::new(severities),
            Arc::new(strategies),
        ],
    )
    .context("building issues record batch")?;
    write_parquet(path, batch)
}

fn manifest_entry(name: &str, reports_dir: &Path, path: &Path) -> Result<SnapshotManifestFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = hex::encode(hasher.finalize());
    let rel = path
        .strip_prefix(reports_dir)
        .unwrap_or(path)
        .display()
        .to_string();
    Ok(SnapshotManifestFile {
        name: name.to_string(),
        path: rel,
        sha256,
        bytes: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::{ExtractOptions, IssueExtractor};
    use crate::model::KeywordTopicModel;
    use crate::normalize::ingest_reviews;
    use crate::rules::default_topic_rules;
    use crit_core::{IssueStrategy, RawReview, Sentiment};
    use crit_storage::{MemoryStore, ReviewStore};
    use std::time::Duration;

    #[tokio::test]
    async fn issue_reports_land_on_disk_with_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MemoryStore::new();
        let raws: Vec<RawReview> = [
            ("Asha", "battery died quickly and battery drains"),
            ("Vik", "battery died after one charge"),
        ]
        .iter()
        .map(|(reviewer, text)| RawReview {
            reviewer_name: Some(reviewer.to_string()),
            rating: Some("2".to_string()),
            review_text: Some(text.to_string()),
            ..RawReview::default()
        })
        .collect();
        let (product, _) = ingest_reviews(&store, "P1", "Trimmer", &raws).await.unwrap();
        for review in store.reviews_for_product(product.id).await.unwrap() {
            store
                .update_sentiment(review.id, Sentiment::Negative, 0.1)
                .await
                .unwrap();
        }

        let extractor = IssueExtractor::new(
            std::sync::Arc::new(KeywordTopicModel::default()),
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
        let reviews = store.reviews_for_product(product.id).await.unwrap();
        let reports_dir = write_issue_reports(dir.path(), &product, &summary, &reviews)
            .await
            .unwrap();
        assert!(reports_dir.join("issues.md").exists());
        assert!(reports_dir.join("issues.json").exists());
        assert!(reports_dir.join("summary.txt").exists());
        assert!(reports_dir.join("snapshots/reviews.parquet").exists());
        assert!(reports_dir.join("snapshots/manifest.json").exists());
    }
}
