//! Review normalizer: validation, text cleaning, deduplication, and the
//! ingest/clean operations built on it.

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use crit_core::{Category, CleanSummary, IngestSummary, NewReview, Product, RawReview};
use crit_storage::ReviewStore;
use tracing::{debug, info};

pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooShort,
    BadRating,
    Duplicate,
}

/// Collapse whitespace runs, then strip non-ASCII / non-printable
/// characters.
///
/// The ASCII filter discards legitimate international text; that is the
/// recorded policy of this cleaner, revisit deliberately rather than here.
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let ascii: String = collapsed
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control())
        .collect();
    ascii.trim().to_string()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite `21 August 2025` style scrape dates to `2025-08-21`; anything
/// already dashed or unparseable passes through untouched.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains('-') {
        return trimmed.to_string();
    }
    match NaiveDate::parse_from_str(trimmed, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d %b %Y"))
    {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => trimmed.to_string(),
    }
}

fn dedup_key(reviewer: Option<&str>, cleaned_text: &str) -> (String, String) {
    let reviewer_key = match reviewer {
        Some(name) if !name.trim().is_empty() => name.trim().to_lowercase(),
        _ => "anon".to_string(),
    };
    (reviewer_key, cleaned_text.to_lowercase())
}

/// Validates and cleans raw reviews; owns the per-run dedup set.
#[derive(Default)]
pub struct Normalizer {
    seen: HashSet<(String, String)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, raw: &RawReview) -> Result<NewReview, RejectReason> {
        let text = raw.review_text.as_deref().unwrap_or("");
        if text.trim().chars().count() < 5 {
            return Err(RejectReason::TooShort);
        }
        let rating = match raw
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
        {
            Some(r) if (1.0..=5.0).contains(&r) => r,
            _ => return Err(RejectReason::BadRating),
        };
        let cleaned = clean_text(text);
        let key = dedup_key(raw.reviewer_name.as_deref(), &cleaned);
        if !self.seen.insert(key) {
            return Err(RejectReason::Duplicate);
        }

        let reviewer = raw
            .reviewer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(title_case)
            .unwrap_or_else(|| ANONYMOUS_REVIEWER.to_string());
        let title = raw.title.as_deref().map(clean_text).unwrap_or_default();
        let location = raw
            .location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string);

        Ok(NewReview {
            reviewer,
            rating: Some(rating),
            verified: raw.verified.unwrap_or(true),
            text: cleaned,
            title,
            location,
            review_date: raw.date.as_deref().map(normalize_date).unwrap_or_default(),
            category: Category::Other,
        })
    }
}

/// Ingestion boundary: idempotent product create, then normalize + persist
/// each raw record. Validation failures never error, they count.
pub async fn ingest_reviews(
    store: &dyn ReviewStore,
    pid: &str,
    name: &str,
    raws: &[RawReview],
) -> Result<(Product, IngestSummary)> {
    let product = store.get_or_create_product(pid, name).await?;
    let mut normalizer = Normalizer::new();
    let mut summary = IngestSummary::default();
    for raw in raws {
        match normalizer.normalize(raw) {
            Ok(review) => {
                store.insert_review(product.id, review).await?;
                summary.saved += 1;
            }
            Err(RejectReason::Duplicate) => summary.duplicates += 1,
            Err(reason) => {
                debug!(?reason, "rejected raw review");
                summary.rejected += 1;
            }
        }
    }
    info!(
        pid,
        saved = summary.saved,
        rejected = summary.rejected,
        duplicates = summary.duplicates,
        "ingested raw reviews"
    );
    Ok((product, summary))
}

/// Re-run normalization over a product's stored collection in insertion
/// order, rewriting cleaned fields and deleting invalid or duplicate rows.
pub async fn clean_product(store: &dyn ReviewStore, product: &Product) -> Result<CleanSummary> {
    let reviews = store.reviews_for_product(product.id).await?;
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut summary = CleanSummary::default();

    for mut review in reviews {
        if review.text.trim().chars().count() < 5 {
            store.delete_review(review.id).await?;
            summary.deleted += 1;
            continue;
        }
        let cleaned = clean_text(&review.text);
        let key = dedup_key(Some(&review.reviewer), &cleaned);
        if !seen.insert(key) {
            store.delete_review(review.id).await?;
            summary.deleted += 1;
            continue;
        }
        if !review.title.is_empty() {
            review.title = clean_text(&review.title);
        }
        if !review.reviewer.trim().is_empty() {
            review.reviewer = title_case(review.reviewer.trim());
        }
        match review.rating {
            Some(rating) if (1.0..=5.0).contains(&rating) => {}
            _ => {
                store.delete_review(review.id).await?;
                summary.deleted += 1;
                continue;
            }
        }
        review.review_date = normalize_date(&review.review_date);
        review.text = cleaned;
        store.update_cleaned_fields(&review).await?;
        summary.cleaned += 1;
    }
    Ok(summary)
}

/// Clean every product's collection; sums the per-product counters.
pub async fn clean_all(store: &dyn ReviewStore) -> Result<CleanSummary> {
    let mut total = CleanSummary::default();
    for product in store.list_products().await? {
        let summary = clean_product(store, &product).await?;
        total.cleaned += summary.cleaned;
        total.deleted += summary.deleted;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crit_storage::MemoryStore;

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

    #[test]
    fn clean_text_collapses_whitespace_and_strips_non_ascii() {
        assert_eq!(clean_text("  great\t\tvalue \n here  "), "great value here");
        assert_eq!(clean_text("sharp blades ✂️ indeed"), "sharp blades  indeed");
    }

    #[test]
    fn date_normalization_matrix() {
        assert_eq!(normalize_date("21 August 2025"), "2025-08-21");
        assert_eq!(normalize_date("21 Aug 2025"), "2025-08-21");
        assert_eq!(normalize_date("2025-08-21"), "2025-08-21");
        assert_eq!(normalize_date("garbage"), "garbage");
    }

    #[test]
    fn normalizer_enforces_rating_bounds() {
        let mut normalizer = Normalizer::new();
        for (rating, expect_ok) in [("0.9", false), ("1.0", true), ("5.0", true), ("5.1", false)] {
            let result = normalizer.normalize(&raw(
                &format!("Reviewer {rating}"),
                rating,
                &format!("text long enough for rating {rating}"),
                "",
            ));
            assert_eq!(result.is_ok(), expect_ok, "rating {rating}");
            if !expect_ok {
                assert_eq!(result.unwrap_err(), RejectReason::BadRating);
            }
        }
    }

    #[test]
    fn normalizer_rejects_short_text_and_duplicates() {
        let mut normalizer = Normalizer::new();
        assert_eq!(
            normalizer.normalize(&raw("A", "4", "ok", "")).unwrap_err(),
            RejectReason::TooShort
        );
        assert!(normalizer
            .normalize(&raw("ravi KUMAR", "4", "Battery drains fast", ""))
            .is_ok());
        // Same reviewer/text in different case is the same review.
        assert_eq!(
            normalizer
                .normalize(&raw("Ravi Kumar", "4", "battery drains FAST", ""))
                .unwrap_err(),
            RejectReason::Duplicate
        );
    }

    #[test]
    fn normalizer_fills_anonymous_and_title_cases_names() {
        let mut normalizer = Normalizer::new();
        let named = normalizer
            .normalize(&raw("ravi kumar", "4", "Battery drains fast", ""))
            .unwrap();
        assert_eq!(named.reviewer, "Ravi Kumar");

        let anonymous = normalizer
            .normalize(&RawReview {
                rating: Some("3".into()),
                review_text: Some("No name attached here".into()),
                ..RawReview::default()
            })
            .unwrap();
        assert_eq!(anonymous.reviewer, ANONYMOUS_REVIEWER);
    }

    #[tokio::test]
    async fn ingest_counts_saved_rejected_and_duplicates() {
        let store = MemoryStore::new();
        let raws = vec![
            raw("Asha", "2", "Stopped working in a week", "21 August 2025"),
            raw("Asha", "2", "stopped WORKING in a week", ""),
            raw("Vik", "7", "Rating out of range here", ""),
        ];
        let (product, summary) = ingest_reviews(&store, "P1", "Trimmer", &raws).await.unwrap();
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.rejected, 1);

        let reviews = store.reviews_for_product(product.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_date, "2025-08-21");
    }

    #[tokio::test]
    async fn clean_pass_rewrites_and_deletes_in_insertion_order() {
        let store = MemoryStore::new();
        let product = store.get_or_create_product("P1", "Trimmer").await.unwrap();
        let rows = [
            ("asha", Some(4.0), "  spaced   out   text  ", "21 Aug 2025"),
            ("Asha", Some(4.0), "spaced out text", "x"),
            ("Vik", Some(9.0), "rating is broken here", "x"),
            ("Mini", Some(3.0), "ok", "x"),
        ];
        for (reviewer, rating, text, date) in rows {
            store
                .insert_review(
                    product.id,
                    NewReview {
                        reviewer: reviewer.into(),
                        rating,
                        verified: true,
                        text: text.into(),
                        title: String::new(),
                        location: None,
                        review_date: date.into(),
                        category: Category::Other,
                    },
                )
                .await
                .unwrap();
        }

        let summary = clean_product(&store, &product).await.unwrap();
        assert_eq!(summary.cleaned, 1);
        assert_eq!(summary.deleted, 3);

        let reviews = store.reviews_for_product(product.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, "spaced out text");
        assert_eq!(reviews[0].reviewer, "Asha");
        assert_eq!(reviews[0].review_date, "2025-08-21");
    }
}
