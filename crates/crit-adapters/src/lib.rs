//! Marketplace review-page adapters: HTML in, `RawReview` rows out.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use crit_core::RawReview;
use crit_storage::{ArtifactStore, FetchError, PageFetcher};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::info;

pub const CRATE_NAME: &str = "crit-adapters";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("bad selector: {0}")]
    Selector(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Parser for one marketplace's review pages.
///
/// Adapters only turn markup into raw field dictionaries; validation,
/// deduplication, and storage happen downstream in the pipeline.
pub trait ReviewPageAdapter: Send + Sync {
    fn marketplace(&self) -> &'static str;
    fn review_page_url(&self, pid: &str, page: usize) -> String;
    fn parse_reviews(&self, html: &str) -> Result<Vec<RawReview>, AdapterError>;
}

pub fn adapter_for_marketplace(name: &str) -> Option<Box<dyn ReviewPageAdapter>> {
    match name.to_ascii_lowercase().as_str() {
        "amazon" => Some(Box::new(AmazonAdapter)),
        "flipkart" => Some(Box::new(FlipkartAdapter)),
        _ => None,
    }
}

/// Load a list of raw review dictionaries from a JSON file (the offline
/// ingestion path).
pub fn load_raw_reviews(path: impl AsRef<Path>) -> anyhow::Result<Vec<RawReview>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Fetch up to `max_pages` review pages, snapshotting each into the
/// artifact store, and stop at the first page with no review blocks.
pub async fn fetch_review_pages(
    adapter: &dyn ReviewPageAdapter,
    fetcher: &PageFetcher,
    artifacts: &ArtifactStore,
    pid: &str,
    max_pages: usize,
) -> Result<Vec<RawReview>, AdapterError> {
    let mut reviews = Vec::new();
    for page in 1..=max_pages.max(1) {
        let url = adapter.review_page_url(pid, page);
        let html = fetcher.fetch_text(&url).await?;
        artifacts
            .store_page(Utc::now(), adapter.marketplace(), pid, html.as_bytes())
            .await?;
        let parsed = adapter.parse_reviews(&html)?;
        if parsed.is_empty() {
            break;
        }
        info!(
            marketplace = adapter.marketplace(),
            pid,
            page,
            count = parsed.len(),
            "parsed review page"
        );
        reviews.extend(parsed);
    }
    Ok(reviews)
}

fn parse_selector(selector: &str) -> Result<Selector, AdapterError> {
    Selector::parse(selector).map_err(|e| AdapterError::Selector(e.to_string()))
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn first_text(block: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .next()
        .and_then(|n| text_or_none(n.text().collect::<String>()))
}

/// Amazon-style review markup (`li[data-hook=review]` blocks).
#[derive(Debug, Clone, Copy)]
pub struct AmazonAdapter;

impl ReviewPageAdapter for AmazonAdapter {
    fn marketplace(&self) -> &'static str {
        "amazon"
    }

    fn review_page_url(&self, pid: &str, page: usize) -> String {
        format!("https://www.amazon.in/product-reviews/{pid}?pageNumber={page}")
    }

    fn parse_reviews(&self, html: &str) -> Result<Vec<RawReview>, AdapterError> {
        let document = Html::parse_document(html);
        let primary = parse_selector("li[data-hook=\"review\"]")?;
        let fallback = parse_selector("div.a-section.celwidget")?;
        let reviewer_sel = parse_selector(".a-profile-name")?;
        let collapsed_sel = parse_selector("span[data-hook=\"review-collapsed\"]")?;
        let body_sel = parse_selector("span[data-hook=\"review-body\"]")?;
        let title_sel = parse_selector("a[data-hook=\"review-title\"]")?;
        let rating_sel = parse_selector("i[data-hook=\"review-star-rating\"] span.a-icon-alt")?;
        let date_sel = parse_selector("span[data-hook=\"review-date\"]")?;
        let verified_sel = parse_selector(
            "span[data-hook=\"avp-badge\"], span[data-hook=\"avp-badge-linkless\"]",
        )?;

        let mut blocks: Vec<ElementRef<'_>> = document.select(&primary).collect();
        if blocks.is_empty() {
            blocks = document.select(&fallback).collect();
        }

        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            let text = first_text(&block, &collapsed_sel)
                .or_else(|| first_text(&block, &body_sel));
            // "4.0 out of 5 stars" -> "4.0"
            let rating = first_text(&block, &rating_sel)
                .and_then(|t| t.split_whitespace().next().map(str::to_string));
            // "Reviewed in India on 21 August 2025" -> "21 August 2025"
            let date = first_text(&block, &date_sel)
                .map(|t| t.rsplit(" on ").next().unwrap_or(&t).trim().to_string());
            let verified = block.select(&verified_sel).next().is_some();

            out.push(RawReview {
                reviewer_name: first_text(&block, &reviewer_sel),
                rating,
                title: first_text(&block, &title_sel),
                review_text: text,
                location: None,
                date,
                verified: Some(verified),
            });
        }
        Ok(out)
    }
}

/// Flipkart-style review markup (class-based `div.col-12-12` blocks).
#[derive(Debug, Clone, Copy)]
pub struct FlipkartAdapter;

impl ReviewPageAdapter for FlipkartAdapter {
    fn marketplace(&self) -> &'static str {
        "flipkart"
    }

    fn review_page_url(&self, pid: &str, page: usize) -> String {
        format!(
            "https://www.flipkart.com/product-reviews/{pid}?pid={pid}&marketplace=FLIPKART&page={page}"
        )
    }

    fn parse_reviews(&self, html: &str) -> Result<Vec<RawReview>, AdapterError> {
        let document = Html::parse_document(html);
        let block_sel = parse_selector("div.col-12-12")?;
        let title_sel = parse_selector("p.z9E0IG")?;
        let text_sel = parse_selector("div.ZmyHeo")?;
        let reviewer_sel = parse_selector("p._2NsDsF.AwS1CA")?;
        let location_sel = parse_selector("p.MztJPv")?;
        let rating_sel = parse_selector("div.XQDdHH.Ga3i8K")?;
        let date_sel = parse_selector("p._2NsDsF")?;

        let mut out = Vec::new();
        for block in document.select(&block_sel) {
            let reviewer = first_text(&block, &reviewer_sel);
            // The reviewer element shares the date element's class; the date
            // is the first sibling that is not the reviewer.
            let date = block
                .select(&date_sel)
                .filter_map(|n| text_or_none(n.text().collect::<String>()))
                .find(|t| Some(t) != reviewer.as_ref());

            out.push(RawReview {
                reviewer_name: reviewer,
                rating: first_text(&block, &rating_sel),
                title: first_text(&block, &title_sel),
                review_text: first_text(&block, &text_sel),
                location: first_text(&block, &location_sel),
                date,
                verified: Some(true),
            });
        }
        Ok(out)
    }
}
