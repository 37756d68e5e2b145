use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crit_adapters::{adapter_for_marketplace, fetch_review_pages, load_raw_reviews};
use crit_core::{IssueStrategy, Product};
use crit_pipeline::{
    clean_all, ingest_reviews, load_lexicon_rules, load_topic_rules, product_stats,
    summarize_product, write_issue_reports, AppConfig, ExtractOptions, IssueExtractor,
    KeywordTopicModel, LeadSentenceSummarizer, LexiconSentimentModel, ScoreMode,
    SentimentAnalyzer,
};
use crit_storage::{ArtifactStore, PageFetcher, ReviewStore, SqliteStore, StoreError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "crit")]
#[command(about = "Customer review insight toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Topics,
    Frequency,
}

impl From<StrategyArg> for IssueStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Topics => IssueStrategy::Topics,
            StrategyArg::Frequency => IssueStrategy::Frequency,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest raw reviews for a product from a JSON file.
    Ingest {
        #[arg(long)]
        pid: String,
        #[arg(long)]
        name: String,
        /// JSON array of raw review records.
        #[arg(long)]
        input: PathBuf,
    },
    /// Scrape a marketplace's review pages (or parse a saved page) and
    /// ingest the result.
    Scrape {
        #[arg(long)]
        pid: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "flipkart")]
        marketplace: String,
        #[arg(long, default_value_t = 4)]
        max_pages: usize,
        /// Parse a saved HTML page instead of fetching.
        #[arg(long)]
        page: Option<PathBuf>,
    },
    /// Score sentiment for one product's reviews, or for every product.
    Sentiment {
        #[arg(long)]
        pid: Option<String>,
        #[arg(long)]
        all: bool,
        /// Overwrite existing labels instead of only filling gaps.
        #[arg(long)]
        rescore: bool,
    },
    /// Extract critical issues and write the run report.
    Issues {
        #[arg(long)]
        pid: Option<String>,
        /// Case-insensitive product name filter.
        #[arg(long)]
        product_name: Option<String>,
        /// Analyze reviews rated at or below this value (topic strategy).
        #[arg(long, default_value_t = 3.0)]
        min_rating: f64,
        #[arg(long, value_enum, default_value_t = StrategyArg::Topics)]
        strategy: StrategyArg,
        #[arg(long)]
        no_report: bool,
    },
    /// Clean and normalize every stored review.
    Clean,
    /// Print dashboard statistics for one product.
    Stats {
        #[arg(long)]
        pid: String,
    },
    /// Print a digest of one product's review corpus.
    Summarize {
        #[arg(long)]
        pid: String,
    },
    /// Serve the dashboard API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn report_not_found(err: StoreError) -> ! {
    match err {
        StoreError::ProductNotFound => eprintln!("Product not found."),
        other => eprintln!("store error: {other}"),
    }
    std::process::exit(1);
}

async fn resolve_product(
    store: &dyn ReviewStore,
    pid: Option<&str>,
    name: Option<&str>,
) -> Result<Option<Product>> {
    match (pid, name) {
        (Some(pid), _) => match store.product_by_pid(pid).await {
            Ok(product) => Ok(Some(product)),
            Err(err) => report_not_found(err),
        },
        (None, Some(name)) => match store.product_by_name(name).await {
            Ok(product) => Ok(Some(product)),
            Err(err) => report_not_found(err),
        },
        (None, None) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let store = SqliteStore::connect(&config.database_path)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    match cli.command {
        Commands::Ingest { pid, name, input } => {
            let raws = load_raw_reviews(&input)?;
            let (product, summary) = ingest_reviews(&store, &pid, &name, &raws).await?;
            println!(
                "ingest complete: product={} saved={} rejected={} duplicates={}",
                product.pid, summary.saved, summary.rejected, summary.duplicates
            );
        }
        Commands::Scrape {
            pid,
            name,
            marketplace,
            max_pages,
            page,
        } => {
            let Some(adapter) = adapter_for_marketplace(&marketplace) else {
                eprintln!("no adapter registered for marketplace '{marketplace}'");
                std::process::exit(1);
            };
            let raws = match page {
                Some(path) => {
                    let html = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    adapter.parse_reviews(&html)?
                }
                None => {
                    let fetcher = PageFetcher::new(
                        Duration::from_secs(config.http_timeout_secs),
                        &config.user_agent,
                    )?;
                    let artifacts = ArtifactStore::new(config.artifacts_dir.clone());
                    fetch_review_pages(adapter.as_ref(), &fetcher, &artifacts, &pid, max_pages)
                        .await?
                }
            };
            let (product, summary) = ingest_reviews(&store, &pid, &name, &raws).await?;
            println!(
                "scrape complete: product={} fetched={} saved={} rejected={} duplicates={}",
                product.pid,
                raws.len(),
                summary.saved,
                summary.rejected,
                summary.duplicates
            );
        }
        Commands::Sentiment { pid, all, rescore } => {
            let lexicon = load_lexicon_rules(&config.rules_dir)
                .context("loading sentiment lexicon; aborting before any scoring")?;
            let analyzer = SentimentAnalyzer::new(
                Arc::new(LexiconSentimentModel::new(&lexicon)),
                config.classify_timeout(),
            );
            let mode = if rescore {
                ScoreMode::All
            } else {
                ScoreMode::MissingOnly
            };
            let products = if all {
                store.list_products().await?
            } else {
                match resolve_product(&store, pid.as_deref(), None).await? {
                    Some(product) => vec![product],
                    None => {
                        eprintln!("pass --pid or --all");
                        std::process::exit(1);
                    }
                }
            };
            for product in products {
                let summary = analyzer.score_product(&store, &product, mode).await?;
                println!(
                    "sentiment complete: product={} scored={} skipped={} failed={}",
                    product.pid, summary.scored, summary.skipped, summary.failed
                );
            }
        }
        Commands::Issues {
            pid,
            product_name,
            min_rating,
            strategy,
            no_report,
        } => {
            let rules = load_topic_rules(&config.rules_dir)
                .context("loading topic rules; aborting before any extraction")?;
            let extractor = IssueExtractor::new(
                Arc::new(KeywordTopicModel::new(rules.clone())),
                rules,
                config.classify_timeout(),
            );
            let options = ExtractOptions {
                strategy: strategy.into(),
                min_rating,
            };
            let products = match resolve_product(
                &store,
                pid.as_deref(),
                product_name.as_deref(),
            )
            .await?
            {
                Some(product) => vec![product],
                None => store.list_products().await?,
            };
            if products.is_empty() {
                println!("no products to analyze");
            }
            for product in products {
                let mut summary = extractor.extract(&store, &product, &options).await?;
                if !no_report {
                    let reviews = store.reviews_for_product(product.id).await?;
                    let dir =
                        write_issue_reports(&config.reports_dir, &product, &summary, &reviews)
                            .await?;
                    summary.reports_dir = Some(dir.display().to_string());
                }
                println!(
                    "issues complete: product={} analyzed={} critical={} failures={} issues={}{}",
                    product.pid,
                    summary.reviews_analyzed,
                    summary.critical_reviews,
                    summary.classification_failures,
                    summary.issues.len(),
                    summary
                        .reports_dir
                        .as_deref()
                        .map(|d| format!(" reports={d}"))
                        .unwrap_or_default()
                );
                println!("{}", summary.text_summary);
            }
        }
        Commands::Clean => {
            let summary = clean_all(&store).await?;
            println!(
                "clean complete: cleaned={} deleted={}",
                summary.cleaned, summary.deleted
            );
        }
        Commands::Stats { pid } => {
            let product = match store.product_by_pid(&pid).await {
                Ok(product) => product,
                Err(err) => report_not_found(err),
            };
            let stats = product_stats(&store, &product, config.fallback_avg_rating).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Summarize { pid } => {
            let product = match store.product_by_pid(&pid).await {
                Ok(product) => product,
                Err(err) => report_not_found(err),
            };
            let digest = summarize_product(
                &LeadSentenceSummarizer::default(),
                &store,
                &product,
                config.classify_timeout(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&digest)?);
        }
        Commands::Serve { port } => {
            let lexicon = load_lexicon_rules(&config.rules_dir)?;
            let analyzer = Arc::new(SentimentAnalyzer::new(
                Arc::new(LexiconSentimentModel::new(&lexicon)),
                config.classify_timeout(),
            ));
            let state = crit_web::AppState::new(
                Arc::new(store),
                analyzer,
                config.fallback_avg_rating,
            );
            crit_web::serve(state, port.unwrap_or(config.web_port)).await?;
        }
    }

    Ok(())
}
