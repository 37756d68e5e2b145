//! Axum JSON boundary for the dashboard: ingest, stats, issues, quality.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use crit_core::RawReview;
use crit_pipeline::{
    data_quality_report, ingest_reviews, product_stats, ScoreMode, SentimentAnalyzer,
};
use crit_storage::{ReviewStore, StoreError};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

pub const CRATE_NAME: &str = "crit-web";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReviewStore>,
    pub analyzer: Arc<SentimentAnalyzer>,
    pub fallback_avg_rating: f64,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        analyzer: Arc<SentimentAnalyzer>,
        fallback_avg_rating: f64,
    ) -> Self {
        Self {
            store,
            analyzer,
            fallback_avg_rating,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(product_list_handler).post(ingest_handler))
        .route("/api/products/{pid}/dashboard", get(dashboard_handler))
        .route("/api/products/{pid}/issues", get(issues_handler))
        .route("/api/products/{pid}/quality", get(quality_handler))
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "dashboard API listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::ProductNotFound => json_error(StatusCode::NOT_FOUND, "Product not found"),
        other => {
            error!(error = %other, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn internal_error(err: anyhow::Error) -> Response {
    match err.downcast::<StoreError>() {
        Ok(store_err) => store_error_response(store_err),
        Err(other) => {
            error!(error = %other, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ProductRow {
    pid: String,
    name: String,
}

async fn product_list_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_products().await {
        Ok(products) => {
            let rows: Vec<ProductRow> = products
                .into_iter()
                .map(|p| ProductRow {
                    pid: p.pid,
                    name: p.name,
                })
                .collect();
            Json(serde_json::json!({ "products": rows })).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IngestRequest {
    #[serde(default)]
    pid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    reviews: Vec<RawReview>,
}

async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Response {
    if request.pid.trim().is_empty() || request.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "pid and name are required");
    }

    let existed = state.store.product_by_pid(&request.pid).await.is_ok();
    let (product, summary) = match ingest_reviews(
        state.store.as_ref(),
        request.pid.trim(),
        request.name.trim(),
        &request.reviews,
    )
    .await
    {
        Ok(result) => result,
        Err(err) => return internal_error(err),
    };

    let scored = match state
        .analyzer
        .score_product(state.store.as_ref(), &product, ScoreMode::MissingOnly)
        .await
    {
        Ok(scored) => scored,
        Err(err) => return internal_error(err),
    };

    Json(serde_json::json!({
        "message": if existed { "Product already existed" } else { "Product added successfully" },
        "product": { "pid": product.pid, "name": product.name },
        "saved": summary.saved,
        "rejected": summary.rejected,
        "duplicates": summary.duplicates,
        "sentiment_analyzed": scored.scored,
    }))
    .into_response()
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(pid): AxumPath<String>,
) -> Response {
    let product = match state.store.product_by_pid(&pid).await {
        Ok(product) => product,
        Err(err) => return store_error_response(err),
    };
    match product_stats(state.store.as_ref(), &product, state.fallback_avg_rating).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn issues_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(pid): AxumPath<String>,
) -> Response {
    let product = match state.store.product_by_pid(&pid).await {
        Ok(product) => product,
        Err(err) => return store_error_response(err),
    };
    match state.store.issues_for_product(product.id).await {
        Ok(issues) => Json(serde_json::json!({
            "product": { "pid": product.pid, "name": product.name },
            "issues": issues,
        }))
        .into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn quality_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(pid): AxumPath<String>,
) -> Response {
    let product = match state.store.product_by_pid(&pid).await {
        Ok(product) => product,
        Err(err) => return store_error_response(err),
    };
    match data_quality_report(state.store.as_ref(), &product).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => internal_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use crit_pipeline::LexiconSentimentModel;
    use crit_storage::MemoryStore;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SentimentAnalyzer::new(
                Arc::new(LexiconSentimentModel::default()),
                Duration::from_secs(5),
            )),
            2.4,
        )
    }

    fn ingest_body() -> String {
        serde_json::json!({
            "pid": "P1",
            "name": "Steel Trimmer",
            "reviews": [
                {
                    "reviewer_name": "asha",
                    "rating": "2.0",
                    "review_text": "Terrible product. Waste of money.",
                    "date": "21 August 2025"
                },
                {
                    "reviewer_name": "vik",
                    "rating": "5.0",
                    "review_text": "Excellent trimmer. Love it."
                },
                {
                    "reviewer_name": "tiny",
                    "rating": "4.0",
                    "review_text": "bad"
                }
            ]
        })
        .to_string()
    }

    async fn json_of(resp: Response) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn ingest_then_dashboard_round_trip() {
        let app = app(test_state());

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(ingest_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_of(resp).await;
        assert_eq!(body["message"], "Product added successfully");
        assert_eq!(body["saved"], 2);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["sentiment_analyzed"], 2);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/products/P1/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_of(resp).await;
        assert_eq!(body["total_reviews"], 2);
        assert_eq!(body["avg_rating"], 3.5);
        assert!(body["sentiment_counts"].is_array());
        assert_eq!(body["recent_reviews"][0]["reviewer"], "Vik");
        assert_eq!(body["recent_reviews"][1]["review_date"], "Aug 21, 2025");
    }

    #[tokio::test]
    async fn unknown_product_is_a_distinct_404() {
        let app = app(test_state());
        for uri in [
            "/api/products/NOPE/dashboard",
            "/api/products/NOPE/issues",
            "/api/products/NOPE/quality",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            let body = json_of(resp).await;
            assert_eq!(body["error"], "Product not found");
        }
    }

    #[tokio::test]
    async fn ingest_requires_pid_and_name() {
        let app = app(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"pid": "", "name": "x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeat_ingest_reports_existing_product() {
        let app = app(test_state());
        for expected in ["Product added successfully", "Product already existed"] {
            let resp = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/products")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(r#"{"pid": "P9", "name": "Kettle", "reviews": []}"#))
                        .unwrap(),
                )
                .await
                .unwrap();
            let body = json_of(resp).await;
            assert_eq!(body["message"], expected);
        }
    }

    #[tokio::test]
    async fn product_list_shape() {
        let app = app(test_state());
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"pid": "P2", "name": "Kettle", "reviews": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_of(resp).await;
        assert_eq!(body["products"][0]["pid"], "P2");
        assert_eq!(body["products"][0]["name"], "Kettle");
    }
}
