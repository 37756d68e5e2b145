//! Environment-driven pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub rules_dir: PathBuf,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub classify_timeout_secs: u64,
    pub fallback_avg_rating: f64,
    pub web_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("CRIT_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./crit.db")),
            artifacts_dir: std::env::var("CRIT_ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./artifacts")),
            reports_dir: std::env::var("CRIT_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./reports")),
            rules_dir: std::env::var("CRIT_RULES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./rules")),
            user_agent: std::env::var("CRIT_USER_AGENT")
                .unwrap_or_else(|_| "crit-bot/0.1".to_string()),
            http_timeout_secs: std::env::var("CRIT_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            classify_timeout_secs: std::env::var("CRIT_CLASSIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            // The dashboard's historical fallback when no rating parses.
            fallback_avg_rating: std::env::var("CRIT_FALLBACK_AVG_RATING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2.4),
            web_port: std::env::var("CRIT_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }
}
