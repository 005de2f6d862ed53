//! HTTP control endpoints for the hosted deployment.
//!
//! - `GET|POST /trigger` runs the full scan-and-deliver cycle and reports
//!   how many new launches went out.
//! - `GET /status` reports the roster size, the next scheduled run and the
//!   number of articles delivered so far.
//! - `GET /` is a small HTML control panel linking the other endpoints.
//! - `GET /logs` shows the tail of the current log file.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::context::AppContext;
use crate::error::{DedupError, RunError};
use crate::fetcher::Fetch;
use crate::models::SentArticleRecord;
use crate::logs;
use crate::outputs::DigestSink;
use crate::utils::escape_html;

const RECENT_LIMIT: i64 = 10;
const LOG_TAIL_LINES: usize = 50;

const DASHBOARD_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 40px; background-color: #f5f5f5; }
    .container { max-width: 800px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
    .button { background-color: #3498db; color: white; padding: 15px 30px; border-radius: 5px; font-size: 16px; margin: 10px; text-decoration: none; display: inline-block; }
    .button:hover { background-color: #2980b9; }
    .status { padding: 20px; background-color: #ecf0f1; border-radius: 5px; margin: 20px 0; }
    h1 { color: #2c3e50; text-align: center; }
    .info { background-color: #d5e8f5; padding: 15px; border-radius: 5px; margin: 10px 0; }
"#;

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub status: String,
    pub message: String,
    pub articles_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub sources_count: usize,
    pub next_scheduled_run: String,
    pub sent_total: i64,
    /// Latest deliveries, newest first.
    pub recent: Vec<SentArticleRecord>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

/// Any failure behind an endpoint; rendered as a 500 with a JSON body.
#[derive(Debug)]
pub struct ApiError(String);

impl From<RunError> for ApiError {
    fn from(e: RunError) -> Self {
        ApiError(format!("Scraping failed: {e}"))
    }
}

impl From<DedupError> for ApiError {
    fn from(e: DedupError) -> Self {
        ApiError(format!("Store unavailable: {e}"))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError(format!("Could not read logs: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(message = %self.0, "Request failed");
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.0,
            timestamp: timestamp(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

fn timestamp() -> String {
    Local::now().to_rfc3339()
}

async fn trigger<F, S>(
    State(ctx): State<Arc<AppContext<F, S>>>,
) -> Result<Json<TriggerResponse>, ApiError>
where
    F: Fetch + 'static,
    S: DigestSink + 'static,
{
    info!("Manual trigger");
    let found = ctx.run_once().await?;
    Ok(Json(TriggerResponse {
        status: "success".to_string(),
        message: format!("Manual scrape completed. Found {found} new articles."),
        articles_count: found,
        timestamp: timestamp(),
    }))
}

async fn status<F, S>(
    State(ctx): State<Arc<AppContext<F, S>>>,
) -> Result<Json<StatusResponse>, ApiError>
where
    F: Fetch + 'static,
    S: DigestSink + 'static,
{
    let store = ctx.pipeline.store();
    let sent_total = store.sent_count().await?;
    let recent = store.recent(RECENT_LIMIT).await?;
    Ok(Json(StatusResponse {
        status: "running".to_string(),
        sources_count: ctx.pipeline.sources().len(),
        next_scheduled_run: ctx.next_run().to_rfc3339(),
        sent_total,
        recent,
        timestamp: timestamp(),
    }))
}

async fn dashboard<F, S>(State(ctx): State<Arc<AppContext<F, S>>>) -> Html<String>
where
    F: Fetch + 'static,
    S: DigestSink + 'static,
{
    let sources_count = ctx.pipeline.sources().len();
    let schedule_at = ctx.schedule_at.format("%H:%M");
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>African Startup Scraper Dashboard</title>
<style>{DASHBOARD_STYLE}</style>
</head>
<body>
<div class="container">
  <h1>🚀 African Startup Scraper Dashboard</h1>
  <div class="info">
    <h3>Control Panel</h3>
    <p>Trigger a scrape by hand or check on the automated schedule.</p>
  </div>
  <div class="status">
    <h3>Quick Actions</h3>
    <a href="/trigger" class="button">🔄 Trigger Manual Scrape &amp; Send</a>
    <a href="/status" class="button">📊 Check Status</a>
    <a href="/logs" class="button">📝 View Recent Logs</a>
  </div>
  <div class="info">
    <h3>Scheduled Operation</h3>
    <p>✅ Automatic daily digest at {schedule_at}</p>
    <p>🔍 Monitoring {sources_count} African startup news sources</p>
  </div>
</div>
</body>
</html>
"#
    ))
}

async fn recent_logs<F, S>(
    State(ctx): State<Arc<AppContext<F, S>>>,
) -> Result<Html<String>, ApiError>
where
    F: Fetch + 'static,
    S: DigestSink + 'static,
{
    let lines = logs::tail(&ctx.log_dir, LOG_TAIL_LINES).await?;
    if lines.is_empty() {
        return Ok(Html("No logs available".to_string()));
    }
    let body = lines
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Html(format!("<pre>{body}</pre>")))
}

pub fn router<F, S>(ctx: Arc<AppContext<F, S>>) -> Router
where
    F: Fetch + 'static,
    S: DigestSink + 'static,
{
    Router::new()
        .route("/trigger", get(trigger::<F, S>).post(trigger::<F, S>))
        .route("/", get(dashboard::<F, S>))
        .route("/status", get(status::<F, S>))
        .route("/logs", get(recent_logs::<F, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
