use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::ingest::config::AggregatorSettings;
use crate::ingest::{AggregationResult, Aggregator};
use crate::rank::RankedVideo;
use crate::record::{Platform, VideoRecord};
use crate::sink::{list_saved, load_saved, LoadError, ResultSink};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub sink: Option<Arc<dyn ResultSink>>,
    /// Directory browsed by `/api/data/*`; usually the file sink's directory.
    pub data_dir: Option<PathBuf>,
    pub settings: AggregatorSettings,
}

impl AppState {
    pub fn new(aggregator: Aggregator, settings: AggregatorSettings) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            sink: None,
            data_dir: None,
            settings,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>, data_dir: PathBuf) -> Self {
        self.sink = Some(sink);
        self.data_dir = Some(data_dir);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/health", get(health))
        .route("/api/scrape/tiktok", post(scrape_tiktok))
        .route("/api/scrape/youtube", post(scrape_youtube))
        .route("/api/scrape/combined", post(scrape_combined))
        .route("/top_5.json", get(top_five))
        .route("/api/data/files", get(data_files))
        .route("/api/data/{filename}", get(data_file))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct CombinedReq {
    #[serde(default)]
    hashtag: Option<String>,
}

#[derive(Serialize)]
struct CombinedSummary {
    total_videos: usize,
    tiktok_count: usize,
    youtube_count: usize,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct CombinedResp {
    success: bool,
    message: String,
    data: AggregationResult,
    filename: Option<String>,
    summary: CombinedSummary,
}

fn pick_topic(requested: Option<&str>, default: &str) -> String {
    requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

async fn scrape_combined(
    State(state): State<AppState>,
    body: Option<Json<CombinedReq>>,
) -> Json<CombinedResp> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let topic = pick_topic(req.hashtag.as_deref(), &state.settings.combined_topic);

    let result = state.aggregator.aggregate(&topic).await;

    let filename = match &state.sink {
        Some(sink) => match sink.store(&result).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(target: "api", error = ?e, "failed to persist combined result");
                None
            }
        },
        None => None,
    };

    let tiktok_count = result.count_for(Platform::TikTok);
    let youtube_count = result.count_for(Platform::YouTube);
    Json(CombinedResp {
        success: true,
        message: format!(
            "Combined scraping complete: {tiktok_count} TikTok + {youtube_count} YouTube videos"
        ),
        summary: CombinedSummary {
            total_videos: result.combined.len(),
            tiktok_count,
            youtube_count,
            errors: result.errors.clone(),
        },
        filename,
        data: result,
    })
}

#[derive(Serialize)]
struct SourceResp {
    success: bool,
    message: String,
    data: Vec<VideoRecord>,
    filename: Option<String>,
}

async fn scrape_tiktok(
    State(state): State<AppState>,
    body: Option<Json<CombinedReq>>,
) -> Response {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let topic = pick_topic(req.hashtag.as_deref(), &state.settings.combined_topic);
    scrape_one(&state, Platform::TikTok, &topic).await
}

async fn scrape_youtube(State(state): State<AppState>) -> Response {
    let topic = state.settings.default_topic.clone();
    scrape_one(&state, Platform::YouTube, &topic).await
}

/// Single-platform scrape: no fallback, failures surface as 500.
async fn scrape_one(state: &AppState, platform: Platform, topic: &str) -> Response {
    let now = Utc::now();
    let records = match state.aggregator.fetch_source(platform, topic, now).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(target: "api", source = %platform, error = ?e, "single source scrape failed");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to scrape {platform} data"),
                Some(&e),
            );
        }
    };

    let filename = match &state.sink {
        Some(sink) => match sink.store_source(platform, topic, &records, now).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(target: "api", source = %platform, error = ?e, "failed to persist single source scrape");
                None
            }
        },
        None => None,
    };

    let message = match platform {
        Platform::TikTok => format!(
            "Successfully scraped {} TikTok videos for #{topic}",
            records.len()
        ),
        Platform::YouTube => format!("Successfully scraped {} YouTube Shorts", records.len()),
    };
    Json(SourceResp {
        success: true,
        message,
        data: records,
        filename,
    })
    .into_response()
}

#[derive(Serialize)]
struct SourceCounts {
    tiktok_count: usize,
    youtube_count: usize,
}

#[derive(Serialize)]
struct TopResp {
    timestamp: DateTime<Utc>,
    hashtag: String,
    total_videos: usize,
    top_5: Vec<RankedVideo>,
    sources: SourceCounts,
    errors: Vec<String>,
}

async fn top_five(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<TopResp> {
    let topic = pick_topic(
        q.get("hashtag").map(String::as_str),
        &state.settings.default_topic,
    );
    let result = state.aggregator.aggregate(&topic).await;

    Json(TopResp {
        timestamp: result.generated_at,
        hashtag: topic,
        total_videos: result.combined.len(),
        top_5: result.top(state.settings.top_n).to_vec(),
        sources: SourceCounts {
            tiktok_count: result.count_for(Platform::TikTok),
            youtube_count: result.count_for(Platform::YouTube),
        },
        errors: result.errors,
    })
}

fn failure(status: StatusCode, message: &str, err: Option<&anyhow::Error>) -> Response {
    let mut body = json!({ "success": false, "message": message });
    if let Some(e) = err {
        body["error"] = json!(format!("{e:#}"));
    }
    (status, Json(body)).into_response()
}

async fn data_files(State(state): State<AppState>) -> Response {
    let Some(dir) = state.data_dir.as_deref() else {
        return Json(json!({ "success": true, "files": [] })).into_response();
    };
    match list_saved(dir) {
        Ok(files) => Json(json!({ "success": true, "files": files })).into_response(),
        Err(e) => {
            tracing::warn!(target: "api", error = ?e, "failed to list data files");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read data files",
                Some(&e),
            )
        }
    }
}

async fn data_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let Some(dir) = state.data_dir.as_deref() else {
        return failure(StatusCode::NOT_FOUND, "File not found", None);
    };
    match load_saved(dir, &filename) {
        Ok(Some(data)) => Json(json!({ "success": true, "data": data })).into_response(),
        Ok(None) => failure(StatusCode::NOT_FOUND, "File not found", None),
        Err(LoadError::InvalidName) => failure(StatusCode::BAD_REQUEST, "Invalid file name", None),
        Err(LoadError::Io(e)) => {
            tracing::warn!(target: "api", file = %filename, error = ?e, "failed to read data file");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read data file",
                Some(&e),
            )
        }
    }
}
