//! REST surface for grading: grade an existing frame, capture-and-grade,
//! and grading history.

use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::FontVec;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{Local, NaiveDateTime};
use grading_common::{
    GradeError, Grade, GradingConfig, GradingResult, ScoringOverrides, ScoringParams, Thresholds,
    annotate,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::capture;
use crate::database::{Database, NewGradingRun};
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
    pub font: Arc<Option<FontVec>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    database: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct GradeQuery {
    /// Required for /grade; ignored by /capture.
    image_path: Option<String>,
    #[serde(default = "default_t1")]
    t1: i64,
    #[serde(default = "default_t2")]
    t2: i64,
    #[serde(default = "default_t3")]
    t3: i64,
    w_reject: Option<f64>,
    w_grade_d: Option<f64>,
    w_grade_c: Option<f64>,
    brightness_weight: Option<f64>,
}

fn default_t1() -> i64 {
    150
}

fn default_t2() -> i64 {
    160
}

fn default_t3() -> i64 {
    168
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

/// Full response for one grading run: the grading record plus the image
/// paths and the persistence outcome.
#[derive(Debug, Serialize)]
struct GradingRunResponse {
    #[serde(flatten)]
    result: GradingResult,
    original_image_path: String,
    graded_image_path: String,
    grading_run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_error: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/grade", get(grade_existing))
        .route("/api/v1/capture", get(capture_and_grade))
        .route("/api/v1/history", get(grading_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = match state.db.health_check().await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    })
}

async fn grade_existing(
    State(state): State<AppState>,
    Query(query): Query<GradeQuery>,
) -> Result<Json<GradingRunResponse>, ApiError> {
    let image_path = query
        .image_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "image_path is required"))?;

    let response = run_grading(&state, PathBuf::from(image_path), &query).await?;
    Ok(Json(response))
}

async fn capture_and_grade(
    State(state): State<AppState>,
    Query(query): Query<GradeQuery>,
) -> Result<Json<GradingRunResponse>, ApiError> {
    // Validate before triggering the camera.
    build_config(&query)?;

    let path = capture::capture_image(&state.settings.capture_bin, &state.settings.capture_dir)
        .await
        .map_err(|e| {
            error!("Capture failed: {e:#}");
            api_error(StatusCode::BAD_GATEWAY, e)
        })?;

    let response = run_grading(&state, path, &query).await?;
    Ok(Json(response))
}

async fn grading_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows = state
        .db
        .recent_runs(params.limit.unwrap_or(20))
        .await
        .map_err(|e| {
            error!("Failed to fetch history: {e:#}");
            api_error(StatusCode::SERVICE_UNAVAILABLE, e)
        })?;

    Ok(Json(serde_json::json!({ "data": rows })))
}

fn build_config(query: &GradeQuery) -> Result<GradingConfig, ApiError> {
    let thresholds = Thresholds::new(query.t1, query.t2, query.t3)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let overrides = ScoringOverrides {
        w_reject: query.w_reject,
        w_grade_d: query.w_grade_d,
        w_grade_c: query.w_grade_c,
        brightness_weight: query.brightness_weight,
    };
    Ok(GradingConfig {
        thresholds,
        scoring: ScoringParams::default().apply_overrides(&overrides),
        ..Default::default()
    })
}

async fn run_grading(
    state: &AppState,
    image_path: PathBuf,
    query: &GradeQuery,
) -> Result<GradingRunResponse, ApiError> {
    let config = build_config(query)?;

    let captured_at = Local::now().naive_local();
    let graded_path = state.settings.output_dir.join(format!(
        "graded_image_{}.jpg",
        captured_at.format("%Y-%m-%d-%H-%M-%S")
    ));
    tokio::fs::create_dir_all(&state.settings.output_dir)
        .await
        .map_err(|e| {
            error!("Could not create output directory: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;

    // Grading is CPU-bound; keep it off the runtime workers.
    let font = state.font.clone();
    let input = image_path.clone();
    let output = graded_path.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<GradingResult> {
        let image = grading_common::open_image(&input)?;
        let outcome = grading_common::grade_image(&image, &config);
        let annotated = annotate::render_annotated(&image, &outcome, font.as_ref().as_ref());
        annotated
            .save(&output)
            .with_context(|| format!("Failed to save annotated image {output:?}"))?;
        info!("Annotated image saved to {:?}", output);
        Ok(outcome.result)
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
    .map_err(|e| {
        if matches!(
            e.downcast_ref::<GradeError>(),
            Some(GradeError::ImageNotFound(_))
        ) {
            api_error(StatusCode::NOT_FOUND, e)
        } else {
            error!("Grading failed: {e:#}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    })?;

    let mut response = GradingRunResponse {
        result,
        original_image_path: image_path.display().to_string(),
        graded_image_path: graded_path.display().to_string(),
        grading_run_id: None,
        db_error: None,
    };

    // Storage failure never invalidates a computed grading.
    match persist_run(&state.db, captured_at, &response).await {
        Ok(id) => {
            info!("Grading run saved as grading_runs.id={id}");
            response.grading_run_id = Some(id);
        }
        Err(err) => {
            warn!("Failed to save grading run: {err:#}");
            response.db_error = Some(err.to_string());
        }
    }

    Ok(response)
}

async fn persist_run(
    db: &Database,
    captured_at: NaiveDateTime,
    response: &GradingRunResponse,
) -> Result<u64> {
    let result = &response.result;
    let pixels = |grade: Grade| {
        result
            .summary_by_grade
            .get(&grade)
            .map(|s| s.total_pixels as i64)
            .unwrap_or(0)
    };
    let objects = |grade: Grade| {
        result
            .summary_by_grade
            .get(&grade)
            .map(|s| s.total_objects as i64)
            .unwrap_or(0)
    };

    let detail_json = serde_json::to_string(&serde_json::json!({
        "ppb_total": result.ppb_total,
        "ppb_scoring_params": result.ppb_scoring_params,
        "summary_by_grade": result.summary_by_grade,
    }))
    .context("Failed to serialize grading detail")?;

    let run = NewGradingRun {
        captured_at,
        final_grade: result.final_grade.label(),
        total_area_pixels: result.total_area_pixels as i64,
        total_area_percentage: result.total_area_percentage,
        total_objects: result.total_objects as i64,
        reject_total_pixels: pixels(Grade::Reject),
        reject_total_objects: objects(Grade::Reject),
        grade_d_total_pixels: pixels(Grade::GradeD),
        grade_d_total_objects: objects(Grade::GradeD),
        grade_c_total_pixels: pixels(Grade::GradeC),
        grade_c_total_objects: objects(Grade::GradeC),
        original_image_path: &response.original_image_path,
        graded_image_path: &response.graded_image_path,
        detail_json,
    };
    db.insert_grading_run(&run).await
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Grading API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(t1: i64, t2: i64, t3: i64) -> GradeQuery {
        GradeQuery {
            image_path: None,
            t1,
            t2,
            t3,
            w_reject: None,
            w_grade_d: None,
            w_grade_c: None,
            brightness_weight: None,
        }
    }

    #[test]
    fn invalid_thresholds_map_to_bad_request() {
        let err = build_config(&query(160, 150, 168)).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn default_query_builds_the_default_config() {
        let config = build_config(&query(150, 160, 168)).unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.scoring, ScoringParams::default());
    }
}
