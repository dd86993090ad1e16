//! Best-effort persistence of grading runs to MySQL.
//!
//! Storage failures are reported to the caller as a sidecar diagnostic and
//! never invalidate an already-computed grading.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

/// One persisted grading run, as returned by the history endpoint.
#[derive(Debug, Serialize, FromRow)]
pub struct GradingRunRow {
    pub id: i64,
    pub captured_at: NaiveDateTime,
    pub final_grade: String,
    pub total_area_pixels: i64,
    pub total_area_percentage: f64,
    pub total_objects: i64,
    pub original_image_path: String,
    pub graded_image_path: String,
    pub detail_json: String,
}

/// Field set stored for one grading run.
pub struct NewGradingRun<'a> {
    pub captured_at: NaiveDateTime,
    pub final_grade: &'a str,
    pub total_area_pixels: i64,
    pub total_area_percentage: f64,
    pub total_objects: i64,
    pub reject_total_pixels: i64,
    pub reject_total_objects: i64,
    pub grade_d_total_pixels: i64,
    pub grade_d_total_objects: i64,
    pub grade_c_total_pixels: i64,
    pub grade_c_total_objects: i64,
    pub original_image_path: &'a str,
    pub graded_image_path: &'a str,
    pub detail_json: String,
}

impl Database {
    /// Configure the pool without touching the network; connections are
    /// established on first use so the server starts with the database
    /// down.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_lazy(database_url)
            .context("Invalid database URL")?;

        info!("Database pool configured");
        Ok(Self { pool })
    }

    pub async fn insert_grading_run(&self, run: &NewGradingRun<'_>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO grading_runs (
                captured_at,
                final_grade,
                total_area_pixels,
                total_area_percentage,
                total_objects,
                reject_total_pixels,
                reject_total_objects,
                grade_d_total_pixels,
                grade_d_total_objects,
                grade_c_total_pixels,
                grade_c_total_objects,
                original_image_path,
                graded_image_path,
                detail_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.captured_at)
        .bind(run.final_grade)
        .bind(run.total_area_pixels)
        .bind(run.total_area_percentage)
        .bind(run.total_objects)
        .bind(run.reject_total_pixels)
        .bind(run.reject_total_objects)
        .bind(run.grade_d_total_pixels)
        .bind(run.grade_d_total_objects)
        .bind(run.grade_c_total_pixels)
        .bind(run.grade_c_total_objects)
        .bind(run.original_image_path)
        .bind(run.graded_image_path)
        .bind(&run.detail_json)
        .execute(&self.pool)
        .await
        .context("Failed to insert grading run")?;

        Ok(result.last_insert_id())
    }

    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<GradingRunRow>> {
        let limit = limit.clamp(1, 200);
        let rows = sqlx::query_as::<_, GradingRunRow>(
            r#"
            SELECT
                id,
                captured_at,
                final_grade,
                total_area_pixels,
                total_area_percentage,
                total_objects,
                original_image_path,
                graded_image_path,
                detail_json
            FROM grading_runs
            ORDER BY captured_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch grading history")?;

        Ok(rows)
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }
}
