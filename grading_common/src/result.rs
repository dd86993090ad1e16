//! The immutable grading record handed to collaborators.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bands::Grade;
use crate::config::{ScoringParams, Thresholds};
use crate::grade::FinalGrade;
use crate::scoring::RegionReport;

/// Echo of the scoring parameters actually used, with an embedded
/// description of the formula and brightness source for auditability.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringParamsReport {
    pub w_reject: f64,
    pub w_grade_d: f64,
    pub w_grade_c: f64,
    pub brightness_weight: f64,
    pub brightness_source: &'static str,
    pub formula: &'static str,
}

impl ScoringParamsReport {
    pub fn new(params: &ScoringParams) -> Self {
        Self {
            w_reject: params.w_reject,
            w_grade_d: params.w_grade_d,
            w_grade_c: params.w_grade_c,
            brightness_weight: params.brightness_weight,
            brightness_source: "grayscale_mean_on_object_mask",
            formula: "ppb = w_reject*px_reject + w_grade_d*px_grade_d + w_grade_c*px_grade_c (optional * brightness factor)",
        }
    }
}

/// Aggregates for one grade tier: the band's claimed pixel total plus the
/// objects whose worst band is this tier, in detection order.
#[derive(Debug, Clone, Serialize)]
pub struct GradeSummary {
    pub total_pixels: u64,
    pub total_objects: usize,
    pub objects: Vec<RegionReport>,
}

/// Complete result of grading one image. Created once per invocation and
/// immutable thereafter; serializes to the nested record collaborators
/// persist.
#[derive(Debug, Clone, Serialize)]
pub struct GradingResult {
    pub final_grade: FinalGrade,
    pub total_area_pixels: u64,
    pub total_area_percentage: f64,
    pub total_objects: u32,
    pub ppb_total: u64,
    pub ppb_scoring_params: ScoringParamsReport,
    pub summary_by_grade: BTreeMap<Grade, GradeSummary>,
    pub thresholds: Thresholds,
}
