//! Grading configuration: band thresholds, ppb scoring weights and the
//! region area floor.
//!
//! Defaults are compiled-in calibration constants. Callers override them
//! explicitly per invocation; there is no ambient global state.

use serde::Serialize;

use crate::error::GradeError;

/// Components below this pixel count are not reported as objects.
pub const DEFAULT_MIN_REGION_AREA: u32 = 80;

/// Band thresholds over the severity map, strictly increasing, each in
/// `[0, 255]`. They cut the three bands `[0,t1]`, `[t1+1,t2]`, `[t2+1,t3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub t1: u8,
    pub t2: u8,
    pub t3: u8,
}

impl Thresholds {
    /// Validate caller-supplied thresholds. Runs before any pixel work.
    pub fn new(t1: i64, t2: i64, t3: i64) -> Result<Self, GradeError> {
        for (name, value) in [("t1", t1), ("t2", t2), ("t3", t3)] {
            if !(0..=255).contains(&value) {
                return Err(GradeError::InvalidThreshold(format!(
                    "{name} must be in range 0-255, got {value}"
                )));
            }
        }
        if !(t1 < t2 && t2 < t3) {
            return Err(GradeError::InvalidThreshold(
                "thresholds must be strictly increasing (t1 < t2 < t3)".into(),
            ));
        }
        Ok(Self {
            t1: t1 as u8,
            t2: t2 as u8,
            t3: t3 as u8,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            t1: 150,
            t2: 160,
            t3: 168,
        }
    }
}

/// Weights of the ppb estimate. The defaults are the linear solution for
/// three lab reference samples; the exact solution makes the GRADE C
/// coefficient negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringParams {
    pub w_reject: f64,
    pub w_grade_d: f64,
    pub w_grade_c: f64,
    /// Multiplier on the mean-brightness factor; 0 disables it.
    pub brightness_weight: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            w_reject: 0.00394745,
            w_grade_d: 0.00615017,
            w_grade_c: -0.00570708,
            brightness_weight: 4.27290,
        }
    }
}

/// Caller-supplied weight overrides; `None` keeps the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringOverrides {
    pub w_reject: Option<f64>,
    pub w_grade_d: Option<f64>,
    pub w_grade_c: Option<f64>,
    pub brightness_weight: Option<f64>,
}

impl ScoringParams {
    /// Merge overrides into a new parameter set. A non-finite or negative
    /// override is ignored and the prior value kept; scoring is best-effort
    /// and must not fail the whole request over a bad weight.
    pub fn apply_overrides(&self, overrides: &ScoringOverrides) -> Self {
        Self {
            w_reject: merge("w_reject", self.w_reject, overrides.w_reject),
            w_grade_d: merge("w_grade_d", self.w_grade_d, overrides.w_grade_d),
            w_grade_c: merge("w_grade_c", self.w_grade_c, overrides.w_grade_c),
            brightness_weight: merge(
                "brightness_weight",
                self.brightness_weight,
                overrides.brightness_weight,
            ),
        }
    }
}

fn merge(name: &str, current: f64, candidate: Option<f64>) -> f64 {
    let Some(value) = candidate else {
        return current;
    };
    if !value.is_finite() || value < 0.0 {
        log::warn!("ignoring scoring override {name}={value}, keeping {current}");
        return current;
    }
    value
}

/// Everything one grading invocation needs, passed explicitly per call.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    pub thresholds: Thresholds,
    pub scoring: ScoringParams,
    pub min_region_area: u32,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            scoring: ScoringParams::default(),
            min_region_area: DEFAULT_MIN_REGION_AREA,
        }
    }
}
