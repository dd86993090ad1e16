//! Per-region composition, brightness and ppb scoring.

use std::collections::BTreeMap;

use image::GrayImage;
use serde::Serialize;

use crate::bands::{Classification, Grade};
use crate::config::ScoringParams;
use crate::regions::{BoundingBox, RegionMask};

/// A fully scored contamination object.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub object_id: u32,
    pub grade: Grade,
    /// Classified pixels inside the region, summed over all bands present.
    pub total_pixels: u64,
    pub pixels_per_grade: BTreeMap<Grade, u64>,
    pub mean_brightness: f64,
    pub ppb: u64,
    pub bounding_box: BoundingBox,
}

/// Round a ppb estimate half-up to a non-negative integer. Non-finite and
/// non-positive values round to 0.
pub fn round_ppb(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value + 0.5).floor() as u64
}

/// Size- and brightness-based ppb estimate for one object, clamped to be
/// non-negative (the GRADE C weight can legitimately be negative).
pub fn ppb_estimate(
    pixels_reject: u64,
    pixels_grade_d: u64,
    pixels_grade_c: u64,
    mean_brightness: f64,
    params: &ScoringParams,
) -> f64 {
    let base = pixels_reject as f64 * params.w_reject
        + pixels_grade_d as f64 * params.w_grade_d
        + pixels_grade_c as f64 * params.w_grade_c;

    let score = if params.brightness_weight == 0.0 {
        base
    } else {
        let brightness_norm = (mean_brightness / 255.0).clamp(0.0, 1.0);
        base * (1.0 + params.brightness_weight * brightness_norm)
    };
    score.max(0.0)
}

/// Score one region against the exclusive band masks.
///
/// Returns the report plus the unrounded ppb contribution, so callers can
/// sum in floating point and round only the total. `None` marks a region
/// whose mask intersects no band, which cannot happen for regions extracted
/// from the union mask.
pub fn score_region(
    region: &RegionMask,
    classification: &Classification,
    brightness: &GrayImage,
    params: &ScoringParams,
) -> Option<(RegionReport, f64)> {
    let x0 = region.bbox.x;
    let y0 = region.bbox.y;
    let x1 = (x0 + region.bbox.width).min(region.mask.width());
    let y1 = (y0 + region.bbox.height).min(region.mask.height());

    let mut pixels_per_grade: BTreeMap<Grade, u64> = BTreeMap::new();
    let mut mask_pixels = 0u64;
    let mut brightness_sum = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if region.mask.get_pixel(x, y)[0] == 0 {
                continue;
            }
            mask_pixels += 1;
            brightness_sum += brightness.get_pixel(x, y)[0] as u64;
            for band in &classification.bands {
                if band.mask.get_pixel(x, y)[0] != 0 {
                    *pixels_per_grade.entry(band.band.grade).or_insert(0) += 1;
                    break;
                }
            }
        }
    }

    // The worst band present grades the whole object.
    let grade = *pixels_per_grade.keys().next()?;
    let total_pixels: u64 = pixels_per_grade.values().sum();
    let mean_brightness = if mask_pixels > 0 {
        brightness_sum as f64 / mask_pixels as f64
    } else {
        0.0
    };

    let per_grade = |g: Grade| pixels_per_grade.get(&g).copied().unwrap_or(0);
    let ppb = ppb_estimate(
        per_grade(Grade::Reject),
        per_grade(Grade::GradeD),
        per_grade(Grade::GradeC),
        mean_brightness,
        params,
    );

    let report = RegionReport {
        object_id: region.id,
        grade,
        total_pixels,
        pixels_per_grade,
        mean_brightness,
        ppb: round_ppb(ppb),
        bounding_box: region.bbox,
    };
    Some((report, ppb))
}
