//! The grading pipeline: severity transform, band classification, region
//! extraction, object scoring and final grade resolution.
//!
//! One invocation is a pure, single-threaded computation over one image.
//! All intermediate buffers are scoped to the call, so concurrent
//! invocations need no locking.

use std::collections::BTreeMap;
use std::path::Path;

use image::{GrayImage, Rgb, RgbImage};

use crate::bands::{classify, Band, Grade};
use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::grade::{area_percentage, resolve};
use crate::regions::extract;
use crate::result::{GradeSummary, GradingResult, ScoringParamsReport};
use crate::scoring::{round_ppb, score_region};
use crate::severity::{brightness_plane, severity_map, smooth};

/// One exclusive band mask with its display color, exposed so collaborators
/// can reproduce the annotated raster.
pub struct BandLayer {
    pub grade: Grade,
    pub color: Rgb<u8>,
    pub mask: GrayImage,
}

/// The grading record plus the band masks it was derived from.
pub struct GradingOutcome {
    pub result: GradingResult,
    /// Exclusive masks in severity order, worst band first.
    pub band_layers: Vec<BandLayer>,
}

/// Decode an image from disk for grading.
pub fn open_image(path: &Path) -> Result<RgbImage, GradeError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|_| GradeError::ImageNotFound(path.display().to_string()))
}

/// Grade one image. Deterministic and side-effect free: the same image and
/// configuration always produce the same result.
pub fn grade_image(image: &RgbImage, config: &GradingConfig) -> GradingOutcome {
    let smoothed = smooth(image);
    let severity = severity_map(&smoothed);
    let brightness = brightness_plane(&smoothed);

    let bands = Band::from_thresholds(&config.thresholds);
    let classification = classify(&severity, &bands, config.min_region_area);
    let regions = extract(&classification.union, config.min_region_area);

    let mut summaries: BTreeMap<Grade, GradeSummary> = classification
        .bands
        .iter()
        .map(|band_mask| {
            (
                band_mask.band.grade,
                GradeSummary {
                    total_pixels: band_mask.area,
                    total_objects: 0,
                    objects: Vec::new(),
                },
            )
        })
        .collect();

    let total_objects = regions.len() as u32;
    let mut ppb_total = 0.0f64;
    for region in &regions {
        let Some((report, ppb)) =
            score_region(region, &classification, &brightness, &config.scoring)
        else {
            continue;
        };
        ppb_total += ppb;
        if let Some(summary) = summaries.get_mut(&report.grade) {
            summary.objects.push(report);
        }
    }
    for summary in summaries.values_mut() {
        summary.total_objects = summary.objects.len();
    }

    let area_of = |grade: Grade| summaries.get(&grade).map(|s| s.total_pixels).unwrap_or(0);
    let total_area_pixels: u64 = classification.bands.iter().map(|b| b.area).sum();
    let final_grade = resolve(
        area_of(Grade::Reject),
        area_of(Grade::GradeD),
        area_of(Grade::GradeC),
        total_area_pixels,
    );

    let (width, height) = image.dimensions();
    let result = GradingResult {
        final_grade,
        total_area_pixels,
        total_area_percentage: area_percentage(total_area_pixels, width, height),
        total_objects,
        ppb_total: round_ppb(ppb_total),
        ppb_scoring_params: ScoringParamsReport::new(&config.scoring),
        summary_by_grade: summaries,
        thresholds: config.thresholds,
    };

    let band_layers = classification
        .bands
        .into_iter()
        .map(|band_mask| BandLayer {
            grade: band_mask.band.grade,
            color: band_mask.band.color,
            mask: band_mask.mask,
        })
        .collect();

    GradingOutcome { result, band_layers }
}
