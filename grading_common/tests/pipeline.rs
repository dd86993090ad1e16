//! End-to-end pipeline behavior on synthetic images and severity maps.

use ab_glyph::FontVec;
use image::{GrayImage, Luma, Rgb, RgbImage};

use grading_common::bands::{classify, Band};
use grading_common::grade::resolve;
use grading_common::regions::extract;
use grading_common::scoring::score_region;
use grading_common::{annotate, grade_image, FinalGrade, Grade, GradingConfig, Thresholds};

/// A green-dominant frame drives the index to -1, severity 0: full REJECT.
fn reject_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([0, 200, 0]))
}

/// A blue-dominant frame drives the index to +1, severity 255: no band.
fn clean_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([0, 0, 200]))
}

#[test]
fn uniform_contaminated_frame_grades_reject() {
    let image = reject_image(64, 64);
    let outcome = grade_image(&image, &GradingConfig::default());
    let result = &outcome.result;

    assert_eq!(result.final_grade, FinalGrade::Reject);
    assert_eq!(result.total_area_pixels, 64 * 64);
    assert_eq!(result.total_area_percentage, 100.0);
    assert_eq!(result.total_objects, 1);

    let reject = &result.summary_by_grade[&Grade::Reject];
    assert_eq!(reject.total_pixels, 64 * 64);
    assert_eq!(reject.total_objects, 1);

    let object = &reject.objects[0];
    assert_eq!(object.object_id, 1);
    assert_eq!(object.grade, Grade::Reject);
    assert_eq!(object.total_pixels, 64 * 64);
    assert_eq!(object.pixels_per_grade[&Grade::Reject], 64 * 64);
    assert_eq!(
        object.pixels_per_grade.values().sum::<u64>(),
        object.total_pixels
    );
    assert!(object.ppb > 0);
    // A single object carries the whole rounded total.
    assert_eq!(result.ppb_total, object.ppb);
}

#[test]
fn uniform_clean_frame_grades_clean() {
    let image = clean_image(48, 32);
    let outcome = grade_image(&image, &GradingConfig::default());
    let result = &outcome.result;

    assert_eq!(result.final_grade, FinalGrade::GradeA);
    assert_eq!(result.total_area_pixels, 0);
    assert_eq!(result.total_area_percentage, 0.0);
    assert_eq!(result.total_objects, 0);
    assert_eq!(result.ppb_total, 0);
    for summary in result.summary_by_grade.values() {
        assert_eq!(summary.total_pixels, 0);
        assert!(summary.objects.is_empty());
    }
}

#[test]
fn grading_is_idempotent() {
    let image = reject_image(32, 32);
    let config = GradingConfig::default();
    let first = serde_json::to_string(&grade_image(&image, &config).result).unwrap();
    let second = serde_json::to_string(&grade_image(&image, &config).result).unwrap();
    assert_eq!(first, second);
}

/// Run the post-smoothing stages on a hand-built severity map.
fn grade_severity_map(
    severity: &GrayImage,
    config: &GradingConfig,
) -> (FinalGrade, Vec<grading_common::RegionReport>) {
    let bands = Band::from_thresholds(&config.thresholds);
    let classification = classify(severity, &bands, config.min_region_area);
    let regions = extract(&classification.union, config.min_region_area);
    let brightness = GrayImage::from_pixel(severity.width(), severity.height(), Luma([128]));

    let reports: Vec<_> = regions
        .iter()
        .filter_map(|region| {
            score_region(region, &classification, &brightness, &config.scoring)
                .map(|(report, _)| report)
        })
        .collect();

    let area = |index: usize| classification.bands[index].area;
    let total: u64 = classification.bands.iter().map(|b| b.area).sum();
    (resolve(area(0), area(1), area(2), total), reports)
}

#[test]
fn grade_precedence_escalates_with_a_single_reject_pixel() {
    let config = GradingConfig::default();

    // A 10x10 block in the GRADE D range on a background above all bands.
    let mut severity = GrayImage::from_pixel(40, 40, Luma([255]));
    for y in 5..15 {
        for x in 5..15 {
            severity.put_pixel(x, y, Luma([155]));
        }
    }
    let (final_grade, reports) = grade_severity_map(&severity, &config);
    assert_eq!(final_grade, FinalGrade::GradeD);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].grade, Grade::GradeD);
    assert_eq!(reports[0].total_pixels, 100);

    // One pixel inside the block moved to the REJECT range escalates both
    // the object grade and the final grade.
    severity.put_pixel(7, 7, Luma([100]));
    let (final_grade, reports) = grade_severity_map(&severity, &config);
    assert_eq!(final_grade, FinalGrade::Reject);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].grade, Grade::Reject);
    assert_eq!(reports[0].pixels_per_grade[&Grade::Reject], 1);
    assert_eq!(reports[0].pixels_per_grade[&Grade::GradeD], 99);
    assert_eq!(
        reports[0].pixels_per_grade.values().sum::<u64>(),
        reports[0].total_pixels
    );
}

#[test]
fn sub_floor_components_count_toward_area_but_not_objects() {
    let config = GradingConfig::default();

    // 79 REJECT pixels in a single line: below the object floor.
    let mut severity = GrayImage::from_pixel(100, 20, Luma([255]));
    for x in 10..89 {
        severity.put_pixel(x, 5, Luma([10]));
    }

    let bands = Band::from_thresholds(&config.thresholds);
    let classification = classify(&severity, &bands, config.min_region_area);
    assert_eq!(classification.bands[0].area, 79);

    let regions = extract(&classification.union, config.min_region_area);
    assert!(regions.is_empty());

    // The band area alone still drives the final grade and percentage.
    let total: u64 = classification.bands.iter().map(|b| b.area).sum();
    assert_eq!(total, 79);
    assert_eq!(
        resolve(classification.bands[0].area, 0, 0, total),
        FinalGrade::Reject
    );
}

#[test]
fn annotation_fills_classified_pixels_with_band_colors() {
    let image = reject_image(32, 32);
    let outcome = grade_image(&image, &GradingConfig::default());
    let annotated = annotate::render_annotated(&image, &outcome, None::<&FontVec>);

    assert_eq!(annotated.dimensions(), image.dimensions());
    // Every pixel is REJECT; the fill (and box overdraw) are both red.
    assert_eq!(*annotated.get_pixel(16, 16), Rgb([255, 0, 0]));
    assert_eq!(*annotated.get_pixel(0, 0), Rgb([255, 0, 0]));
}

#[test]
fn custom_thresholds_shift_band_membership() {
    // Severity 155 is GRADE D under the defaults but REJECT when t1 moves
    // above it.
    let thresholds = Thresholds::new(156, 160, 168).unwrap();
    let config = GradingConfig {
        thresholds,
        ..Default::default()
    };

    let mut severity = GrayImage::from_pixel(40, 40, Luma([255]));
    for y in 5..15 {
        for x in 5..15 {
            severity.put_pixel(x, y, Luma([155]));
        }
    }
    let (final_grade, reports) = grade_severity_map(&severity, &config);
    assert_eq!(final_grade, FinalGrade::Reject);
    assert_eq!(reports[0].grade, Grade::Reject);
}
