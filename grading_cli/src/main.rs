use std::fs::File;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::Context;
use clap::Parser;
use grading_common::{annotate, GradingConfig, ScoringOverrides, ScoringParams, Thresholds};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
pub struct Args {
    /// Path to the kernel image to grade (.jpeg/.png).
    input: PathBuf,
    /// REJECT band upper threshold.
    #[arg(long, default_value_t = 150)]
    t1: i64,
    /// GRADE D band upper threshold.
    #[arg(long, default_value_t = 160)]
    t2: i64,
    /// GRADE C band upper threshold.
    #[arg(long, default_value_t = 168)]
    t3: i64,
    /// Override for the REJECT pixel weight of the ppb estimate.
    #[arg(long)]
    w_reject: Option<f64>,
    /// Override for the GRADE D pixel weight of the ppb estimate.
    #[arg(long)]
    w_grade_d: Option<f64>,
    /// Override for the GRADE C pixel weight of the ppb estimate.
    #[arg(long)]
    w_grade_c: Option<f64>,
    /// Override for the brightness multiplier of the ppb estimate.
    #[arg(long)]
    brightness_weight: Option<f64>,
    /// TrueType font for labels on the annotated image.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Skip writing the annotated image.
    #[arg(long, action, default_value = "false")]
    no_annotate: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,grading_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let thresholds = Thresholds::new(args.t1, args.t2, args.t3)?;
    let overrides = ScoringOverrides {
        w_reject: args.w_reject,
        w_grade_d: args.w_grade_d,
        w_grade_c: args.w_grade_c,
        brightness_weight: args.brightness_weight,
    };
    let config = GradingConfig {
        thresholds,
        scoring: ScoringParams::default().apply_overrides(&overrides),
        ..Default::default()
    };

    let image = grading_common::open_image(&args.input)?;
    let outcome = grading_common::grade_image(&image, &config);
    let result = &outcome.result;

    println!("\nGrading for {:?}:", args.input);
    println!("  Final grade: {}", result.final_grade);
    println!(
        "  Detected area: {} px ({:.4}% of frame)",
        result.total_area_pixels, result.total_area_percentage
    );
    println!(
        "  Objects: {}, ppb total: {}",
        result.total_objects, result.ppb_total
    );
    for (grade, summary) in &result.summary_by_grade {
        println!(
            "  {}: {} px, {} objects",
            grade, summary.total_pixels, summary.total_objects
        );
        for object in &summary.objects {
            println!(
                "    ID {}: {} px at ({},{}), mean brightness {:.1}, ppb {}",
                object.object_id,
                object.total_pixels,
                object.bounding_box.x,
                object.bounding_box.y,
                object.mean_brightness,
                object.ppb
            );
        }
    }

    // Save output: annotated image & grading record.
    if !args.no_annotate {
        let font = load_font(args.font.as_deref());
        let annotated = annotate::render_annotated(&image, &outcome, font.as_ref());
        let img_output_path = args.input.with_extension("graded.jpg");
        annotated
            .save(&img_output_path)
            .with_context(|| format!("Failed to save annotated image {img_output_path:?}"))?;
        log::info!("Annotated image saved to {img_output_path:?}");
    }

    let json_output_path = args.input.with_extension("graded.json");
    let json_file = File::create(&json_output_path)
        .with_context(|| format!("Failed to create {json_output_path:?}"))?;
    serde_json::to_writer_pretty(json_file, result)?;
    log::info!("Grading record saved to {json_output_path:?}");

    Ok(())
}

fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let path = path?;
    match std::fs::read(path) {
        Ok(data) => match FontVec::try_from_vec(data) {
            Ok(font) => Some(font),
            Err(err) => {
                log::warn!("Invalid font {path:?}: {err}; labels will be skipped");
                None
            }
        },
        Err(err) => {
            log::warn!("Could not read font {path:?}: {err}; labels will be skipped");
            None
        }
    }
}
