//! Annotated raster rendering: band-colored pixel fill, per-object bounding
//! box and label, and an overall grade banner.

use ab_glyph::{Font, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::pipeline::GradingOutcome;

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 22.0;
const BANNER_SCALE: f32 = 30.0;
const BANNER_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Render the grading overlay onto a copy of the original image.
///
/// Each classified pixel is filled with its own band color; boxes and
/// labels use the worst grade present in the object. Text is skipped when
/// no font is supplied.
pub fn render_annotated(
    original: &RgbImage,
    outcome: &GradingOutcome,
    font: Option<&impl Font>,
) -> RgbImage {
    let mut canvas = original.clone();

    for layer in &outcome.band_layers {
        for (x, y, pixel) in layer.mask.enumerate_pixels() {
            if pixel[0] != 0 {
                canvas.put_pixel(x, y, layer.color);
            }
        }
    }

    for (grade, summary) in &outcome.result.summary_by_grade {
        let color = outcome
            .band_layers
            .iter()
            .find(|layer| layer.grade == *grade)
            .map(|layer| layer.color)
            .unwrap_or(BANNER_COLOR);
        for object in &summary.objects {
            let bbox = object.bounding_box;
            draw_box(
                &mut canvas,
                bbox.x as i32,
                bbox.y as i32,
                bbox.width,
                bbox.height,
                color,
            );
            if let Some(font) = font {
                let label = format!("ID {}", object.object_id);
                let label_y = (bbox.y as i32 - LABEL_SCALE as i32).max(0);
                draw_text_mut(
                    &mut canvas,
                    color,
                    bbox.x as i32,
                    label_y,
                    PxScale::from(LABEL_SCALE),
                    font,
                    &label,
                );
            }
        }
    }

    if let Some(font) = font {
        let result = &outcome.result;
        draw_text_mut(
            &mut canvas,
            BANNER_COLOR,
            10,
            10,
            PxScale::from(BANNER_SCALE),
            font,
            &format!("Final Grade: {}", result.final_grade),
        );
        draw_text_mut(
            &mut canvas,
            BANNER_COLOR,
            10,
            10 + BANNER_SCALE as i32,
            PxScale::from(BANNER_SCALE),
            font,
            &format!(
                "Total Detected Area: {} px ({:.4}%)",
                result.total_area_pixels, result.total_area_percentage
            ),
        );
    }

    canvas
}

fn draw_box(canvas: &mut RgbImage, x: i32, y: i32, width: u32, height: u32, color: Rgb<u8>) {
    for t in 0..BOX_THICKNESS {
        let w = width.saturating_sub(2 * t as u32);
        let h = height.saturating_sub(2 * t as u32);
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(canvas, Rect::at(x + t, y + t).of_size(w, h), color);
    }
}
