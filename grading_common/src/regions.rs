//! Connected contamination objects extracted from the union of band masks.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned bounding rectangle of a region, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One detected region: its filled mask, pixel area and bounding box.
/// Ids are sequential in contour emission order, starting at 1.
pub struct RegionMask {
    pub id: u32,
    pub mask: GrayImage,
    pub area: u64,
    pub bbox: BoundingBox,
}

/// Trace external contours over the union mask and rasterize each into a
/// filled region mask.
///
/// Only top-level outer boundaries become regions: holes and components
/// fully enclosed by another region's boundary are folded into the
/// enclosing region. Regions smaller than `min_area` filled pixels are
/// dropped (their pixels still count toward band area totals).
pub fn extract(union: &GrayImage, min_area: u32) -> Vec<RegionMask> {
    let (width, height) = union.dimensions();
    let contours = find_contours::<i32>(union);

    let mut regions = Vec::new();
    let mut next_id = 1u32;
    for contour in &contours {
        if contour.parent.is_some() {
            continue;
        }

        let mut mask = GrayImage::new(width, height);
        fill_contour(&mut mask, &contour.points);

        let area = mask.pixels().filter(|p| p[0] != 0).count() as u64;
        if area < min_area as u64 {
            continue;
        }

        regions.push(RegionMask {
            id: next_id,
            mask,
            area,
            bbox: bounding_box(&contour.points),
        });
        next_id += 1;
    }

    regions
}

fn fill_contour(mask: &mut GrayImage, points: &[Point<i32>]) {
    // draw_polygon_mut rejects a closing point equal to the first.
    let points = if points.len() > 1 && points.first() == points.last() {
        &points[..points.len() - 1]
    } else {
        points
    };
    match points {
        [] => {}
        [point] => mask.put_pixel(point.x as u32, point.y as u32, Luma([255])),
        _ => draw_polygon_mut(mask, points, Luma([255])),
    }
}

fn bounding_box(points: &[Point<i32>]) -> BoundingBox {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
    BoundingBox {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    }
}
