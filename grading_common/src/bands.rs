//! Severity bands and exclusive per-band pixel masks.

use std::collections::HashMap;
use std::fmt;

use image::{GrayImage, Luma, Rgb};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::Serialize;

use crate::config::Thresholds;

/// Severity tier of a classified pixel or region. The ordering is severity
/// order: `Reject` is the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "GRADE D")]
    GradeD,
    #[serde(rename = "GRADE C")]
    GradeC,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::Reject => "REJECT",
            Grade::GradeD => "GRADE D",
            Grade::GradeC => "GRADE C",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One severity band: an inclusive intensity range over the severity map,
/// a display color and an explicit severity rank (0 = worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub grade: Grade,
    pub low: u8,
    pub high: u8,
    pub color: Rgb<u8>,
    pub rank: u8,
}

impl Band {
    /// The three default bands cut from strictly increasing thresholds:
    /// `[0,t1]` REJECT, `[t1+1,t2]` GRADE D, `[t2+1,t3]` GRADE C. Pixels
    /// above `t3` belong to no band.
    pub fn from_thresholds(thresholds: &Thresholds) -> [Band; 3] {
        [
            Band {
                grade: Grade::Reject,
                low: 0,
                high: thresholds.t1,
                color: Rgb([255, 0, 0]),
                rank: 0,
            },
            Band {
                grade: Grade::GradeD,
                low: thresholds.t1 + 1,
                high: thresholds.t2,
                color: Rgb([255, 165, 0]),
                rank: 1,
            },
            Band {
                grade: Grade::GradeC,
                low: thresholds.t2 + 1,
                high: thresholds.t3,
                color: Rgb([255, 255, 0]),
                rank: 2,
            },
        ]
    }
}

/// Exclusive pixel mask for one band plus its aggregate statistics.
pub struct BandMask {
    pub band: Band,
    pub mask: GrayImage,
    /// Number of pixels claimed by this band.
    pub area: u64,
    /// Connected components strictly larger than the area floor inside this
    /// band's own mask. Diagnostic only: final object identity comes from
    /// the union mask and may legitimately differ in count.
    pub object_count: usize,
}

/// All band masks in severity order plus the union of claimed pixels.
pub struct Classification {
    pub bands: Vec<BandMask>,
    pub union: GrayImage,
}

/// Partition the severity map into exclusive band masks, worst band first.
///
/// A pixel matching several band ranges is claimed by the most severe one,
/// so the masks stay pairwise disjoint even for overlapping ranges.
pub fn classify(severity: &GrayImage, bands: &[Band], min_component_area: u32) -> Classification {
    let (width, height) = severity.dimensions();
    let mut claimed = GrayImage::new(width, height);
    let mut out = Vec::with_capacity(bands.len());

    for band in bands {
        let mut mask = GrayImage::new(width, height);
        let mut area = 0u64;
        for (x, y, pixel) in severity.enumerate_pixels() {
            let value = pixel[0];
            if value < band.low || value > band.high {
                continue;
            }
            if claimed.get_pixel(x, y)[0] != 0 {
                continue;
            }
            mask.put_pixel(x, y, Luma([255]));
            claimed.put_pixel(x, y, Luma([255]));
            area += 1;
        }
        let object_count = count_components_above(&mask, min_component_area);
        out.push(BandMask {
            band: *band,
            mask,
            area,
            object_count,
        });
    }

    Classification { bands: out, union: claimed }
}

/// Count 8-connected components whose pixel count is strictly above
/// `min_area`.
fn count_components_above(mask: &GrayImage, min_area: u32) -> usize {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut sizes: HashMap<u32, u32> = HashMap::new();
    for pixel in labeled.pixels() {
        let label = pixel[0];
        if label != 0 {
            *sizes.entry(label).or_insert(0) += 1;
        }
    }
    sizes.values().filter(|&&count| count > min_area).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mut map = GrayImage::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                map.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
        map
    }

    #[test]
    fn masks_are_disjoint_and_union_matches_area_sum() {
        let mut map = GrayImage::new(16, 16);
        for (i, pixel) in map.pixels_mut().enumerate() {
            *pixel = Luma([(i % 256) as u8]);
        }
        let bands = Band::from_thresholds(&Thresholds::default());
        let classification = classify(&map, &bands, 0);

        let mut union_count = 0u64;
        for (x, y, union_pixel) in classification.union.enumerate_pixels() {
            let set: usize = classification
                .bands
                .iter()
                .filter(|b| b.mask.get_pixel(x, y)[0] != 0)
                .count();
            assert!(set <= 1, "pixel ({x},{y}) claimed by {set} bands");
            assert_eq!(union_pixel[0] != 0, set == 1);
            if set == 1 {
                union_count += 1;
            }
            // Pixels above t3 belong to no band.
            if map.get_pixel(x, y)[0] > 168 {
                assert_eq!(set, 0);
            }
        }
        let area_sum: u64 = classification.bands.iter().map(|b| b.area).sum();
        assert_eq!(area_sum, union_count);
    }

    #[test]
    fn overlapping_ranges_resolve_to_the_most_severe_band() {
        let map = map_from_rows(&[&[75u8, 75, 120]]);
        let bands = [
            Band {
                grade: Grade::Reject,
                low: 0,
                high: 100,
                color: Rgb([255, 0, 0]),
                rank: 0,
            },
            Band {
                grade: Grade::GradeD,
                low: 50,
                high: 150,
                color: Rgb([255, 165, 0]),
                rank: 1,
            },
        ];
        let classification = classify(&map, &bands, 0);
        assert_eq!(classification.bands[0].area, 2);
        assert_eq!(classification.bands[1].area, 1);
        // 75 sits in both raw ranges but only the REJECT mask may hold it.
        assert_ne!(classification.bands[0].mask.get_pixel(0, 0)[0], 0);
        assert_eq!(classification.bands[1].mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn component_diagnostic_counts_only_above_the_floor() {
        let mut map = GrayImage::from_pixel(40, 20, Luma([255]));
        // One 10x10 blob (100 px) and one 5x10 blob (50 px), both REJECT.
        for y in 2..12 {
            for x in 2..12 {
                map.put_pixel(x, y, Luma([10]));
            }
            for x in 20..25 {
                map.put_pixel(x, y, Luma([10]));
            }
        }
        let bands = Band::from_thresholds(&Thresholds::default());
        let classification = classify(&map, &bands, 80);
        assert_eq!(classification.bands[0].area, 150);
        assert_eq!(classification.bands[0].object_count, 1);
    }
}
