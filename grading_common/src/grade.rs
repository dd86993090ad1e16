//! Final grade resolution from per-band area totals.

use std::fmt;

use serde::Serialize;

/// Overall verdict for one graded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FinalGrade {
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "GRADE D")]
    GradeD,
    #[serde(rename = "GRADE C")]
    GradeC,
    #[serde(rename = "GRADE B (minor)")]
    GradeB,
    #[serde(rename = "GRADE A (clean)")]
    GradeA,
}

impl FinalGrade {
    pub fn label(self) -> &'static str {
        match self {
            FinalGrade::Reject => "REJECT",
            FinalGrade::GradeD => "GRADE D",
            FinalGrade::GradeC => "GRADE C",
            FinalGrade::GradeB => "GRADE B (minor)",
            FinalGrade::GradeA => "GRADE A (clean)",
        }
    }
}

impl fmt::Display for FinalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity-ordered decision, short-circuiting on the first band with any
/// claimed area. Detected area with no band attribution falls to
/// "GRADE B (minor)"; a clean image grades "GRADE A (clean)".
pub fn resolve(
    reject_area: u64,
    grade_d_area: u64,
    grade_c_area: u64,
    total_detected_area: u64,
) -> FinalGrade {
    if reject_area > 0 {
        FinalGrade::Reject
    } else if grade_d_area > 0 {
        FinalGrade::GradeD
    } else if grade_c_area > 0 {
        FinalGrade::GradeC
    } else if total_detected_area > 0 {
        FinalGrade::GradeB
    } else {
        FinalGrade::GradeA
    }
}

/// Detected-area share of the whole frame, in percent.
pub fn area_percentage(total_detected_area: u64, width: u32, height: u32) -> f64 {
    let total_image_area = width as f64 * height as f64;
    if total_image_area == 0.0 {
        return 0.0;
    }
    total_detected_area as f64 / total_image_area * 100.0
}
