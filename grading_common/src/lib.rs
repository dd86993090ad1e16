//! Aflatoxin contamination grading for corn-kernel images.
//!
//! The pipeline turns a color image into a severity-index map, partitions
//! it into exclusive severity bands, extracts connected contamination
//! objects, scores each object (grade plus ppb estimate) and resolves a
//! final categorical grade. Every step is pure and deterministic; capture,
//! persistence and HTTP surfaces live in the cli/server crates.

pub mod annotate;
pub mod bands;
pub mod config;
pub mod error;
pub mod grade;
pub mod pipeline;
pub mod regions;
pub mod result;
pub mod scoring;
pub mod severity;

pub use bands::{Band, Classification, Grade};
pub use config::{GradingConfig, ScoringOverrides, ScoringParams, Thresholds};
pub use error::GradeError;
pub use grade::FinalGrade;
pub use pipeline::{grade_image, open_image, BandLayer, GradingOutcome};
pub use result::{GradeSummary, GradingResult};
pub use scoring::RegionReport;
