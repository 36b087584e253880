//! Segments scanned manga sheets into panels (comic frames) and speech
//! balloons for downstream OCR, translation and layout work.
//!
//! The pipeline runs per sheet: spread splitting, blank-page classification,
//! panel detection, balloon detection, then false-positive suppression.
//! Outputs are RGBA cutouts with transparent backgrounds outside the
//! detected silhouette.

pub mod balloon_detect;
pub mod cli;
pub mod config;
pub mod false_positive;
pub mod geometry;
pub mod page_classify;
pub mod page_cut;
pub mod panel_detect;
pub mod pipeline;
pub mod types;

pub use balloon_detect::BalloonDetector;
pub use config::{ConfigError, SegmenterConfig};
pub use false_positive::FalsePositiveFilter;
pub use page_classify::{PageClassifier, PageKind};
pub use page_cut::split_spread;
pub use panel_detect::PanelDetector;
pub use pipeline::{PageSegments, Pipeline, PipelineError, RunReport};
pub use types::{
    Balloon, BalloonCandidate, BalloonShape, BoundingBox, Corners, Panel, PanelRegion,
    Point,
};
