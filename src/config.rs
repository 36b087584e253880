//! Pipeline configuration.
//!
//! Every numeric threshold used by the detectors lives here, with the
//! empirically tuned defaults the pipeline ships with. The constants were
//! chosen against 8-bit grayscale scans at typical tankobon resolutions and
//! should be re-validated before reuse on other material.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration load error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Page classification thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageClassifyConfig {
    /// Pages with mean luma below this are treated as blank/black filler.
    pub blank_mean_threshold: f64,
}

impl Default for PageClassifyConfig {
    fn default() -> Self {
        Self {
            blank_mean_threshold: 100.0,
        }
    }
}

/// Panel (frame) detection thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelDetectConfig {
    /// Binarization threshold for the balloon-suppression pre-pass.
    pub balloon_binary_threshold: u8,
    /// Suppressed-balloon area range, as fractions of the page area.
    pub balloon_min_area_ratio: f64,
    pub balloon_max_area_ratio: f64,
    /// Minimum circularity for a contour to count as a balloon to suppress.
    pub balloon_min_circularity: f64,
    /// Gaussian blur sigma (OpenCV's derived sigma for a 3x3 kernel).
    pub blur_sigma: f32,
    /// Inverted binarization threshold; foreground = non-bright pixels.
    pub inverse_binary_threshold: u8,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Hough accumulator vote threshold.
    pub hough_vote_threshold: u32,
    /// At most this many detected lines are rasterized as evidence.
    pub max_lines: usize,
    /// Minimum panel bbox area as a fraction of the page area.
    pub min_bbox_area_ratio: f64,
    /// Bbox edges closer than this to a page boundary are pulled flush.
    pub edge_snap_px: u32,
}

impl Default for PanelDetectConfig {
    fn default() -> Self {
        Self {
            balloon_binary_threshold: 230,
            balloon_min_area_ratio: 0.008,
            balloon_max_area_ratio: 0.03,
            balloon_min_circularity: 0.4,
            blur_sigma: 0.8,
            inverse_binary_threshold: 210,
            canny_low: 120.0,
            canny_high: 130.0,
            hough_vote_threshold: 50,
            max_lines: 100,
            min_bbox_area_ratio: 0.048,
            edge_snap_px: 6,
        }
    }
}

/// Balloon detection thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalloonDetectConfig {
    /// Binarization threshold for contour extraction.
    pub binary_threshold: u8,
    /// Candidate contour area range, as fractions of the panel area.
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    /// Minimum circularity for a contour to stay a candidate.
    pub min_circularity: f64,
    /// Outline thickness when marking the contour into the composite mask.
    pub outline_thickness: u32,
    /// Gray value the masked-out region is forced to in the composite.
    pub neutral_gray: u8,
    /// Pixels darker than this count as ink; brighter than `255 - this`
    /// count as paper.
    pub ink_threshold: u8,
    /// Minimum ink pixel count for a valid candidate.
    pub min_ink_pixels: u64,
    /// Accepted ink-to-paper ratio range (exclusive on both ends).
    pub min_bw_ratio: f64,
    pub max_bw_ratio: f64,
    /// Contours filling at least this fraction of their bbox classify as Rect.
    pub rect_fill_ratio: f64,
    /// Minimum circularity for the Circle classification.
    pub circle_min_circularity: f64,
    /// Candidates whose bbox covers at least this fraction of the panel are
    /// rejected as frame-level detections.
    pub max_bbox_area_ratio: f64,
    /// A panel yielding more raw candidates than this is considered
    /// degenerate and emits no balloons.
    pub max_candidates: usize,
}

impl Default for BalloonDetectConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 230,
            min_area_ratio: 0.01,
            max_area_ratio: 0.9,
            min_circularity: 0.4,
            outline_thickness: 4,
            neutral_gray: 150,
            ink_threshold: 85,
            min_ink_pixels: 10,
            min_bw_ratio: 0.01,
            max_bw_ratio: 0.7,
            rect_fill_ratio: 0.95,
            circle_min_circularity: 0.7,
            max_bbox_area_ratio: 0.9,
            max_candidates: 99,
        }
    }
}

/// False-positive filter thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FalsePositiveConfig {
    /// Opaque pixels within this distance of the crop edge, or of a
    /// transparent pixel, are marked boundary-adjacent.
    pub boundary_margin: u32,
    /// Re-binarization threshold applied to the crop before counting.
    pub binary_threshold: u8,
    /// Minimum interior black pixel count for a genuine balloon.
    pub min_black_pixels: u64,
}

impl Default for FalsePositiveConfig {
    fn default() -> Self {
        Self {
            boundary_margin: 5,
            binary_threshold: 150,
            min_black_pixels: 100,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub page: PageClassifyConfig,
    pub panel: PanelDetectConfig,
    pub balloon: BalloonDetectConfig,
    pub filter: FalsePositiveConfig,
}

impl SegmenterConfig {
    /// Load overrides from a TOML file; absent keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let config = SegmenterConfig::default();
        assert_eq!(config.page.blank_mean_threshold, 100.0);
        assert_eq!(config.panel.balloon_binary_threshold, 230);
        assert_eq!(config.panel.inverse_binary_threshold, 210);
        assert_eq!(config.panel.min_bbox_area_ratio, 0.048);
        assert_eq!(config.balloon.ink_threshold, 85);
        assert_eq!(config.balloon.neutral_gray, 150);
        assert_eq!(config.filter.boundary_margin, 5);
        assert_eq!(config.filter.min_black_pixels, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_text = r#"
            [balloon]
            min_circularity = 0.5

            [filter]
            boundary_margin = 8
        "#;
        let config: SegmenterConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.balloon.min_circularity, 0.5);
        assert_eq!(config.filter.boundary_margin, 8);
        // Untouched sections keep defaults.
        assert_eq!(config.balloon.binary_threshold, 230);
        assert_eq!(config.panel.hough_vote_threshold, 50);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = SegmenterConfig::from_toml_file(Path::new("/no/such/file.toml"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
