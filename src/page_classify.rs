//! Blank-page detection.
//!
//! Scanned volumes contain near-black separator sheets and empty pages that
//! carry no panels; they are dropped before the expensive detection stages.

use image::GrayImage;

use crate::config::PageClassifyConfig;

/// Result of classifying a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A content-bearing page worth segmenting.
    Content,
    /// A near-blank/black filler page; excluded from further processing.
    Blank,
}

/// Classifies pages by mean luma. Pure function of pixel data.
pub struct PageClassifier {
    config: PageClassifyConfig,
}

impl PageClassifier {
    pub fn new(config: PageClassifyConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, page: &GrayImage) -> PageKind {
        if mean_luma(page) < self.config.blank_mean_threshold {
            PageKind::Blank
        } else {
            PageKind::Content
        }
    }
}

/// Mean 8-bit luma over the whole page; 0.0 for an empty image.
pub fn mean_luma(page: &GrayImage) -> f64 {
    let pixels = u64::from(page.width()) * u64::from(page.height());
    if pixels == 0 {
        return 0.0;
    }
    let sum: u64 = page.pixels().map(|p| u64::from(p[0])).sum();
    sum as f64 / pixels as f64
}
