//! Speech-balloon candidate detection within a panel.
//!
//! Balloons binarize to bright closed regions; candidates are contours that
//! pass an area/circularity gate and a pixel-composition test measured on a
//! composite where the contour and its interior are masked to neutral gray.
//! Each surviving candidate is classified as Circle, Rect or Zigzag and
//! extracted as an RGBA crop with the filled contour as its alpha channel.

use image::{imageops, GrayImage, Luma, RgbaImage};
use imageproc::contours::find_contours;
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::morphology::{dilate, erode};

use crate::config::BalloonDetectConfig;
use crate::geometry;
use crate::types::{BalloonCandidate, BalloonShape, BoundingBox, Point};

/// Detects balloon candidates in a panel crop.
pub struct BalloonDetector {
    config: BalloonDetectConfig,
}

impl BalloonDetector {
    pub fn new(config: BalloonDetectConfig) -> Self {
        Self { config }
    }

    /// Find balloon candidates in a panel image. Degenerate contours
    /// (zero perimeter, zero paper count) are silently skipped.
    pub fn detect(&self, panel: &RgbaImage) -> Vec<BalloonCandidate> {
        let (width, height) = panel.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let panel_area = f64::from(width) * f64::from(height);

        let gray = imageops::grayscale(panel);
        let bin = threshold(&gray, self.config.binary_threshold, ThresholdType::Binary);
        let bin = dilate(&erode(&bin, Norm::LInf, 1), Norm::LInf, 1);

        let mut candidates = Vec::new();
        for contour in find_contours::<i32>(&bin) {
            let perimeter = geometry::contour_perimeter(&contour.points);
            let area = geometry::contour_area(&contour.points);
            let Some(circ) = geometry::circularity(area, perimeter) else {
                continue;
            };
            if area < self.config.min_area_ratio * panel_area
                || area >= self.config.max_area_ratio * panel_area
                || circ <= self.config.min_circularity
            {
                continue;
            }
            let Some(bbox) = geometry::bounding_box(&contour.points) else {
                continue;
            };

            let Some(bw_ratio) = self.pixel_ratio(&gray, &contour.points, bbox) else {
                continue;
            };

            let shape = self.classify_shape(area, circ, bbox);

            // A candidate covering almost the whole panel is a frame-level
            // detection, not a balloon.
            if bbox.area() as f64 >= self.config.max_bbox_area_ratio * panel_area {
                continue;
            }

            let image = self.extract(panel, &contour.points, bbox);
            candidates.push(BalloonCandidate {
                image,
                bbox,
                contour: contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x, p.y))
                    .collect(),
                center: bbox.center(),
                area,
                circularity: circ,
                shape,
                bw_ratio,
            });
        }
        candidates
    }

    /// Ink-to-paper composition test on the bbox crop of the gray composite.
    ///
    /// The contour outline (thickness 4) and its interior are forced to the
    /// neutral gray, so the counts measure the pixels the bbox adds around
    /// the balloon. Returns the ratio, or `None` when the candidate fails.
    fn pixel_ratio(
        &self,
        gray: &GrayImage,
        contour: &[imageproc::point::Point<i32>],
        bbox: BoundingBox,
    ) -> Option<f64> {
        let mut mask = GrayImage::from_pixel(gray.width(), gray.height(), Luma([255]));
        let outline_radius = (self.config.outline_thickness / 2) as i32;
        for p in contour {
            draw_filled_circle_mut(&mut mask, (p.x, p.y), outline_radius, Luma([0u8]));
        }
        let poly = geometry::fill_polygon(contour);
        if poly.len() >= 3 {
            draw_polygon_mut(&mut mask, &poly, Luma([0u8]));
        }

        let neutral = self.config.neutral_gray;
        let ink_threshold = self.config.ink_threshold;
        let paper_threshold = 255 - ink_threshold;
        let mut ink = 0u64;
        let mut paper = 0u64;
        for dy in 0..bbox.h {
            for dx in 0..bbox.w {
                let (px, py) = (bbox.x + dx, bbox.y + dy);
                if px >= gray.width() || py >= gray.height() {
                    continue;
                }
                let value = if mask.get_pixel(px, py)[0] == 0 {
                    neutral
                } else {
                    gray.get_pixel(px, py)[0]
                };
                if value < ink_threshold && value != neutral {
                    ink += 1;
                }
                if value > paper_threshold {
                    paper += 1;
                }
            }
        }

        if paper == 0 || ink < self.config.min_ink_pixels {
            return None;
        }
        let ratio = ink as f64 / paper as f64;
        if ratio <= self.config.min_bw_ratio || ratio >= self.config.max_bw_ratio {
            return None;
        }
        Some(ratio)
    }

    /// First match wins: box-filling contours are Rect, round ones Circle,
    /// the rest Zigzag.
    fn classify_shape(&self, area: f64, circ: f64, bbox: BoundingBox) -> BalloonShape {
        if area >= self.config.rect_fill_ratio * bbox.area() as f64 {
            BalloonShape::Rect
        } else if circ >= self.config.circle_min_circularity {
            BalloonShape::Circle
        } else {
            BalloonShape::Zigzag
        }
    }

    /// RGBA crop of the panel; alpha 255 inside the filled contour, 0 outside.
    fn extract(
        &self,
        panel: &RgbaImage,
        contour: &[imageproc::point::Point<i32>],
        bbox: BoundingBox,
    ) -> RgbaImage {
        let mut alpha_mask = GrayImage::new(panel.width(), panel.height());
        let poly = geometry::fill_polygon(contour);
        if poly.len() >= 3 {
            draw_polygon_mut(&mut alpha_mask, &poly, Luma([255u8]));
        }

        let mut out = RgbaImage::new(bbox.w, bbox.h);
        for dy in 0..bbox.h {
            for dx in 0..bbox.w {
                let (px, py) = (bbox.x + dx, bbox.y + dy);
                if px >= panel.width() || py >= panel.height() {
                    continue;
                }
                let mut pixel = *panel.get_pixel(px, py);
                pixel[3] = alpha_mask.get_pixel(px, py)[0];
                out.put_pixel(dx, dy, pixel);
            }
        }
        out
    }
}
