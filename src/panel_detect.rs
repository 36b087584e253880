//! Panel (frame) boundary detection.
//!
//! Combines two kinds of evidence: the inverted binarization of the page
//! (non-bright pixels, which include frame borders) and the straight lines
//! found by a Hough transform over Canny edges. Their intersection isolates
//! frame borders from screentone and artwork; bounding boxes of large
//! intersection contours are drawn back in to close gaps left by broken
//! line segments before the final contour pass.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::contours::{find_contours, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_hollow_rect_mut, draw_polygon_mut};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{detect_lines, draw_polar_lines_mut, LineDetectionOptions};
use imageproc::morphology::{dilate, erode};
use imageproc::rect::Rect;

use crate::config::PanelDetectConfig;
use crate::geometry;
use crate::types::{BoundingBox, PanelRegion};

/// Thickness of the gap-closing rectangles drawn over bbox evidence.
const COMPLETION_RECT_THICKNESS: i32 = 3;

/// Detects comic frames within a content page.
pub struct PanelDetector {
    config: PanelDetectConfig,
}

impl PanelDetector {
    pub fn new(config: PanelDetectConfig) -> Self {
        Self { config }
    }

    /// Find panel regions in a page. One pass; contours that fail the area
    /// threshold are dropped, never retried.
    pub fn detect(&self, page: &DynamicImage) -> Vec<PanelRegion> {
        let mut gray = page.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let page_area = f64::from(width) * f64::from(height);

        // Balloon outlines would otherwise read as frame borders.
        self.suppress_balloons(&mut gray, page_area);

        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let inverse_bin = threshold(
            &blurred,
            self.config.inverse_binary_threshold,
            ThresholdType::BinaryInverted,
        );

        let edges = canny(&gray, self.config.canny_low, self.config.canny_high);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.config.hough_vote_threshold,
                suppression_radius: 0,
            },
        );
        let kept = &lines[..lines.len().min(self.config.max_lines)];
        let mut line_img = GrayImage::new(width, height);
        draw_polar_lines_mut(&mut line_img, kept, Luma([255u8]));

        // Core boundary evidence: non-bright pixels lying on detected lines.
        let mut evidence = and_images(&inverse_bin, &line_img);

        // Close gaps: redraw the bbox of every large evidence contour.
        for contour in external_contours(&evidence) {
            let Some(bbox) = geometry::bounding_box(&contour.points) else {
                continue;
            };
            if (bbox.area() as f64) >= self.config.min_bbox_area_ratio * page_area {
                draw_thick_rect(&mut evidence, bbox);
            }
        }

        let complement = and_images(&evidence, &inverse_bin);

        let rgba = page.to_rgba8();
        let mut panels = Vec::new();
        for contour in external_contours(&complement) {
            let Some(bbox) = geometry::bounding_box(&contour.points) else {
                continue;
            };
            if (bbox.area() as f64) < self.config.min_bbox_area_ratio * page_area {
                continue;
            }
            let bbox = self.snap_to_page(bbox, width, height);
            panels.push(extract_region(&rgba, &contour.points, bbox));
        }
        panels
    }

    /// Fill likely speech balloons solid black in the grayscale source so
    /// their outlines cannot contribute line evidence.
    fn suppress_balloons(&self, gray: &mut GrayImage, page_area: f64) {
        let bin = threshold(
            gray,
            self.config.balloon_binary_threshold,
            ThresholdType::Binary,
        );
        let bin = dilate(&erode(&bin, Norm::LInf, 1), Norm::LInf, 1);

        for contour in find_contours::<i32>(&bin) {
            let area = geometry::contour_area(&contour.points);
            let perimeter = geometry::contour_perimeter(&contour.points);
            let Some(circ) = geometry::circularity(area, perimeter) else {
                continue;
            };
            let ratio = area / page_area;
            if ratio < self.config.balloon_min_area_ratio
                || ratio >= self.config.balloon_max_area_ratio
            {
                continue;
            }
            if circ > self.config.balloon_min_circularity {
                let poly = geometry::fill_polygon(&contour.points);
                if poly.len() >= 3 {
                    draw_polygon_mut(gray, &poly, Luma([0u8]));
                }
            }
        }
    }

    /// Pull bbox edges within `edge_snap_px` of a page boundary flush to it,
    /// absorbing scan-margin noise.
    fn snap_to_page(&self, bbox: BoundingBox, width: u32, height: u32) -> BoundingBox {
        let snap = self.config.edge_snap_px;
        let BoundingBox {
            mut x,
            mut y,
            mut w,
            mut h,
        } = bbox;

        if x < snap {
            w += x;
            x = 0;
        }
        if y < snap {
            h += y;
            y = 0;
        }
        if x + w > width.saturating_sub(snap) {
            w = width - x;
        }
        if y + h > height.saturating_sub(snap) {
            h = height - y;
        }
        BoundingBox { x, y, w, h }
    }
}

/// Pixel-wise logical AND of two same-size binary images.
fn and_images(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for y in 0..a.height() {
        for x in 0..a.width() {
            if a.get_pixel(x, y)[0] > 0 && b.get_pixel(x, y)[0] > 0 {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

/// External contours only: top-level borders with no parent.
fn external_contours(img: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(img)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .collect()
}

/// Draw a 3-pixel-thick hollow rectangle centered on the bbox border.
fn draw_thick_rect(img: &mut GrayImage, bbox: BoundingBox) {
    let x = bbox.x as i32;
    let y = bbox.y as i32;
    for offset in 0..COMPLETION_RECT_THICKNESS {
        let inset = offset - COMPLETION_RECT_THICKNESS / 2;
        let w = bbox.w as i32 - 2 * inset;
        let h = bbox.h as i32 - 2 * inset;
        if w <= 0 || h <= 0 {
            continue;
        }
        let rect = Rect::at(x + inset, y + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, rect, Luma([255u8]));
    }
}

/// Crop the page to `bbox`, transparent outside the filled contour.
fn extract_region(
    page: &RgbaImage,
    contour: &[imageproc::point::Point<i32>],
    bbox: BoundingBox,
) -> PanelRegion {
    let mut mask = GrayImage::new(page.width(), page.height());
    let poly = geometry::fill_polygon(contour);
    if poly.len() >= 3 {
        draw_polygon_mut(&mut mask, &poly, Luma([255u8]));
    }

    let mut out = RgbaImage::new(bbox.w, bbox.h);
    for dy in 0..bbox.h {
        for dx in 0..bbox.w {
            let (px, py) = (bbox.x + dx, bbox.y + dy);
            if px >= page.width() || py >= page.height() {
                continue;
            }
            let mut pixel = *page.get_pixel(px, py);
            if mask.get_pixel(px, py)[0] == 0 {
                pixel[3] = 0;
            }
            out.put_pixel(dx, dy, pixel);
        }
    }

    PanelRegion {
        image: out,
        bbox,
        corners: bbox.corners(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn detector() -> PanelDetector {
        PanelDetector::new(PanelDetectConfig::default())
    }

    /// White page with one black rectangular frame drawn at 3 px stroke.
    fn framed_page() -> DynamicImage {
        let mut raw = image::RgbImage::from_pixel(400, 560, Rgb([255, 255, 255]));
        for t in 0..3u32 {
            let (x0, y0) = (20 + t, 20 + t);
            let (x1, y1) = (379 - t, 539 - t);
            for x in x0..=x1 {
                raw.put_pixel(x, y0, Rgb([0, 0, 0]));
                raw.put_pixel(x, y1, Rgb([0, 0, 0]));
            }
            for y in y0..=y1 {
                raw.put_pixel(x0, y, Rgb([0, 0, 0]));
                raw.put_pixel(x1, y, Rgb([0, 0, 0]));
            }
        }
        DynamicImage::ImageRgb8(raw)
    }

    #[test]
    fn test_all_white_page_yields_no_panels() {
        let white = image::RgbImage::from_pixel(500, 500, Rgb([255, 255, 255]));
        let panels = detector().detect(&DynamicImage::ImageRgb8(white));
        assert!(panels.is_empty());
    }

    #[test]
    fn test_framed_page_yields_panel() {
        let page = framed_page();
        let panels = detector().detect(&page);
        assert!(!panels.is_empty(), "expected at least one panel");

        let page_area = f64::from(page.width()) * f64::from(page.height());
        for panel in &panels {
            assert!(
                (panel.bbox.area() as f64) >= 0.048 * page_area,
                "panel bbox {:?} below the area floor",
                panel.bbox
            );
            assert_eq!(
                (panel.image.width(), panel.image.height()),
                (panel.bbox.w, panel.bbox.h)
            );
        }
    }

    #[test]
    fn test_panel_crop_center_is_opaque() {
        let panels = detector().detect(&framed_page());
        let panel = panels.first().expect("one panel");
        let center = panel
            .image
            .get_pixel(panel.image.width() / 2, panel.image.height() / 2);
        assert_eq!(center[3], 255);
    }

    #[test]
    fn test_edge_snap_pulls_flush() {
        let d = detector();
        let snapped = d.snap_to_page(BoundingBox { x: 4, y: 5, w: 91, h: 91 }, 100, 100);
        assert_eq!(snapped.x, 0);
        assert_eq!(snapped.y, 0);
        // Left/top snaps keep the opposite edge in place (95 and 96); both
        // then land inside the 6 px band and get pulled to the far boundary.
        assert_eq!(snapped.w, 100);
        assert_eq!(snapped.h, 100);

        let untouched =
            d.snap_to_page(BoundingBox { x: 10, y: 10, w: 50, h: 50 }, 100, 100);
        assert_eq!(untouched, BoundingBox { x: 10, y: 10, w: 50, h: 50 });
    }

    #[test]
    fn test_and_images() {
        let mut a = GrayImage::new(4, 1);
        let mut b = GrayImage::new(4, 1);
        a.put_pixel(0, 0, Luma([255]));
        a.put_pixel(1, 0, Luma([255]));
        b.put_pixel(1, 0, Luma([255]));
        b.put_pixel(2, 0, Luma([255]));
        let anded = and_images(&a, &b);
        assert_eq!(anded.get_pixel(0, 0)[0], 0);
        assert_eq!(anded.get_pixel(1, 0)[0], 255);
        assert_eq!(anded.get_pixel(2, 0)[0], 0);
    }
}
