//! Core value types shared across the segmentation pipeline.
//!
//! All types here are plain data: produced once by a detector, read many
//! times by scoring, filtering and persistence, never mutated afterwards.

use image::RgbaImage;
use serde::Serialize;

/// A pixel coordinate in page or panel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The four corners of an axis-aligned panel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Corners {
    /// Left-top
    pub lt: Point,
    /// Right-top
    pub rt: Point,
    /// Left-bottom
    pub lb: Point,
    /// Right-bottom
    pub rb: Point,
}

/// Axis-aligned bounding rectangle `(x, y, w, h)` in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Center of the box, rounded down.
    pub fn center(&self) -> Point {
        Point::new(
            (self.x + self.w / 2) as i32,
            (self.y + self.h / 2) as i32,
        )
    }

    /// The four corners in reading order.
    pub fn corners(&self) -> Corners {
        let (x, y) = (self.x as i32, self.y as i32);
        let (r, b) = (x + self.w as i32, y + self.h as i32);
        Corners {
            lt: Point::new(x, y),
            rt: Point::new(r, y),
            lb: Point::new(x, b),
            rb: Point::new(r, b),
        }
    }
}

/// Shape category of a speech balloon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BalloonShape {
    /// Round balloon (regular speech).
    Circle,
    /// Rectangular balloon (narration, captions).
    Rect,
    /// Spiky/irregular balloon (shouting, thought bursts).
    Zigzag,
}

/// A panel region as returned by the detector, before the orchestrator
/// assigns page/panel indices.
#[derive(Debug, Clone)]
pub struct PanelRegion {
    /// RGBA crop of the page; alpha is 0 outside the detected contour.
    pub image: RgbaImage,
    /// Position in page coordinates.
    pub bbox: BoundingBox,
    /// The four bbox corners (no true quadrilateral fit is attempted).
    pub corners: Corners,
}

/// One comic frame extracted from a page, with its position in the run.
#[derive(Debug, Clone)]
pub struct Panel {
    pub region: PanelRegion,
    /// Index of the source file.
    pub page_idx: usize,
    /// Index of the page within the sheet (0 or 1 for a split spread).
    pub subpage_idx: usize,
    /// Index of the panel within its page.
    pub panel_idx: usize,
}

/// A balloon candidate as returned by the detector, before false-positive
/// filtering and index assignment.
#[derive(Debug, Clone)]
pub struct BalloonCandidate {
    /// RGBA crop of the panel; alpha is 255 inside the filled contour.
    pub image: RgbaImage,
    /// Position in panel coordinates.
    pub bbox: BoundingBox,
    /// The traced contour, in panel coordinates.
    pub contour: Vec<Point>,
    /// Center of the bounding box.
    pub center: Point,
    /// Contour area in pixels.
    pub area: f64,
    /// `4π·area / perimeter²`; 1.0 for a perfect circle.
    pub circularity: f64,
    /// Shape category.
    pub shape: BalloonShape,
    /// Ink-to-paper pixel ratio measured on the gray-composite crop.
    pub bw_ratio: f64,
}

/// An accepted balloon, tied to the panel it was found in.
#[derive(Debug, Clone)]
pub struct Balloon {
    pub candidate: BalloonCandidate,
    /// Index of the owning panel within the whole run.
    pub panel_idx: usize,
}
