//! Spread splitting: one scanned sheet into reading-order pages.

use image::DynamicImage;

/// Split a scanned sheet into single pages.
///
/// A sheet wider than tall is a two-page spread and is cut at the vertical
/// midline; manga reads right to left, so the right half comes first. A
/// portrait sheet is already a single page and passes through unchanged.
pub fn split_spread(sheet: &DynamicImage) -> Vec<DynamicImage> {
    let (w, h) = (sheet.width(), sheet.height());
    if w > h {
        let half = w / 2;
        let right = sheet.crop_imm(half, 0, w - half, h);
        let left = sheet.crop_imm(0, 0, half, h);
        vec![right, left]
    } else {
        vec![sheet.clone()]
    }
}
