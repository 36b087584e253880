//! Contour measurements: area, perimeter, circularity, bounding boxes.

use imageproc::geometry::arc_length;
use imageproc::point::Point as IpPoint;

use crate::types::BoundingBox;

/// Contour area by the shoelace formula (absolute value).
///
/// Border-following contours are closed implicitly; the last point must not
/// repeat the first.
pub fn contour_area(points: &[IpPoint<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let signed: f64 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            f64::from(points[i].x) * f64::from(points[j].y)
                - f64::from(points[j].x) * f64::from(points[i].y)
        })
        .sum::<f64>()
        / 2.0;
    signed.abs()
}

/// Closed-contour perimeter.
pub fn contour_perimeter(points: &[IpPoint<i32>]) -> f64 {
    arc_length(points, true)
}

/// `4π·area / perimeter²`, or `None` for a zero-perimeter contour.
///
/// 1.0 for a perfect circle, lower for elongated or irregular shapes.
pub fn circularity(area: f64, perimeter: f64) -> Option<f64> {
    if perimeter == 0.0 {
        return None;
    }
    Some(4.0 * std::f64::consts::PI * area / (perimeter * perimeter))
}

/// Axis-aligned bounding box of a contour, or `None` for an empty contour.
pub fn bounding_box(points: &[IpPoint<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        w: (max_x - min_x + 1) as u32,
        h: (max_y - min_y + 1) as u32,
    })
}

/// Contour points prepared for `draw_polygon_mut`, which rejects a polygon
/// whose last point repeats the first.
pub fn fill_polygon(points: &[IpPoint<i32>]) -> Vec<IpPoint<i32>> {
    let mut poly = points.to_vec();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::contours::find_contours;
    use imageproc::drawing::draw_filled_circle_mut;

    fn traced_circle(radius: i32) -> Vec<IpPoint<i32>> {
        let side = (radius * 2 + 20) as u32;
        let mut img = GrayImage::new(side, side);
        let c = side as i32 / 2;
        draw_filled_circle_mut(&mut img, (c, c), radius, Luma([255]));
        let contours = find_contours::<i32>(&img);
        contours.into_iter().next().unwrap().points
    }

    #[test]
    fn test_circle_circularity_near_one() {
        let points = traced_circle(30);
        let area = contour_area(&points);
        let peri = contour_perimeter(&points);
        let circ = circularity(area, peri).unwrap();
        assert!(circ > 0.8, "circle circularity too low: {circ}");
        assert!(circ < 1.1, "circle circularity too high: {circ}");
    }

    #[test]
    fn test_square_circularity_near_pi_over_four() {
        // 40x40 filled square traced as a contour.
        let mut img = GrayImage::new(60, 60);
        for y in 10..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let contour = find_contours::<i32>(&img).into_iter().next().unwrap();
        let area = contour_area(&contour.points);
        let peri = contour_perimeter(&contour.points);
        let circ = circularity(area, peri).unwrap();
        let expected = std::f64::consts::PI / 4.0;
        assert!(
            (circ - expected).abs() < 0.12,
            "square circularity {circ} not near {expected}"
        );
    }

    #[test]
    fn test_circularity_scale_invariant() {
        let small = traced_circle(20);
        let large = traced_circle(40);
        let c_small =
            circularity(contour_area(&small), contour_perimeter(&small)).unwrap();
        let c_large =
            circularity(contour_area(&large), contour_perimeter(&large)).unwrap();
        assert!(
            (c_small - c_large).abs() < 0.08,
            "circularity not scale-invariant: {c_small} vs {c_large}"
        );
    }

    #[test]
    fn test_zero_perimeter_is_skipped() {
        assert!(circularity(100.0, 0.0).is_none());
    }

    #[test]
    fn test_bounding_box_of_contour() {
        let points = vec![
            IpPoint::new(3, 7),
            IpPoint::new(10, 7),
            IpPoint::new(10, 20),
            IpPoint::new(3, 20),
        ];
        let bbox = bounding_box(&points).unwrap();
        assert_eq!(bbox, BoundingBox { x: 3, y: 7, w: 8, h: 14 });
    }

    #[test]
    fn test_bounding_box_empty_contour() {
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_fill_polygon_strips_closing_point() {
        let points = vec![
            IpPoint::new(0, 0),
            IpPoint::new(5, 0),
            IpPoint::new(5, 5),
            IpPoint::new(0, 0),
        ];
        let poly = fill_polygon(&points);
        assert_eq!(poly.len(), 3);
        assert_ne!(poly.first(), poly.last());
    }
}
