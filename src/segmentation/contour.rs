use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;

use super::types::{BoundingBox, Silhouette};

/// Largest outermost foreground region of a binary mask, by enclosed area.
///
/// Holes and regions nested inside holes are ignored. Ties keep the first
/// region found in raster order.
pub fn largest_region(mask: &GrayImage) -> Option<Silhouette> {
    let contours: Vec<Contour<u32>> = find_contours(mask);

    let mut best: Option<Silhouette> = None;
    for contour in contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
    {
        let Some(bbox) = bounding_rect(&contour.points) else {
            continue;
        };
        let area = polygon_area(&contour.points);
        if best.map_or(true, |b| area > b.area) {
            best = Some(Silhouette { bbox, area });
        }
    }

    best
}

/// Smallest upright rectangle containing every point, inclusive of the edge pixels.
pub fn bounding_rect(points: &[Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Shoelace area of the closed polygon through the points.
pub fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum();

    twice.abs() / 2.0
}
