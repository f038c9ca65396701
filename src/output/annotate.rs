use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detector::DetectionResult;

const CALM: Rgb<u8> = Rgb([0, 220, 0]);
const ALERT: Rgb<u8> = Rgb([230, 0, 0]);
const THICKNESS: u32 = 3;

/// Copy of `frame` with the silhouette box drawn on it.
///
/// The box turns red and the frame gets a red border while `alert_active`.
pub fn annotate(frame: &RgbImage, result: &DetectionResult, alert_active: bool) -> RgbImage {
    let mut canvas = frame.clone();
    let color = if alert_active { ALERT } else { CALM };

    if let Some(bbox) = result.bounding_box {
        draw_frame(&mut canvas, bbox.x, bbox.y, bbox.width, bbox.height, color);
    }
    if alert_active {
        let (width, height) = canvas.dimensions();
        draw_frame(&mut canvas, 0, 0, width, height, ALERT);
    }

    canvas
}

/// Nested hollow rectangles growing inwards.
fn draw_frame(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for inset in 0..THICKNESS {
        if width <= 2 * inset || height <= 2 * inset {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32)
            .of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
