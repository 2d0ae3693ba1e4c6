//! Frame annotation: the counting line and one box per detection.

use image::{Rgb, RgbImage};

use super::frame::Frame;
use crate::counting::{Detection, Point};

const LINE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TRACKED_COLOR: Rgb<u8> = Rgb([0, 200, 255]);
const UNTRACKED_COLOR: Rgb<u8> = Rgb([160, 160, 160]);

#[derive(Debug, Clone)]
pub struct Annotator {
    line_start: Point,
    line_end: Point,
    thickness: u32,
}

impl Annotator {
    pub fn new(line_start: Point, line_end: Point, thickness: u32) -> Self {
        Self {
            line_start,
            line_end,
            thickness: thickness.max(1),
        }
    }

    pub fn annotate(&self, frame: &mut Frame, detections: &[Detection]) {
        let img = frame.image_mut();
        draw_segment(img, self.line_start, self.line_end, self.thickness, LINE_COLOR);

        for d in detections {
            let color = if d.track_id.is_some() {
                TRACKED_COLOR
            } else {
                UNTRACKED_COLOR
            };
            let b = d.bbox;
            let corners = [
                Point::new(b.x1, b.y1),
                Point::new(b.x2, b.y1),
                Point::new(b.x2, b.y2),
                Point::new(b.x1, b.y2),
            ];
            for i in 0..4 {
                draw_segment(img, corners[i], corners[(i + 1) % 4], self.thickness, color);
            }
        }
    }
}

fn stamp(img: &mut RgbImage, x: i64, y: i64, thickness: u32, color: Rgb<u8>) {
    let half = (thickness / 2) as i64;
    let (w, h) = (img.width() as i64, img.height() as i64);
    for dy in -half..=half {
        for dx in -half..=half {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && px < w && py < h {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Clips `a -> b` to the box `[lo, hi]` on both axes (Liang-Barsky).
/// Returns `None` for non-finite input or when nothing of the segment is left.
fn clip_segment(a: Point, b: Point, lo: (f64, f64), hi: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
    let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
    if ![ax, ay, bx, by].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (bx - ax, by - ay);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [(-dx, ax - lo.0), (dx, hi.0 - ax), (-dy, ay - lo.1), (dy, hi.1 - ay)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    // rounding at extreme magnitudes can land slightly outside the box
    let at = |t: f64| ((ax + t * dx).clamp(lo.0, hi.0), (ay + t * dy).clamp(lo.1, hi.1));
    Some((at(t0), at(t1)))
}

// Bresenham over the part of the segment that can touch the image.
fn draw_segment(img: &mut RgbImage, a: Point, b: Point, thickness: u32, color: Rgb<u8>) {
    let margin = thickness as f64;
    let lo = (-margin, -margin);
    let hi = (img.width() as f64 + margin, img.height() as f64 + margin);
    let Some(((ax, ay), (bx, by))) = clip_segment(a, b, lo, hi) else {
        return;
    };

    let (mut x0, mut y0) = (ax.round() as i64, ay.round() as i64);
    let (x1, y1) = (bx.round() as i64, by.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(img, x0, y0, thickness, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
