// SPDX-License-Identifier: GPL-3.0-only

//! Overlay canvas
//!
//! An RGBA pixel buffer matching the frame's native dimensions, with an
//! optional mirror transform applied to every mapped point. Mirroring is a
//! canvas-level transform, so coordinate math for landmarks never branches
//! on the mirror flag.

use crate::landmark::NormalizedLandmark;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{self, Blend};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pixel canvas the overlay renderer draws into
pub struct OverlayCanvas {
    buffer: Blend<RgbaImage>,
    mirrored: bool,
}

impl OverlayCanvas {
    /// Create an empty canvas; it is resized to the frame dimensions on the
    /// first drawn tick.
    pub fn new() -> Self {
        Self {
            buffer: Blend(RgbaImage::new(0, 0)),
            mirrored: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.0.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.0.height()
    }

    /// Resynchronize the pixel buffer to the frame's native dimensions.
    /// Reallocates only when the dimensions actually changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width() != width || self.height() != height {
            self.buffer = Blend(RgbaImage::new(width, height));
        }
    }

    /// Clear to fully transparent
    pub fn clear(&mut self) {
        for pixel in self.buffer.0.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// Apply or remove the mirror transform for subsequent strokes
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    /// Map a normalized landmark to canvas pixel space.
    ///
    /// `x` scales by the canvas width, `y` by the height; the mirror
    /// transform then reflects `x` across the canvas.
    pub fn map_point(&self, point: &NormalizedLandmark) -> (f32, f32) {
        let x = point.x * self.width() as f32;
        let y = point.y * self.height() as f32;
        if self.mirrored {
            (self.width() as f32 - x, y)
        } else {
            (x, y)
        }
    }

    /// Stroke a line segment between two normalized landmarks
    pub fn stroke(
        &mut self,
        start: &NormalizedLandmark,
        end: &NormalizedLandmark,
        color: Rgba<u8>,
        line_width: u32,
    ) {
        if self.width() == 0 || self.height() == 0 {
            return;
        }
        let (x0, y0) = self.map_point(start);
        let (x1, y1) = self.map_point(end);

        // Thickness by stepping parallel segments along the minor axis
        let horizontal = (x1 - x0).abs() >= (y1 - y0).abs();
        let half = (line_width.max(1) - 1) as f32 / 2.0;
        for step in 0..line_width.max(1) {
            let offset = step as f32 - half;
            let (ox, oy) = if horizontal { (0.0, offset) } else { (offset, 0.0) };
            drawing::draw_line_segment_mut(
                &mut self.buffer,
                (x0 + ox, y0 + oy),
                (x1 + ox, y1 + oy),
                color,
            );
        }
    }

    /// Sample a pixel (transparent outside the canvas)
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x < self.width() && y < self.height() {
            *self.buffer.0.get_pixel(x, y)
        } else {
            TRANSPARENT
        }
    }

    /// Raw RGBA bytes of the canvas
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.0.as_raw()
    }
}

impl Default for OverlayCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn point(x: f32, y: f32) -> NormalizedLandmark {
        NormalizedLandmark::new(x, y)
    }

    fn column_with_ink(canvas: &OverlayCanvas) -> Option<u32> {
        for x in 0..canvas.width() {
            for y in 0..canvas.height() {
                if canvas.pixel(x, y).0[3] != 0 {
                    return Some(x);
                }
            }
        }
        None
    }

    #[test]
    fn test_resize_and_clear() {
        let mut canvas = OverlayCanvas::new();
        assert_eq!((canvas.width(), canvas.height()), (0, 0));

        canvas.resize(8, 4);
        assert_eq!((canvas.width(), canvas.height()), (8, 4));

        canvas.stroke(&point(0.0, 0.5), &point(1.0, 0.5), RED, 1);
        assert!(column_with_ink(&canvas).is_some());

        canvas.clear();
        assert!(column_with_ink(&canvas).is_none());
    }

    #[test]
    fn test_unmirrored_point_maps_to_scaled_pixel() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(100, 50);

        let (x, y) = canvas.map_point(&point(0.1, 0.5));
        assert_eq!(x, 10.0);
        assert_eq!(y, 25.0);
    }

    #[test]
    fn test_mirror_reflects_drawn_column() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(100, 50);

        // Degenerate segment plots a single point at x = 0.1
        let p = point(0.1, 0.5);
        canvas.stroke(&p, &p, RED, 1);
        assert_eq!(column_with_ink(&canvas), Some(10));

        canvas.clear();
        canvas.set_mirrored(true);
        canvas.stroke(&p, &p, RED, 1);
        assert_eq!(column_with_ink(&canvas), Some(90));
    }

    #[test]
    fn test_mirror_leaves_rows_unchanged() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(100, 50);
        canvas.set_mirrored(true);

        let (_, y) = canvas.map_point(&point(0.1, 0.2));
        assert_eq!(y, 10.0);
    }

    #[test]
    fn test_thick_stroke_covers_more_rows() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(20, 20);

        canvas.stroke(&point(0.0, 0.5), &point(1.0, 0.5), RED, 3);
        let inked_rows: Vec<u32> = (0..20)
            .filter(|&y| (0..20).any(|x| canvas.pixel(x, y).0[3] != 0))
            .collect();
        assert!(inked_rows.len() >= 3, "expected 3 rows of ink, got {:?}", inked_rows);
    }

    #[test]
    fn test_translucent_strokes_blend() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(10, 10);

        let translucent = Rgba([255, 255, 255, 100]);
        let p0 = point(0.0, 0.5);
        let p1 = point(1.0, 0.5);
        canvas.stroke(&p0, &p1, translucent, 1);
        let first = canvas.pixel(5, 5).0[3];
        canvas.stroke(&p0, &p1, translucent, 1);
        let second = canvas.pixel(5, 5).0[3];
        assert!(second > first, "repeated translucent strokes should accumulate");
    }
}
