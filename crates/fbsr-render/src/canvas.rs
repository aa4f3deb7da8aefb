//! Raster canvas: an RGBA image plus a world-to-pixel transform.
//!
//! All drawing calls take world (or panel) coordinates and are mapped
//! through the current [`Transform`]. Coverage is decided at pixel centres
//! and colors are alpha-blended over what is already there.

use fbsr_core::geometry::{Bounds, Position};
use image::{Rgba, RgbaImage};

use crate::font;

/// Axis-aligned affine map: `pixel = offset + local * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 1.0, 0.0, 0.0);

    pub const fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    pub fn apply(&self, p: Position) -> (f64, f64) {
        (
            self.offset_x + p.x * self.scale_x,
            self.offset_y + p.y * self.scale_y,
        )
    }

    /// Move the local origin to `(dx, dy)` in current local units.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            offset_x: self.offset_x + dx * self.scale_x,
            offset_y: self.offset_y + dy * self.scale_y,
            ..*self
        }
    }

    /// Scale local units by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            scale_x: self.scale_x * factor,
            scale_y: self.scale_y * factor,
            ..*self
        }
    }

    fn mean_scale(&self) -> f64 {
        (self.scale_x.abs() + self.scale_y.abs()) / 2.0
    }
}

pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    Rgba([r, g, b, a])
}

pub fn rgb(color: [u8; 3]) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

/// Same color with a different alpha.
pub fn with_alpha(color: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], alpha])
}

/// Brighten a color the way a UI "brighter" step does: scale up by 1/0.7.
pub fn brighter(color: Rgba<u8>) -> Rgba<u8> {
    let lift = |c: u8| ((c as f64 / 0.7).min(255.0)) as u8;
    Rgba([lift(color[0]), lift(color[1]), lift(color[2]), color[3]])
}

/// Source-over blend of `src` at `coverage` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f64) {
    let a = src[3] as f64 / 255.0 * coverage;
    if a <= 0.0 {
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = a + da * (1.0 - a);
    for c in 0..3 {
        let v = (src[c] as f64 * a + dst[c] as f64 * da * (1.0 - a)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Points along a cubic Bézier, both ends included.
pub fn cubic_points(p0: Position, p1: Position, p2: Position, p3: Position, segments: usize) -> Vec<Position> {
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            Position::new(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}

const CURVE_SEGMENTS: usize = 16;

fn segment_distance(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - a.0) * dx + (py - a.1) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    transform: Transform,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
            transform: Transform::IDENTITY,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    fn blend_at(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f64) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        blend(self.image.get_pixel_mut(x as u32, y as u32), color, coverage);
    }

    /// Pixel index range whose centres lie in `[lo, hi)`, clipped to `limit`.
    fn span(lo: f64, hi: f64, limit: u32) -> std::ops::Range<i64> {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let start = ((lo - 0.5).ceil() as i64).max(0);
        let end = ((hi - 0.5).ceil() as i64).min(limit as i64);
        start..end.max(start)
    }

    pub fn fill_rect(&mut self, bounds: Bounds, color: Rgba<u8>) {
        let (x0, y0) = self.transform.apply(Position::new(bounds.min_x(), bounds.min_y()));
        let (x1, y1) = self.transform.apply(Position::new(bounds.max_x(), bounds.max_y()));
        let xs = Self::span(x0, x1, self.width());
        for y in Self::span(y0, y1, self.height()) {
            for x in xs.clone() {
                self.blend_at(x, y, color, 1.0);
            }
        }
    }

    pub fn stroke_rect(&mut self, bounds: Bounds, width: f64, color: Rgba<u8>) {
        let corners = [
            Position::new(bounds.min_x(), bounds.min_y()),
            Position::new(bounds.max_x(), bounds.min_y()),
            Position::new(bounds.max_x(), bounds.max_y()),
            Position::new(bounds.min_x(), bounds.max_y()),
            Position::new(bounds.min_x(), bounds.min_y()),
        ];
        self.stroke_path(&corners, width, color);
    }

    pub fn line(&mut self, a: Position, b: Position, width: f64, color: Rgba<u8>) {
        self.stroke_path(&[a, b], width, color);
    }

    /// Stroke a polyline. Each pixel is painted at most once, so translucent
    /// strokes do not darken at the joints.
    pub fn stroke_path(&mut self, points: &[Position], width: f64, color: Rgba<u8>) {
        if points.is_empty() {
            return;
        }
        let pts: Vec<(f64, f64)> = points.iter().map(|p| self.transform.apply(*p)).collect();
        let half = (width * self.transform.mean_scale() / 2.0).max(0.5);

        let min_x = pts.iter().map(|p| p.0).fold(f64::INFINITY, f64::min) - half;
        let max_x = pts.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + half;
        let min_y = pts.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) - half;
        let max_y = pts.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) + half;

        let xs = Self::span(min_x, max_x + 1.0, self.width());
        for y in Self::span(min_y, max_y + 1.0, self.height()) {
            let cy = y as f64 + 0.5;
            for x in xs.clone() {
                let cx = x as f64 + 0.5;
                let hit = if pts.len() == 1 {
                    segment_distance(cx, cy, pts[0], pts[0]) <= half
                } else {
                    pts.windows(2)
                        .any(|w| segment_distance(cx, cy, w[0], w[1]) <= half)
                };
                if hit {
                    self.blend_at(x, y, color, 1.0);
                }
            }
        }
    }

    pub fn cubic(&mut self, p0: Position, p1: Position, p2: Position, p3: Position, width: f64, color: Rgba<u8>) {
        let points = cubic_points(p0, p1, p2, p3, CURVE_SEGMENTS);
        self.stroke_path(&points, width, color);
    }

    pub fn fill_circle(&mut self, center: Position, radius: f64, color: Rgba<u8>) {
        let (cx, cy) = self.transform.apply(center);
        let r = (radius * self.transform.mean_scale()).max(0.5);
        let xs = Self::span(cx - r, cx + r + 1.0, self.width());
        for y in Self::span(cy - r, cy + r + 1.0, self.height()) {
            for x in xs.clone() {
                let (dx, dy) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= r * r {
                    self.blend_at(x, y, color, 1.0);
                }
            }
        }
    }

    /// Draw the `src` region (`[x, y, w, h]` pixels) of `image` into
    /// `dst`, nearest-neighbour, multiplied by `alpha`.
    pub fn draw_image(&mut self, image: &RgbaImage, src: [u32; 4], dst: Bounds, alpha: f64) {
        let [sx, sy, sw, sh] = src;
        if sw == 0 || sh == 0 {
            return;
        }
        let (x0, y0) = self.transform.apply(Position::new(dst.min_x(), dst.min_y()));
        let (x1, y1) = self.transform.apply(Position::new(dst.max_x(), dst.max_y()));
        let (w, h) = (x1 - x0, y1 - y0);
        if w.abs() < f64::EPSILON || h.abs() < f64::EPSILON {
            return;
        }
        let xs = Self::span(x0, x1, self.width());
        for y in Self::span(y0, y1, self.height()) {
            let v = ((y as f64 + 0.5 - y0) / h * sh as f64).floor() as i64;
            let v = v.clamp(0, sh as i64 - 1) as u32;
            for x in xs.clone() {
                let u = ((x as f64 + 0.5 - x0) / w * sw as f64).floor() as i64;
                let u = u.clamp(0, sw as i64 - 1) as u32;
                let Some(texel) = image.get_pixel_checked(sx + u, sy + v) else {
                    continue;
                };
                self.blend_at(x, y, *texel, alpha);
            }
        }
    }

    /// Blend another full-size image over this one pixel for pixel,
    /// ignoring the transform.
    pub fn composite(&mut self, layer: &RgbaImage) {
        for (x, y, src) in layer.enumerate_pixels() {
            self.blend_at(x as i64, y as i64, *src, 1.0);
        }
    }

    /// Draw `text` with its baseline-left corner at `pos`, at font size
    /// `size` in local units.
    pub fn text(&mut self, pos: Position, size: f64, text: &str, color: Rgba<u8>) {
        let cell = font::cell_size(size);
        let top = pos.y - cell * font::GLYPH_HEIGHT as f64;
        for (i, ch) in text.chars().enumerate() {
            let left = pos.x + i as f64 * cell * font::ADVANCE as f64;
            for (row, bits) in font::glyph(ch).iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            Bounds::new(left + col as f64 * cell, top + row as f64 * cell, cell, cell),
                            color,
                        );
                    }
                }
            }
        }
    }
}

/// Halve the alpha of every pixel.
pub fn halve_alpha(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel[3] /= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn fill_rect_covers_pixel_centres() {
        let mut canvas = Canvas::new(8, 8, BLACK);
        canvas.set_transform(Transform::new(2.0, 2.0, 0.0, 0.0));
        canvas.fill_rect(Bounds::new(1.0, 1.0, 2.0, 1.0), WHITE);
        assert_eq!(canvas.pixel(2, 2), Some(WHITE));
        assert_eq!(canvas.pixel(5, 3), Some(WHITE));
        assert_eq!(canvas.pixel(6, 2), Some(BLACK));
        assert_eq!(canvas.pixel(2, 4), Some(BLACK));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut canvas = Canvas::new(1, 1, BLACK);
        canvas.fill_rect(Bounds::new(0.0, 0.0, 1.0, 1.0), rgba(255, 255, 255, 128));
        let px = canvas.pixel(0, 0).unwrap();
        assert!(px[0] > 120 && px[0] < 135);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn path_joints_are_painted_once() {
        let mut canvas = Canvas::new(10, 10, BLACK);
        let pts = [Position::new(1.0, 5.0), Position::new(5.0, 5.0), Position::new(9.0, 5.0)];
        canvas.stroke_path(&pts, 2.0, rgba(255, 0, 0, 100));
        let joint = canvas.pixel(5, 5).unwrap();
        let mid = canvas.pixel(3, 5).unwrap();
        assert_eq!(joint, mid);
    }

    #[test]
    fn image_is_scaled_into_bounds() {
        let mut src = RgbaImage::from_pixel(2, 2, WHITE);
        src.put_pixel(1, 1, rgba(255, 0, 0, 255));
        let mut canvas = Canvas::new(4, 4, BLACK);
        canvas.draw_image(&src, [0, 0, 2, 2], Bounds::new(0.0, 0.0, 4.0, 4.0), 1.0);
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        assert_eq!(canvas.pixel(3, 3), Some(rgba(255, 0, 0, 255)));
        assert_eq!(canvas.pixel(2, 2), Some(rgba(255, 0, 0, 255)));
    }

    #[test]
    fn text_marks_pixels() {
        let mut canvas = Canvas::new(40, 20, BLACK);
        canvas.text(Position::new(1.0, 15.0), 14.0, "01", WHITE);
        let lit = canvas.image().pixels().filter(|p| **p == WHITE).count();
        assert!(lit > 20);
    }

    #[test]
    fn cubic_ends_at_control_points() {
        let pts = cubic_points(
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(2.0, 1.0),
            Position::new(2.0, 2.0),
            16,
        );
        assert_eq!(pts.len(), 17);
        assert_eq!(pts[0], Position::new(0.0, 0.0));
        assert_eq!(pts[16], Position::new(2.0, 2.0));
    }

    #[test]
    fn halving_alpha() {
        let mut img = RgbaImage::from_pixel(1, 1, rgba(10, 10, 10, 200));
        halve_alpha(&mut img);
        assert_eq!(img.get_pixel(0, 0)[3], 100);
    }
}
