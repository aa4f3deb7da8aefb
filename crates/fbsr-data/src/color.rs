//! Item display colors derived from icons.
//!
//! Logistics overlays draw each item in a color sampled from its icon. The
//! color is computed on first use and memoized. Concurrent renders share one
//! cache; two threads racing on the same item compute the same value, so the
//! first insert wins and the other is discarded.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use image::RgbaImage;

/// Fallback for items without data or icon.
pub const MISSING_COLOR: [u8; 3] = [255, 0, 255];

const MIN_SATURATION: f32 = 0.25;
const MIN_BRIGHTNESS: f32 = 0.5;

#[derive(Debug, Default)]
pub struct ItemColorCache {
    colors: RwLock<HashMap<String, [u8; 3]>>,
}

impl ItemColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached color for `item`, computing it from `icon` on a miss.
    pub fn get_or_compute(&self, item: &str, icon: Option<&RgbaImage>) -> [u8; 3] {
        if let Some(color) = self
            .colors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(item)
        {
            return *color;
        }

        let color = match icon {
            Some(icon) => logistic_color(icon),
            None => {
                log::warn!("item missing for logistics: {item}");
                MISSING_COLOR
            }
        };
        *self
            .colors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(item.to_string())
            .or_insert(color)
    }

    pub fn len(&self) -> usize {
        self.colors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Average icon color, lifted to a minimum saturation and brightness so
/// that dark or grey items stay visible on the dark background.
pub fn logistic_color(icon: &RgbaImage) -> [u8; 3] {
    let [r, g, b] = average_color(icon);
    let (h, s, v) = rgb_to_hsb(r, g, b);
    hsb_to_rgb(h, s.max(MIN_SATURATION), v.max(MIN_BRIGHTNESS))
}

/// Alpha-weighted mean of all pixels. Fully transparent images average to black.
pub fn average_color(image: &RgbaImage) -> [u8; 3] {
    let mut sum = [0u64; 3];
    let mut weight = 0u64;
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u64;
        sum[0] += r as u64 * a;
        sum[1] += g as u64 * a;
        sum[2] += b as u64 * a;
        weight += a;
    }
    if weight == 0 {
        return [0, 0, 0];
    }
    sum.map(|c| (c / weight) as u8)
}

/// RGB to hue, saturation, brightness, each in `0..=1`.
pub fn rgb_to_hsb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let brightness = max;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    (hue, saturation, brightness)
}

pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> [u8; 3] {
    let h = (hue.rem_euclid(1.0)) * 6.0;
    let c = brightness * saturation;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = brightness - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r, g, b].map(|v| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn average_ignores_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([200, 100, 50, 255]));
        assert_eq!(average_color(&img), [200, 100, 50]);
    }

    #[test]
    fn hsb_round_trip_primary() {
        let (h, s, v) = rgb_to_hsb(255, 0, 0);
        assert_eq!((h, s, v), (0.0, 1.0, 1.0));
        assert_eq!(hsb_to_rgb(h, s, v), [255, 0, 0]);
        assert_eq!(hsb_to_rgb(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]);
    }

    #[test]
    fn dark_icons_are_lifted() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255]));
        let [r, g, b] = logistic_color(&img);
        let (_, s, v) = rgb_to_hsb(r, g, b);
        assert!(v >= 0.49);
        assert!(s >= 0.24);
    }

    #[test]
    fn cache_keeps_first_value() {
        let cache = ItemColorCache::new();
        let red = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let first = cache.get_or_compute("x", Some(&red));
        let second = cache.get_or_compute("x", Some(&blue));
        assert_eq!(first, second);
        assert_eq!(cache.get_or_compute("missing", None), MISSING_COLOR);
        assert_eq!(cache.len(), 2);
    }
}
