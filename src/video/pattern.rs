//! Synthetic test frames.

use crate::video::types::Frame;

/// Frame `index` of a `total`-frame test clip
///
/// The background hue sweeps once around the color wheel over the clip, and a
/// white marker in the top-left quadrant makes orientation changes visible.
pub fn test_pattern(width: u32, height: u32, index: usize, total: usize) -> Frame {
    let hue = (index as f32 / total.max(1) as f32) * 360.0;
    let background = hsv_to_rgb(hue, 0.7, 0.9);
    let marker_w = (width / 4).max(1);
    let marker_h = (height / 4).max(1);

    Frame::from_fn(width, height, |x, y| {
        if x < marker_w && y < marker_h {
            [255, 255, 255]
        } else {
            background
        }
    })
}

/// Convert HSV (hue in degrees, saturation/value in 0..=1) to RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}
