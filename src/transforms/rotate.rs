// src/transforms/rotate.rs - Rotation onto an enlarged canvas

use rayon::prelude::*;

use crate::{transforms::Transform, video::types::Frame};

/// Rotates a frame about its centre without cropping
///
/// The canvas grows to the bounding box of the rotated source and the image is
/// re-centred on it. Samples are bilinear over the inverse mapping; anything
/// outside the source reads as black, so exposed corners come out black and
/// edge pixels blend into that border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    angle: f64,
}

impl Rotation {
    /// `angle` in degrees, counter-clockwise positive
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }

    /// `(sin, cos)` of the angle, reduced mod 360 first so right angles
    /// stay as exact as floating point allows
    fn sin_cos(&self) -> (f64, f64) {
        self.angle.rem_euclid(360.0).to_radians().sin_cos()
    }
}

impl Transform for Rotation {
    fn name(&self) -> &str {
        "rotate"
    }

    fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let (sin, cos) = self.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let (w, h) = (width as f64, height as f64);

        let new_w = (w * cos + h * sin).round().max(1.0);
        let new_h = (h * cos + w * sin).round().max(1.0);
        (new_w as u32, new_h as u32)
    }

    fn apply(&self, frame: &Frame) -> Frame {
        let (src_w, src_h) = frame.dimensions();
        let (dst_w, dst_h) = self.output_dimensions(src_w, src_h);
        let (sin, cos) = self.sin_cos();

        let src = frame.as_rgb_bytes();
        let src_stride = src_w as usize * 3;
        let (cx, cy) = (src_w as f64 / 2.0, src_h as f64 / 2.0);
        let (dcx, dcy) = (dst_w as f64 / 2.0, dst_h as f64 / 2.0);

        // Neighbour sample, black outside the source
        let texel = |x: i64, y: i64, channel: usize| -> f64 {
            if x < 0 || y < 0 || x >= src_w as i64 || y >= src_h as i64 {
                0.0
            } else {
                src[y as usize * src_stride + x as usize * 3 + channel] as f64
            }
        };

        let mut out = vec![0u8; Frame::byte_len(dst_w, dst_h)];
        out.par_chunks_mut(dst_w as usize * 3)
            .enumerate()
            .for_each(|(dy, row)| {
                let v = dy as f64 - dcy;
                for dx in 0..dst_w as usize {
                    let u = dx as f64 - dcx;

                    // Inverse of the forward map [[cos, sin], [-sin, cos]]
                    let sx = cos * u - sin * v + cx;
                    let sy = sin * u + cos * v + cy;

                    let x0 = sx.floor();
                    let y0 = sy.floor();
                    if x0 < -1.0 || y0 < -1.0 || x0 >= src_w as f64 || y0 >= src_h as f64 {
                        continue;
                    }

                    let (fx, fy) = (sx - x0, sy - y0);
                    let (x0, y0) = (x0 as i64, y0 as i64);
                    let pixel = &mut row[dx * 3..dx * 3 + 3];

                    for (channel, sample) in pixel.iter_mut().enumerate() {
                        let top = texel(x0, y0, channel) * (1.0 - fx)
                            + texel(x0 + 1, y0, channel) * fx;
                        let bottom = texel(x0, y0 + 1, channel) * (1.0 - fx)
                            + texel(x0 + 1, y0 + 1, channel) * fx;
                        let value = top * (1.0 - fy) + bottom * fy;
                        *sample = value.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });

        Frame::from_rgb_bytes(dst_w, dst_h, out)
            .unwrap_or_else(|| Frame::new_black(dst_w, dst_h))
    }
}
