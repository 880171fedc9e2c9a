use serde::{Deserialize, Serialize};

use crate::{transforms::Transform, video::types::Frame};

/// Signed per-channel offsets
///
/// Offsets are given in blue, green, red order, matching the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorShift {
    pub blue: i32,
    pub green: i32,
    pub red: i32,
}

impl ColorShift {
    pub fn new(blue: i32, green: i32, red: i32) -> Self {
        Self { blue, green, red }
    }

    /// The opposite shift
    pub fn negated(&self) -> Self {
        Self::new(
            self.blue.saturating_neg(),
            self.green.saturating_neg(),
            self.red.saturating_neg(),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.blue == 0 && self.green == 0 && self.red == 0
    }

    /// Offsets in the frame's R, G, B sample order
    fn rgb_offsets(&self) -> [i64; 3] {
        [self.red as i64, self.green as i64, self.blue as i64]
    }
}

impl Transform for ColorShift {
    fn name(&self) -> &str {
        "color_shift"
    }

    fn is_identity(&self) -> bool {
        self.is_zero()
    }

    fn apply(&self, frame: &Frame) -> Frame {
        let offsets = self.rgb_offsets();
        let data = frame
            .as_rgb_bytes()
            .chunks_exact(3)
            .flat_map(|pixel| {
                let mut shifted = [0u8; 3];
                for channel in 0..3 {
                    shifted[channel] =
                        (pixel[channel] as i64 + offsets[channel]).clamp(0, 255) as u8;
                }
                shifted
            })
            .collect();

        Frame::from_rgb_bytes(frame.width(), frame.height(), data)
            .unwrap_or_else(|| frame.clone())
    }
}
