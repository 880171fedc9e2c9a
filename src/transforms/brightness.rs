use crate::{transforms::Transform, video::types::Frame};

/// Scales every sample by a constant factor
///
/// `out = clamp(round(v * factor), 0, 255)`, evaluated once per possible
/// sample value into a lookup table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brightness {
    factor: f64,
}

impl Brightness {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    fn lookup_table(&self) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = (value as f64 * self.factor).round().clamp(0.0, 255.0) as u8;
        }
        table
    }
}

impl Transform for Brightness {
    fn name(&self) -> &str {
        "brightness"
    }

    fn is_identity(&self) -> bool {
        self.factor == 1.0
    }

    fn apply(&self, frame: &Frame) -> Frame {
        let table = self.lookup_table();
        let data = frame
            .as_rgb_bytes()
            .iter()
            .map(|&sample| table[sample as usize])
            .collect();

        Frame::from_rgb_bytes(frame.width(), frame.height(), data)
            .unwrap_or_else(|| frame.clone())
    }
}
