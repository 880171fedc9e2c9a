use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{transforms::Transform, video::types::Frame};

/// Adds zero-mean Gaussian noise to every sample
///
/// One independent draw per channel per pixel, truncated toward zero and
/// added as a signed value before clamping to [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise {
    std_dev: f64,
}

impl GaussianNoise {
    pub fn new(std_dev: f64) -> Self {
        Self { std_dev }
    }

    /// Apply the noise with draws taken from `rng`
    ///
    /// Seeding `rng` makes the result reproducible.
    pub fn apply_with_rng<R: Rng + ?Sized>(&self, frame: &Frame, rng: &mut R) -> Frame {
        let normal = match Normal::new(0.0, self.std_dev) {
            Ok(normal) if !self.is_identity() => normal,
            _ => return frame.clone(),
        };

        let data = frame
            .as_rgb_bytes()
            .iter()
            .map(|&sample| {
                let offset = normal.sample(rng) as i32;
                (sample as i32 + offset).clamp(0, 255) as u8
            })
            .collect();

        Frame::from_rgb_bytes(frame.width(), frame.height(), data)
            .unwrap_or_else(|| frame.clone())
    }
}

impl Transform for GaussianNoise {
    fn name(&self) -> &str {
        "noise"
    }

    fn is_identity(&self) -> bool {
        self.std_dev.is_nan() || self.std_dev <= 0.0
    }

    fn apply(&self, frame: &Frame) -> Frame {
        let mut rng = SmallRng::from_entropy();
        self.apply_with_rng(frame, &mut rng)
    }
}
