use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TransformError},
    transforms::{ColorShift, FlipMode},
    video::types::Frame,
};

/// Core trait implemented by every pipeline stage
pub trait Transform: Send + Sync {
    /// Returns the unique name of this stage
    fn name(&self) -> &str;

    /// Map `frame` to a new frame
    ///
    /// Implementations never modify their input; every sample of the result
    /// is a valid 8-bit value.
    fn apply(&self, frame: &Frame) -> Frame;

    /// Whether `apply` would return its input unchanged
    ///
    /// The pipeline skips identity stages entirely.
    fn is_identity(&self) -> bool {
        false
    }

    /// Raster size of the result for a `width` x `height` input
    fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        (width, height)
    }
}

/// Parameters of every transform, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Rotation angle in degrees, counter-clockwise positive
    pub angle: f64,

    /// Brightness factor (1.0 = unchanged)
    pub brightness: f64,

    /// Mirror axis
    pub flip: FlipMode,

    /// Standard deviation of the Gaussian noise (0 = no noise)
    pub noise_std: f64,

    /// Per-channel offsets
    pub color_shift: ColorShift,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            angle: 0.0,
            brightness: 1.0,
            flip: FlipMode::None,
            noise_std: 0.0,
            color_shift: ColorShift::default(),
        }
    }
}

impl TransformConfig {
    /// Check every parameter is within its domain
    pub fn validate(&self) -> Result<()> {
        if !self.angle.is_finite() {
            return Err(invalid("angle", self.angle));
        }

        if !self.brightness.is_finite() || self.brightness <= 0.0 {
            return Err(invalid("brightness", self.brightness));
        }

        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(invalid("noise_std", self.noise_std));
        }

        Ok(())
    }
}

fn invalid(name: &str, value: f64) -> crate::error::TransformerError {
    TransformError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
    .into()
}
