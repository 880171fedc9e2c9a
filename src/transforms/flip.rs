use serde::{Deserialize, Serialize};

use crate::{transforms::Transform, video::types::Frame};

/// Mirror axis
///
/// On the command line these are the numeric flip codes `1` (horizontal),
/// `0` (vertical) and `-1` (both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    #[default]
    None,
    /// Mirror left/right
    Horizontal,
    /// Mirror top/bottom
    Vertical,
    /// Mirror around both axes
    Both,
}

impl FlipMode {
    /// Map a numeric flip code to a mode
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Horizontal),
            0 => Some(Self::Vertical),
            -1 => Some(Self::Both),
            _ => None,
        }
    }
}

impl Transform for FlipMode {
    fn name(&self) -> &str {
        "flip"
    }

    fn is_identity(&self) -> bool {
        *self == FlipMode::None
    }

    fn apply(&self, frame: &Frame) -> Frame {
        let image = frame.as_image();
        match self {
            FlipMode::None => frame.clone(),
            FlipMode::Horizontal => Frame::new(image::imageops::flip_horizontal(image)),
            FlipMode::Vertical => Frame::new(image::imageops::flip_vertical(image)),
            // Horizontal followed by vertical is a half turn
            FlipMode::Both => Frame::new(image::imageops::rotate180(image)),
        }
    }
}
