//! # Frame Transforms
//!
//! Pure frame-to-frame transforms and the pipeline that chains them.
//!
//! ## Built-in Transforms
//!
//! - **Rotation**: rotate about the centre onto an enlarged canvas, black corners
//! - **Brightness**: scale every sample, saturating at 255
//! - **Flip**: mirror horizontally, vertically or both
//! - **Gaussian noise**: independent zero-mean noise per sample
//! - **Color shift**: signed offset per channel, saturating
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use video_transformer::transforms::{TransformConfig, TransformPipeline};
//! use video_transformer::video::Frame;
//!
//! let config = TransformConfig { angle: 90.0, ..Default::default() };
//! let pipeline = TransformPipeline::new(Arc::new(config));
//!
//! let rotated = pipeline.apply(&Frame::new_black(64, 48));
//! assert_eq!(rotated.dimensions(), (48, 64));
//! ```

pub mod pipeline;
pub mod traits;

// Transform implementations
pub mod brightness;
pub mod color_shift;
pub mod flip;
pub mod noise;
pub mod rotate;

// Re-exports for convenience
pub use pipeline::TransformPipeline;
pub use traits::{Transform, TransformConfig};

pub use brightness::Brightness;
pub use color_shift::ColorShift;
pub use flip::FlipMode;
pub use noise::GaussianNoise;
pub use rotate::Rotation;
