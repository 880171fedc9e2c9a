// src/transforms/pipeline.rs - Fixed-order composition of the transform stages

use std::sync::Arc;

use crate::{
    transforms::{Brightness, ColorShift, FlipMode, GaussianNoise, Rotation, Transform, TransformConfig},
    video::types::Frame,
};

/// Applies every configured transform to a frame, in a fixed order:
///
/// rotate → brightness → flip → noise → color shift
///
/// Stages whose parameters make them a no-op are skipped. Rotation always
/// runs, even at 0°, so every frame passes through the same resampling path.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    config: Arc<TransformConfig>,
    rotation: Rotation,
    brightness: Brightness,
    flip: FlipMode,
    noise: GaussianNoise,
    color_shift: ColorShift,
}

impl TransformPipeline {
    pub fn new(config: Arc<TransformConfig>) -> Self {
        Self {
            rotation: Rotation::new(config.angle),
            brightness: Brightness::new(config.brightness),
            flip: config.flip,
            noise: GaussianNoise::new(config.noise_std),
            color_shift: config.color_shift,
            config,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// The rotation stage on its own
    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Every stage in application order, including inactive ones
    pub fn stages(&self) -> [&dyn Transform; 5] {
        [
            &self.rotation,
            &self.brightness,
            &self.flip,
            &self.noise,
            &self.color_shift,
        ]
    }

    /// Stages that will actually run
    pub fn active_stages(&self) -> impl Iterator<Item = &dyn Transform> {
        self.stages().into_iter().filter(|stage| !stage.is_identity())
    }

    /// Names of the stages that will run, for logging
    pub fn describe(&self) -> String {
        self.active_stages()
            .map(|stage| stage.name())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// Raster size produced for a `width` x `height` input, without rendering
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        self.active_stages()
            .fold((width, height), |(w, h), stage| stage.output_dimensions(w, h))
    }

    /// Run the frame through every active stage
    pub fn apply(&self, frame: &Frame) -> Frame {
        let mut stages = self.active_stages();
        let Some(first) = stages.next() else {
            return frame.clone();
        };

        let mut current = first.apply(frame);
        for stage in stages {
            current = stage.apply(&current);
        }
        current
    }
}
