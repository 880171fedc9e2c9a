//! # Video Transformer
//!
//! Batch video frame transformation: rotate, brighten, mirror, add Gaussian
//! noise and shift color channels, for a single file or a whole folder at once.
//!
//! Every frame of an input video flows through a fixed pipeline of stages and
//! is written to an output video with the same frame rate. Folder mode runs one
//! independent job per file on a worker pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use video_transformer::{
//!     transforms::TransformConfig,
//!     video::{FfmpegBackend, ProcessOptions, VideoProcessor},
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = TransformConfig {
//!     angle: 45.0,
//!     brightness: 1.2,
//!     ..Default::default()
//! };
//!
//! let processor = VideoProcessor::new(
//!     Arc::new(FfmpegBackend::new()),
//!     Arc::new(config),
//!     ProcessOptions::default(),
//! );
//! processor.process_file(Path::new("input.avi"), Path::new("output.avi"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`transforms`] - Per-frame transform stages and the pipeline
//! - [`video`] - Frames, stream backends and the single-file processor
//! - [`batch`] - Folder discovery and parallel dispatch
//! - [`config`] - Configuration management
//!
//! ## Custom Backends
//!
//! Decoding and encoding go through the [`VideoBackend`](video::VideoBackend)
//! trait. [`FfmpegBackend`](video::FfmpegBackend) drives the `ffmpeg` and
//! `ffprobe` executables; [`MemoryBackend`](video::MemoryBackend) keeps clips
//! in memory for tests.

pub mod batch;
pub mod config;
pub mod error;
pub mod transforms;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    batch::{BatchDispatcher, BatchReport},
    config::Config,
    error::{Result, TransformerError},
    transforms::{Transform, TransformConfig, TransformPipeline},
    video::VideoProcessor,
};
