//! # Video Processing Module
//!
//! Frame types, stream handles, and the single-file processor.

pub mod backend;
pub mod codec;
pub mod ffmpeg;
pub mod memory;
pub mod pattern;
pub mod processor;
pub mod types;

pub use backend::{OutputSpec, VideoBackend, VideoSink, VideoSource};
pub use codec::Codec;
pub use ffmpeg::FfmpegBackend;
pub use memory::{MemoryBackend, MemoryClip};
pub use processor::{ProcessOptions, ProcessSummary, VideoProcessor};
pub use types::{Frame, FrameRate, StreamInfo};
