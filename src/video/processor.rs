// src/video/processor.rs - Transform one video file into another

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, VideoError};
use crate::transforms::{Transform, TransformConfig, TransformPipeline};
use crate::video::backend::{OutputSpec, VideoBackend};
use crate::video::codec::Codec;
use crate::video::types::{Frame, FrameRate};

/// Encoding options shared by every file in a run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    pub codec: Codec,

    /// Frames between progress lines
    pub progress_interval: u64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            progress_interval: 10,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub output: PathBuf,
    pub frames_written: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub elapsed: Duration,
}

/// Applies a transform pipeline to every frame of a video file
pub struct VideoProcessor {
    backend: Arc<dyn VideoBackend>,
    pipeline: TransformPipeline,
    options: ProcessOptions,
}

impl VideoProcessor {
    pub fn new(
        backend: Arc<dyn VideoBackend>,
        config: Arc<TransformConfig>,
        options: ProcessOptions,
    ) -> Self {
        Self {
            backend,
            pipeline: TransformPipeline::new(config),
            options,
        }
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    /// Transform `input` into `output`
    ///
    /// The output keeps the input frame rate; its raster is the rotated
    /// size of the first frame. Missing parent directories of `output` are
    /// created. Both streams are released on every return path.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<ProcessSummary> {
        let started = Instant::now();
        info!("Processing {} → {}", input.display(), output.display());
        reject_same_file(input, output)?;

        let mut source = self.backend.open_source(input)?;
        let info = source.info().clone();

        let first = source.read_frame()?.ok_or_else(|| VideoError::EmptyStream {
            path: input.display().to_string(),
        })?;
        let (width, height) = self.pipeline.rotation().apply(&first).dimensions();
        let config = self.pipeline.config();
        debug!(
            "{}: {}x{} → {}x{} ({}; angle {}, brightness {}, noise {})",
            input.display(),
            info.width,
            info.height,
            width,
            height,
            self.pipeline.describe(),
            config.angle,
            config.brightness,
            config.noise_std
        );

        ensure_parent_dir(output)?;
        let spec = OutputSpec {
            width,
            height,
            frame_rate: info.frame_rate,
            codec: self.options.codec.clone(),
        };
        let mut sink = self.backend.open_sink(output, &spec)?;
        source.rewind()?;

        let interval = self.options.progress_interval.max(1);
        let mut frames_written = 0u64;
        while let Some(frame) = source.read_frame()? {
            let transformed = conform(self.pipeline.apply(&frame), width, height);
            sink.write_frame(&transformed)?;

            frames_written += 1;
            if frames_written % interval == 0 {
                report_progress(frames_written, info.frame_count);
            }
        }

        sink.finish()?;
        drop(source);

        let elapsed = started.elapsed();
        info!("Transformed video saved to: {}", output.display());
        debug!(
            "{} frames in {:.2}s",
            frames_written,
            elapsed.as_secs_f64()
        );

        Ok(ProcessSummary {
            output: output.to_path_buf(),
            frames_written,
            width,
            height,
            frame_rate: info.frame_rate,
            elapsed,
        })
    }
}

/// Resample `frame` to the committed output size if a stage changed it
fn conform(frame: Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        debug!(
            "Resizing {}x{} frame to {}x{}",
            frame.width(),
            frame.height(),
            width,
            height
        );
        frame.resized(width, height)
    }
}

fn report_progress(done: u64, total: Option<u64>) {
    match total {
        Some(total) => info!("Processing: {:.1}%", done as f64 / total as f64 * 100.0),
        None => info!("Processing: {} frames", done),
    }
}

/// Refuse to encode over the input, which the encoder would truncate
/// before the source is read back from the start
fn reject_same_file(input: &Path, output: &Path) -> Result<()> {
    let (Ok(input), Ok(output)) = (std::fs::canonicalize(input), std::fs::canonicalize(output)) else {
        return Ok(());
    };
    if input == output {
        return Err(VideoError::EncodeFailed {
            path: output.display().to_string(),
            reason: "output would overwrite the input".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Create the parent directory of `output`; a bare filename needs none
fn ensure_parent_dir(output: &Path) -> Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                VideoError::EncodeFailed {
                    path: output.display().to_string(),
                    reason: format!("cannot create {}: {}", parent.display(), e),
                }
                .into()
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformerError;
    use crate::transforms::{ColorShift, FlipMode};
    use crate::video::memory::{MemoryBackend, MemoryClip};
    use crate::video::backend::{VideoSink, VideoSource};
    use crate::video::pattern::test_pattern;
    use crate::video::types::StreamInfo;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn synthetic_clip(frames: usize, width: u32, height: u32, fps: u32) -> MemoryClip {
        let frames = (0..frames)
            .map(|i| test_pattern(width, height, i, frames))
            .collect();
        MemoryClip::new(frames, FrameRate::new(fps, 1).unwrap())
    }

    fn processor(backend: &MemoryBackend, config: TransformConfig) -> VideoProcessor {
        VideoProcessor::new(
            Arc::new(backend.clone()),
            Arc::new(config),
            ProcessOptions::default(),
        )
    }

    #[test]
    fn test_rotating_ninety_degrees_swaps_output_raster() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let backend = MemoryBackend::new();
        backend.insert_source(&input, synthetic_clip(10, 64, 48, 30));

        let config = TransformConfig {
            angle: 90.0,
            ..Default::default()
        };
        let summary = processor(&backend, config).process_file(&input, &output).unwrap();

        assert_eq!(summary.frames_written, 10);
        assert_eq!((summary.width, summary.height), (48, 64));

        let written = backend.output(&output).unwrap();
        assert_eq!(written.frame_count(), 10);
        assert_eq!((written.width, written.height), (48, 64));
        assert_eq!(written.frame_rate.as_f64(), 30.0);
        assert!(written.frames.iter().all(|f| f.dimensions() == (48, 64)));
    }

    #[test]
    fn test_frames_are_written_in_source_order() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let backend = MemoryBackend::new();
        let clip = synthetic_clip(5, 16, 12, 25);
        backend.insert_source(&input, clip.clone());

        processor(&backend, TransformConfig::default())
            .process_file(&input, &output)
            .unwrap();

        // Angle 0 with nothing else active reproduces each frame
        assert_eq!(backend.output(&output).unwrap().frames, clip.frames);
    }

    #[test]
    fn test_every_stage_applied_per_frame() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let backend = MemoryBackend::new();
        backend.insert_source(
            &input,
            MemoryClip::new(vec![Frame::new_filled(8, 6, [100, 100, 100]); 3], FrameRate::new(30, 1).unwrap()),
        );

        let config = TransformConfig {
            brightness: 1.5,
            flip: FlipMode::Horizontal,
            color_shift: ColorShift::new(5, 0, -50),
            ..Default::default()
        };
        processor(&backend, config).process_file(&input, &output).unwrap();

        let written = backend.output(&output).unwrap();
        for frame in &written.frames {
            assert_eq!(frame.get_pixel(3, 3), [100, 150, 155]);
        }
    }

    #[test]
    fn test_missing_input_is_open_failure() {
        let backend = MemoryBackend::new();
        let err = processor(&backend, TransformConfig::default())
            .process_file(Path::new("nope.avi"), Path::new("out.avi"))
            .unwrap_err();

        assert!(matches!(err, TransformerError::Video(VideoError::OpenFailed { .. })));
        assert!(backend.output_paths().is_empty());
    }

    #[test]
    fn test_empty_stream_is_reported() {
        let backend = MemoryBackend::new();
        backend.insert_source("empty.avi", MemoryClip::new(Vec::new(), FrameRate::new(30, 1).unwrap()));

        let err = processor(&backend, TransformConfig::default())
            .process_file(Path::new("empty.avi"), Path::new("out.avi"))
            .unwrap_err();

        assert!(matches!(err, TransformerError::Video(VideoError::EmptyStream { .. })));
        assert!(backend.output_paths().is_empty());
    }

    #[test]
    fn test_creates_missing_output_directories() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("nested").join("deeper").join("out.avi");

        let backend = MemoryBackend::new();
        backend.insert_source(&input, synthetic_clip(2, 8, 8, 30));

        processor(&backend, TransformConfig::default())
            .process_file(&input, &output)
            .unwrap();

        assert!(output.parent().unwrap().is_dir());
        assert!(backend.output(&output).is_some());
    }

    #[test]
    fn test_frames_of_another_size_are_resampled() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let backend = MemoryBackend::new();
        let frames = vec![
            Frame::new_filled(8, 6, [10, 20, 30]),
            Frame::new_filled(12, 10, [10, 20, 30]),
            Frame::new_filled(4, 4, [10, 20, 30]),
            Frame::new_filled(8, 6, [10, 20, 30]),
        ];
        backend.insert_source(&input, MemoryClip::new(frames, FrameRate::new(25, 1).unwrap()));

        let summary = processor(&backend, TransformConfig::default())
            .process_file(&input, &output)
            .unwrap();

        assert_eq!(summary.frames_written, 4);
        let written = backend.output(&output).unwrap();
        assert_eq!(written.frame_count(), 4);
        assert!(written.frames.iter().all(|f| f.dimensions() == (8, 6)));
    }

    #[test]
    fn test_refuses_to_overwrite_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        std::fs::write(&input, b"clip").unwrap();

        let backend = MemoryBackend::new();
        backend.insert_source(&input, synthetic_clip(2, 8, 8, 30));
        let processor = processor(&backend, TransformConfig::default());

        for output in [input.clone(), dir.path().join(".").join("in.avi")] {
            let err = processor.process_file(&input, &output).unwrap_err();
            assert!(matches!(err, TransformerError::Video(VideoError::EncodeFailed { .. })));
        }
        assert!(backend.output_paths().is_empty());
        assert_eq!(std::fs::read(&input).unwrap(), b"clip");
    }

    /// Wraps the memory backend; the sink fails on frame `fail_at`, or
    /// cannot be opened at all when `fail_at` is `None`
    struct FailingBackend {
        inner: MemoryBackend,
        fail_at: Option<usize>,
        source_dropped: Arc<AtomicBool>,
        sink_dropped: Arc<AtomicBool>,
    }

    impl FailingBackend {
        fn new(inner: MemoryBackend, fail_at: Option<usize>) -> Self {
            Self {
                inner,
                fail_at,
                source_dropped: Arc::new(AtomicBool::new(false)),
                sink_dropped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl VideoBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
            Ok(Box::new(TrackedSource {
                inner: self.inner.open_source(path)?,
                dropped: Arc::clone(&self.source_dropped),
            }))
        }

        fn open_sink(&self, path: &Path, spec: &OutputSpec) -> Result<Box<dyn VideoSink>> {
            let Some(fail_at) = self.fail_at else {
                return Err(VideoError::EncodeFailed {
                    path: path.display().to_string(),
                    reason: "encoder refused".to_string(),
                }
                .into());
            };
            Ok(Box::new(FailingSink {
                inner: Some(self.inner.open_sink(path, spec)?),
                written: 0,
                fail_at,
                dropped: Arc::clone(&self.sink_dropped),
            }))
        }
    }

    struct TrackedSource {
        inner: Box<dyn VideoSource>,
        dropped: Arc<AtomicBool>,
    }

    impl VideoSource for TrackedSource {
        fn info(&self) -> &StreamInfo {
            self.inner.info()
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            self.inner.read_frame()
        }

        fn rewind(&mut self) -> Result<()> {
            self.inner.rewind()
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    struct FailingSink {
        inner: Option<Box<dyn VideoSink>>,
        written: usize,
        fail_at: usize,
        dropped: Arc<AtomicBool>,
    }

    impl VideoSink for FailingSink {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            if self.written == self.fail_at {
                return Err(VideoError::EncodeFailed {
                    path: "out.avi".to_string(),
                    reason: "disk full".to_string(),
                }
                .into());
            }
            self.written += 1;
            match self.inner.as_mut() {
                Some(inner) => inner.write_frame(frame),
                None => Ok(()),
            }
        }

        fn finish(mut self: Box<Self>) -> Result<()> {
            match self.inner.take() {
                Some(inner) => inner.finish(),
                None => Ok(()),
            }
        }
    }

    impl Drop for FailingSink {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_write_failure_releases_both_streams() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let memory = MemoryBackend::new();
        memory.insert_source(&input, synthetic_clip(5, 8, 8, 30));
        let backend = Arc::new(FailingBackend::new(memory.clone(), Some(3)));

        let processor = VideoProcessor::new(
            backend.clone(),
            Arc::new(TransformConfig::default()),
            ProcessOptions::default(),
        );
        let err = processor.process_file(&input, &output).unwrap_err();

        assert!(matches!(err, TransformerError::Video(VideoError::EncodeFailed { .. })));
        assert!(backend.source_dropped.load(Ordering::SeqCst));
        assert!(backend.sink_dropped.load(Ordering::SeqCst));
        assert!(memory.output(&output).is_none());
    }

    #[test]
    fn test_sink_open_failure_releases_source() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        let output = dir.path().join("out.avi");

        let memory = MemoryBackend::new();
        memory.insert_source(&input, synthetic_clip(3, 8, 8, 30));
        let backend = Arc::new(FailingBackend::new(memory.clone(), None));

        let processor = VideoProcessor::new(
            backend.clone(),
            Arc::new(TransformConfig::default()),
            ProcessOptions::default(),
        );
        let err = processor.process_file(&input, &output).unwrap_err();

        assert!(matches!(err, TransformerError::Video(VideoError::EncodeFailed { .. })));
        assert!(backend.source_dropped.load(Ordering::SeqCst));
        assert!(memory.output_paths().is_empty());
    }

    #[test]
    fn test_conform_resizes_only_mismatched_frames() {
        let frame = Frame::new_filled(10, 10, [1, 2, 3]);
        assert_eq!(conform(frame.clone(), 10, 10), frame);
        assert_eq!(conform(frame, 12, 7).dimensions(), (12, 7));
    }
}
