//! In-memory video backend.
//!
//! Clips are registered under a path and decoded from memory; finished
//! outputs are kept for inspection. Useful for exercising the processor and
//! the batch dispatcher without FFmpeg.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, VideoError};
use crate::video::backend::{OutputSpec, VideoBackend, VideoSink, VideoSource};
use crate::video::types::{Frame, FrameRate, StreamInfo};

/// A decoded clip held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryClip {
    pub frames: Vec<Frame>,
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
}

impl MemoryClip {
    /// Clip whose raster size is taken from its first frame
    ///
    /// An empty clip gets a nominal 1x1 raster, mirroring a container that
    /// declares a stream but holds no frames.
    pub fn new(frames: Vec<Frame>, frame_rate: FrameRate) -> Self {
        let (width, height) = frames.first().map(Frame::dimensions).unwrap_or((1, 1));
        Self {
            frames,
            frame_rate,
            width,
            height,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Default)]
struct Store {
    sources: HashMap<PathBuf, MemoryClip>,
    outputs: HashMap<PathBuf, MemoryClip>,
}

/// Backend serving clips from memory
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // A panicking test job must not poison every other job's view
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `clip` readable at `path`
    pub fn insert_source<P: Into<PathBuf>>(&self, path: P, clip: MemoryClip) {
        self.lock().sources.insert(path.into(), clip);
    }

    /// The finished output written to `path`, if any
    pub fn output(&self, path: &Path) -> Option<MemoryClip> {
        self.lock().outputs.get(path).cloned()
    }

    /// Paths of every finished output
    pub fn output_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().outputs.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl VideoBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        let clip = self
            .lock()
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: "no such clip".to_string(),
            })?;

        let info = StreamInfo {
            width: clip.width,
            height: clip.height,
            frame_rate: clip.frame_rate,
            frame_count: Some(clip.frames.len() as u64),
        };
        Ok(Box::new(MemorySource {
            frames: clip.frames,
            info,
            position: 0,
        }))
    }

    fn open_sink(&self, path: &Path, spec: &OutputSpec) -> Result<Box<dyn VideoSink>> {
        Ok(Box::new(MemorySink {
            store: Arc::clone(&self.store),
            path: path.to_path_buf(),
            spec: spec.clone(),
            frames: Vec::new(),
        }))
    }
}

struct MemorySource {
    frames: Vec<Frame>,
    info: StreamInfo,
    position: usize,
}

impl VideoSource for MemorySource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

struct MemorySink {
    store: Arc<Mutex<Store>>,
    path: PathBuf,
    spec: OutputSpec,
    frames: Vec<Frame>,
}

impl VideoSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != (self.spec.width, self.spec.height) {
            return Err(VideoError::EncodeFailed {
                path: self.path.display().to_string(),
                reason: format!(
                    "frame is {}x{}, stream is {}x{}",
                    frame.width(),
                    frame.height(),
                    self.spec.width,
                    self.spec.height
                ),
            }
            .into());
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let MemorySink {
            store,
            path,
            spec,
            frames,
        } = *self;
        let clip = MemoryClip {
            frames,
            frame_rate: spec.frame_rate,
            width: spec.width,
            height: spec.height,
        };
        store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .outputs
            .insert(path, clip);
        Ok(())
    }
}
