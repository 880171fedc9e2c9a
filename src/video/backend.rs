use std::path::Path;

use crate::error::Result;
use crate::video::codec::Codec;
use crate::video::types::{Frame, FrameRate, StreamInfo};

/// An open decode session bound to one input file
///
/// Implementations release their decoder when dropped, so an early return
/// from the processor never leaks a session.
pub trait VideoSource: Send {
    /// Properties of the stream, known as soon as it is opened
    fn info(&self) -> &StreamInfo;

    /// Decode the next frame, or `None` once the stream is exhausted
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Seek back to the first frame
    fn rewind(&mut self) -> Result<()>;
}

/// An open encode session bound to one output file
///
/// Dropping a sink without calling [`VideoSink::finish`] abandons the output.
pub trait VideoSink: Send {
    /// Encode one frame; its dimensions must match the [`OutputSpec`]
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush pending frames and close the file
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Parameters an output stream is opened with
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub codec: Codec,
}

/// Factory for decode and encode sessions
///
/// The backend is shared read-only by every worker in a batch.
pub trait VideoBackend: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>>;

    fn open_sink(&self, path: &Path, spec: &OutputSpec) -> Result<Box<dyn VideoSink>>;
}
