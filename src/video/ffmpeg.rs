// src/video/ffmpeg.rs - Decode/encode through external FFmpeg processes

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::error::{Result, TransformerError, VideoError};
use crate::video::backend::{OutputSpec, VideoBackend, VideoSink, VideoSource};
use crate::video::types::{Frame, FrameRate, StreamInfo};

/// Video backend that pipes raw `rgb24` frames through `ffmpeg`
///
/// Stream properties come from `ffprobe`. Each open source or sink owns one
/// child process for its lifetime.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    /// Use `ffmpeg` and `ffprobe` from `PATH`
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    pub fn with_binaries<P: Into<PathBuf>, Q: Into<PathBuf>>(ffmpeg: P, ffprobe: Q) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Whether both executables can be launched
    pub fn is_available(&self) -> bool {
        [&self.ffmpeg, &self.ffprobe].iter().all(|binary| {
            Command::new(binary)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        })
    }

    /// Read width, height, frame rate and frame count of the first video stream
    pub fn probe(&self, path: &Path) -> Result<StreamInfo> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&self.ffprobe, e, path))?;

        if !output.status.success() {
            return Err(VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout)).map_err(|reason| {
            VideoError::OpenFailed {
                path: path.display().to_string(),
                reason,
            }
            .into()
        })
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.is_file() {
            return Err(VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: "no such file".to_string(),
            }
            .into());
        }

        let info = self.probe(path)?;
        debug!(
            "Probed {}: {}x{} @ {} fps, {} frames",
            path.display(),
            info.width,
            info.height,
            info.frame_rate,
            info.frame_count.map_or("unknown".to_string(), |n| n.to_string())
        );

        let mut source = FfmpegSource {
            ffmpeg: self.ffmpeg.clone(),
            path: path.to_path_buf(),
            info,
            decoder: None,
            buffer: Vec::new(),
        };
        source.spawn_decoder()?;
        Ok(Box::new(source))
    }

    fn open_sink(&self, path: &Path, spec: &OutputSpec) -> Result<Box<dyn VideoSink>> {
        let sink = FfmpegSink::spawn(&self.ffmpeg, path, spec)?;
        Ok(Box::new(sink))
    }
}

/// Parse `key=value` lines printed by ffprobe
fn parse_probe_output(stdout: &str) -> std::result::Result<StreamInfo, String> {
    let fields: HashMap<&str, &str> = stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    let dimension = |key: &str| -> std::result::Result<u32, String> {
        fields
            .get(key)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| format!("no usable video stream ({} missing)", key))
    };

    let width = dimension("width")?;
    let height = dimension("height")?;

    // r_frame_rate is 0/0 for some variable-rate streams
    let frame_rate = ["r_frame_rate", "avg_frame_rate"]
        .iter()
        .filter_map(|key| fields.get(key))
        .find_map(|v| v.parse::<FrameRate>().ok())
        .ok_or_else(|| "stream reports no frame rate".to_string())?;

    let frame_count = fields
        .get("nb_frames")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|n| *n > 0);

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
        frame_count,
    })
}

fn spawn_error(binary: &Path, err: std::io::Error, target: &Path) -> TransformerError {
    if err.kind() == ErrorKind::NotFound {
        VideoError::BackendUnavailable {
            reason: format!("{} not found", binary.display()),
        }
        .into()
    } else {
        VideoError::OpenFailed {
            path: target.display().to_string(),
            reason: format!("failed to launch {}: {}", binary.display(), err),
        }
        .into()
    }
}

/// Collect a child's stderr on a helper thread so a chatty process never
/// blocks on a full pipe
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    }))
}

fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

struct Decoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
}

impl Decoder {
    fn stop(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = join_stderr(self.stderr.take());
    }
}

struct FfmpegSource {
    ffmpeg: PathBuf,
    path: PathBuf,
    info: StreamInfo,
    decoder: Option<Decoder>,
    buffer: Vec<u8>,
}

impl FfmpegSource {
    fn spawn_decoder(&mut self) -> Result<()> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(&self.path)
            .args([
                "-map", "0:v:0",
                "-vsync", "passthrough",
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.ffmpeg, e, &self.path))?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::OpenFailed {
            path: self.path.display().to_string(),
            reason: "decoder stdout unavailable".to_string(),
        })?;
        let stderr = drain_stderr(&mut child);

        self.decoder = Some(Decoder {
            child,
            stdout: BufReader::new(stdout),
            stderr,
        });
        Ok(())
    }

    /// Reap the decoder after end of stream, surfacing a failed exit
    fn finish_decoder(&mut self) -> Result<()> {
        let Some(mut decoder) = self.decoder.take() else {
            return Ok(());
        };
        let status = decoder.child.wait()?;
        let stderr = join_stderr(decoder.stderr.take());
        if !status.success() {
            return Err(VideoError::DecodeFailed {
                path: self.path.display().to_string(),
                reason: if stderr.is_empty() {
                    format!("ffmpeg exited with {}", status)
                } else {
                    stderr
                },
            }
            .into());
        }
        if !stderr.is_empty() {
            warn!("Decoder warnings for {}: {}", self.path.display(), stderr);
        }
        Ok(())
    }
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let frame_len = Frame::byte_len(self.info.width, self.info.height);
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(None);
        };

        self.buffer.resize(frame_len, 0);
        match decoder.stdout.read_exact(&mut self.buffer) {
            Ok(()) => {
                let data = std::mem::replace(&mut self.buffer, Vec::with_capacity(frame_len));
                let frame = Frame::from_rgb_bytes(self.info.width, self.info.height, data)
                    .ok_or_else(|| VideoError::DecodeFailed {
                        path: self.path.display().to_string(),
                        reason: "short frame from decoder".to_string(),
                    })?;
                Ok(Some(frame))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish_decoder()?;
                Ok(None)
            }
            Err(e) => Err(VideoError::DecodeFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        if let Some(decoder) = self.decoder.take() {
            decoder.stop();
        }
        self.spawn_decoder()
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            decoder.stop();
        }
    }
}

struct FfmpegSink {
    path: PathBuf,
    child: Option<Child>,
    stdin: Option<BufWriter<ChildStdin>>,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    fn spawn(ffmpeg: &Path, path: &Path, spec: &OutputSpec) -> Result<Self> {
        let mut cmd = Command::new(ffmpeg);
        cmd.args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", spec.width, spec.height)])
            .args(["-r", &spec.frame_rate.to_string()])
            .args(["-i", "pipe:0", "-an"])
            .args(["-c:v", &spec.codec.encoder()]);

        if let Some(tag) = spec.codec.tag() {
            cmd.args(["-vtag", tag, "-q:v", "3"]);
        }
        if let Some(pix_fmt) = spec.codec.pixel_format() {
            cmd.args(["-pix_fmt", pix_fmt]);
        }
        if spec.codec.requires_even_dimensions() && (spec.width % 2 == 1 || spec.height % 2 == 1) {
            debug!("Padding {}x{} to even dimensions for {}", spec.width, spec.height, spec.codec);
            cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
        }
        cmd.arg(path);

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match spawn_error(ffmpeg, e, path) {
                TransformerError::Video(VideoError::OpenFailed { path, reason }) => {
                    VideoError::EncodeFailed { path, reason }.into()
                }
                other => other,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodeFailed {
            path: path.display().to_string(),
            reason: "encoder stdin unavailable".to_string(),
        })?;
        let stderr = drain_stderr(&mut child);

        info!(
            "Writing {} ({}x{} @ {} fps, codec {})",
            path.display(),
            spec.width,
            spec.height,
            spec.frame_rate,
            spec.codec
        );

        Ok(Self {
            path: path.to_path_buf(),
            child: Some(child),
            stdin: Some(BufWriter::new(stdin)),
            stderr,
            width: spec.width,
            height: spec.height,
        })
    }

    fn encode_error(&mut self, reason: String) -> TransformerError {
        // The encoder's own message explains a broken pipe better than the pipe does
        let detail = self.shutdown();
        VideoError::EncodeFailed {
            path: self.path.display().to_string(),
            reason: if detail.is_empty() { reason } else { detail },
        }
        .into()
    }

    /// Close stdin, wait for the encoder and return its stderr
    fn shutdown(&mut self) -> String {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        join_stderr(self.stderr.take())
    }
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(VideoError::EncodeFailed {
                path: self.path.display().to_string(),
                reason: format!(
                    "frame is {}x{}, stream is {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            }
            .into());
        }

        let written = match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(frame.as_rgb_bytes()),
            None => return Err(self.encode_error("encoder already closed".to_string())),
        };
        written.map_err(|e| self.encode_error(e.to_string()))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                return Err(self.encode_error(e.to_string()));
            }
        }

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        let stderr = join_stderr(self.stderr.take());

        if !status.success() {
            return Err(VideoError::EncodeFailed {
                path: self.path.display().to_string(),
                reason: if stderr.is_empty() {
                    format!("ffmpeg exited with {}", status)
                } else {
                    stderr
                },
            }
            .into());
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            warn!("Abandoning unfinished output {}", self.path.display());
            let _ = self.shutdown();
        }
    }
}
