// Writes a synthetic clip for trying the transformer without real footage

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use video_transformer::video::{
    pattern::test_pattern, Codec, FfmpegBackend, FrameRate, OutputSpec, VideoBackend,
};

#[derive(Parser)]
#[command(name = "make_test_clip", about = "Generate a synthetic test video")]
struct Args {
    /// Output video file
    output: PathBuf,

    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Number of frames to write
    #[arg(long, default_value_t = 60)]
    frames: usize,

    /// Frame rate, as a decimal or a ratio such as 30000/1001
    #[arg(long, default_value = "30")]
    fps: FrameRate,

    #[arg(long, default_value = "XVID")]
    codec: Codec,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_target(false).init();

    let backend = FfmpegBackend::new();
    let spec = OutputSpec {
        width: args.width,
        height: args.height,
        frame_rate: args.fps,
        codec: args.codec.clone(),
    };

    let mut sink = backend
        .open_sink(&args.output, &spec)
        .with_context(|| format!("Cannot open {}", args.output.display()))?;
    for index in 0..args.frames {
        sink.write_frame(&test_pattern(args.width, args.height, index, args.frames))?;
    }
    sink.finish()?;

    info!(
        "Wrote {} frames of {}x{} at {} fps ({}) to {}",
        args.frames,
        args.width,
        args.height,
        args.fps,
        args.codec,
        args.output.display()
    );
    Ok(())
}
