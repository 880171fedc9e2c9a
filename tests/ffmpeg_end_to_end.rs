//! Round trips through the real `ffmpeg` / `ffprobe` executables.
//!
//! Each test returns early when the executables are not on `PATH`.

use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;
use video_transformer::{
    batch::BatchDispatcher,
    config::BatchConfig,
    error::{TransformerError, VideoError},
    transforms::TransformConfig,
    video::{
        pattern::test_pattern, Codec, FfmpegBackend, FrameRate, OutputSpec, ProcessOptions,
        VideoBackend, VideoProcessor,
    },
};

fn backend() -> Option<FfmpegBackend> {
    let backend = FfmpegBackend::new();
    if backend.is_available() {
        Some(backend)
    } else {
        eprintln!("ffmpeg/ffprobe not found, skipping");
        None
    }
}

fn write_clip(backend: &FfmpegBackend, path: &Path, frames: usize, width: u32, height: u32) {
    let spec = OutputSpec {
        width,
        height,
        frame_rate: FrameRate::new(30, 1).unwrap(),
        codec: Codec::default(),
    };
    let mut sink = backend.open_sink(path, &spec).unwrap();
    for i in 0..frames {
        sink.write_frame(&test_pattern(width, height, i, frames)).unwrap();
    }
    sink.finish().unwrap();
}

#[test]
fn test_rotated_clip_has_swapped_raster_and_same_rate() {
    let Some(ffmpeg) = backend() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.avi");
    let output = dir.path().join("rotated").join("output.avi");
    write_clip(&ffmpeg, &input, 10, 64, 48);

    let config = TransformConfig {
        angle: 90.0,
        ..Default::default()
    };
    let processor = VideoProcessor::new(
        Arc::new(ffmpeg.clone()),
        Arc::new(config),
        ProcessOptions::default(),
    );
    let summary = processor.process_file(&input, &output).unwrap();
    assert_eq!(summary.frames_written, 10);

    let info = ffmpeg.probe(&output).unwrap();
    assert_eq!((info.width, info.height), (48, 64));
    assert!((info.fps() - 30.0).abs() < 1e-6, "fps was {}", info.fps());

    // Decoding the output yields every frame back
    let mut source = ffmpeg.open_source(&output).unwrap();
    let mut decoded = 0;
    while let Some(frame) = source.read_frame().unwrap() {
        assert_eq!(frame.dimensions(), (48, 64));
        decoded += 1;
    }
    assert_eq!(decoded, 10);
}

#[test]
fn test_source_rewinds_to_first_frame() {
    let Some(ffmpeg) = backend() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.avi");
    write_clip(&ffmpeg, &input, 5, 32, 32);

    let mut source = ffmpeg.open_source(&input).unwrap();
    let first = source.read_frame().unwrap().unwrap();
    source.read_frame().unwrap().unwrap();
    source.rewind().unwrap();
    assert_eq!(source.read_frame().unwrap().unwrap(), first);
}

#[test]
fn test_unreadable_input_is_open_failure() {
    let Some(ffmpeg) = backend() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("garbage.avi");
    std::fs::write(&input, b"definitely not a video").unwrap();

    let err = ffmpeg.open_source(&input).err().unwrap();
    assert!(matches!(err, TransformerError::Video(VideoError::OpenFailed { .. })));
}

#[test]
fn test_folder_of_clips() {
    let Some(ffmpeg) = backend() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    write_clip(&ffmpeg, &input.join("one.avi"), 3, 32, 24);
    write_clip(&ffmpeg, &input.join("TWO.AVI"), 3, 32, 24);
    std::fs::write(input.join("skip.txt"), b"").unwrap();

    let config = TransformConfig {
        brightness: 1.3,
        noise_std: 5.0,
        ..Default::default()
    };
    let dispatcher = BatchDispatcher::new(
        Arc::new(ffmpeg.clone()),
        Arc::new(config),
        ProcessOptions::default(),
        BatchConfig {
            workers: 2,
            preserve_structure: false,
        },
        "avi",
    );
    let output = dir.path().join("out");
    let report = dispatcher.run(&input, &output).unwrap();

    assert!(report.is_success());
    assert_eq!(report.total(), 2);
    for name in ["one.avi", "TWO.AVI"] {
        let info = ffmpeg.probe(&output.join(name)).unwrap();
        assert_eq!((info.width, info.height), (32, 24));
    }
}
