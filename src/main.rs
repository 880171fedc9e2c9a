use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use video_transformer::{
    batch::BatchDispatcher,
    config::Config,
    error::{TransformerError, VideoError, EXIT_PROCESSING, EXIT_USAGE},
    transforms::{ColorShift, FlipMode, TransformConfig},
    video::{Codec, FfmpegBackend, VideoBackend, VideoProcessor},
};

#[derive(Parser)]
#[command(
    name = "video-transformer",
    version,
    about = "Apply frame transformations to a video or a folder of videos",
    long_about = "Rotates, brightens, mirrors, adds Gaussian noise to and shifts the color channels of every frame. \
                  Folder mode transforms every matching file in parallel."
)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "folder"])))]
struct Cli {
    /// Input video file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Folder of input videos, searched recursively
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Output video file, or output folder with --folder
    output: PathBuf,

    /// Rotation angle in degrees, counter-clockwise
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<f64>,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long)]
    brightness: Option<f64>,

    /// Flip code: 1 = horizontal, 0 = vertical, -1 = both
    #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i32).range(-1..=1))]
    flip: Option<i32>,

    /// Standard deviation of additive Gaussian noise
    #[arg(long)]
    gaussian: Option<f64>,

    /// Per-channel offsets in blue, green, red order
    #[arg(
        long,
        alias = "color_shift",
        num_args = 3,
        value_names = ["B", "G", "R"],
        allow_negative_numbers = true
    )]
    color_shift: Option<Vec<i32>>,

    /// Output four-character codec code
    #[arg(long)]
    codec: Option<Codec>,

    /// File extension matched in folder mode
    #[arg(long)]
    extension: Option<String>,

    /// Number of videos processed at once in folder mode
    #[arg(long)]
    workers: Option<usize>,

    /// Mirror input sub-folders under the output folder
    #[arg(long)]
    preserve_structure: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command line values over the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        let transform = &mut config.transform;
        if let Some(angle) = self.angle {
            transform.angle = angle;
        }
        if let Some(brightness) = self.brightness {
            transform.brightness = brightness;
        }
        if let Some(mode) = self.flip.and_then(FlipMode::from_code) {
            transform.flip = mode;
        }
        if let Some(std_dev) = self.gaussian {
            transform.noise_std = std_dev;
        }
        if let Some([blue, green, red]) = self.color_shift.as_deref() {
            transform.color_shift = ColorShift::new(*blue, *green, *red);
        }

        if let Some(codec) = &self.codec {
            config.video.codec = codec.clone();
        }
        if let Some(extension) = &self.extension {
            config.video.extension = extension.clone();
        }
        if let Some(workers) = self.workers {
            config.batch.workers = workers;
        }
        if self.preserve_structure {
            config.batch.preserve_structure = true;
        }
    }
}

/// Exit status for a command line clap rejected
///
/// `--help` and `--version` also arrive as errors and exit cleanly.
fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_USAGE
    } else {
        0
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_code(&e));
        }
    };

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    debug!("Starting video-transformer v{}", env!("CARGO_PKG_VERSION"));

    let started = Instant::now();
    let status = match run(&cli) {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<TransformerError>() {
            Some(inner) if e.chain().count() > 1 => {
                error!("{}: {}", e, inner.user_message());
                inner.exit_code()
            }
            Some(inner) => {
                error!("{}", inner.user_message());
                inner.exit_code()
            }
            None => {
                error!("{:#}", e);
                EXIT_PROCESSING
            }
        },
    };

    info!("Total processing time: {:.2} seconds", started.elapsed().as_secs_f64());
    ExitCode::from(status)
}

fn run(cli: &Cli) -> Result<()> {
    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)
                .with_context(|| format!("Cannot use configuration {}", config_path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;

    let backend = FfmpegBackend::new();
    if !backend.is_available() {
        return Err(TransformerError::from(VideoError::BackendUnavailable {
            reason: "ffmpeg or ffprobe could not be started".to_string(),
        })
        .into());
    }
    let backend: Arc<dyn VideoBackend> = Arc::new(backend);
    let transform = Arc::new(config.transform.clone());

    // clap guarantees exactly one of the two
    if let Some(folder) = &cli.folder {
        run_folder(backend, transform, &config, folder, &cli.output)?;
    } else if let Some(input) = &cli.input {
        let processor = VideoProcessor::new(backend, transform, config.process_options());
        debug!("Pipeline: {}", processor.pipeline().describe());
        processor.process_file(input, &cli.output)?;
    }

    Ok(())
}

fn run_folder(
    backend: Arc<dyn VideoBackend>,
    transform: Arc<TransformConfig>,
    config: &Config,
    folder: &Path,
    output: &Path,
) -> Result<()> {
    let dispatcher = BatchDispatcher::new(
        backend,
        transform,
        config.process_options(),
        config.batch.clone(),
        config.video.extension(),
    );

    let report = dispatcher
        .run(folder, output)
        .with_context(|| format!("Failed to process folder {}", folder.display()))?;
    report.log_summary();
    report.into_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("video-transformer").chain(args.iter().copied()))
    }

    fn assert_usage_error(args: &[&str], kind: ErrorKind) {
        let err = match parse(args) {
            Err(err) => err,
            Ok(_) => panic!("{:?} should be rejected", args),
        };
        assert_eq!(err.kind(), kind, "{:?}", args);
        assert!(err.use_stderr());
        assert_eq!(parse_exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn test_source_is_required() {
        assert_usage_error(&["out.avi"], ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_input_and_folder_conflict() {
        assert_usage_error(
            &["--input", "a.avi", "--folder", "videos", "out"],
            ErrorKind::ArgumentConflict,
        );
    }

    #[test]
    fn test_output_is_required() {
        assert_usage_error(&["--input", "a.avi"], ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_flip_code_out_of_range() {
        assert_usage_error(
            &["--input", "a.avi", "--flip", "2", "out.avi"],
            ErrorKind::ValueValidation,
        );
    }

    #[test]
    fn test_help_exits_cleanly() {
        let err = match parse(&["--help"]) {
            Err(err) => err,
            Ok(_) => panic!("--help should short-circuit"),
        };
        assert_eq!(parse_exit_code(&err), 0);
    }

    #[test]
    fn test_negative_values_parse() {
        let cli = parse(&[
            "--input", "a.avi",
            "--angle", "-45",
            "--flip", "-1",
            "--color-shift", "-5", "0", "5",
            "out.avi",
        ])
        .unwrap();

        assert_eq!(cli.angle, Some(-45.0));
        assert_eq!(cli.flip, Some(-1));
        assert_eq!(cli.color_shift, Some(vec![-5, 0, 5]));
        assert_eq!(cli.output, PathBuf::from("out.avi"));
    }

    #[test]
    fn test_underscore_color_shift_alias() {
        let cli = parse(&["--folder", "videos", "--color_shift", "1", "2", "3", "out"]).unwrap();
        assert_eq!(cli.color_shift, Some(vec![1, 2, 3]));
        assert_eq!(cli.folder, Some(PathBuf::from("videos")));
    }

    fn file_config() -> Config {
        let mut config = Config::default();
        config.transform = TransformConfig {
            angle: 30.0,
            brightness: 1.5,
            flip: FlipMode::Vertical,
            noise_std: 2.0,
            color_shift: ColorShift::new(1, 2, 3),
        };
        config.video.codec = "MJPG".parse().unwrap();
        config.batch.workers = 3;
        config.batch.preserve_structure = true;
        config
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let cli = parse(&["--input", "a.avi", "--angle", "-45", "--workers", "5", "out.avi"]).unwrap();
        let mut config = file_config();
        cli.apply_to(&mut config);

        assert_eq!(config.transform.angle, -45.0);
        assert_eq!(config.batch.workers, 5);

        assert_eq!(config.transform.brightness, 1.5);
        assert_eq!(config.transform.flip, FlipMode::Vertical);
        assert_eq!(config.transform.noise_std, 2.0);
        assert_eq!(config.transform.color_shift, ColorShift::new(1, 2, 3));
        assert_eq!(config.video.codec.fourcc(), "MJPG");
        assert!(config.batch.preserve_structure);
    }

    #[test]
    fn test_given_flags_replace_config_values() {
        let cli = parse(&[
            "--folder", "videos",
            "--brightness", "0.8",
            "--flip", "1",
            "--gaussian", "4",
            "--color-shift", "9", "8", "7",
            "--codec", "h264",
            "--extension", ".mp4",
            "out",
        ])
        .unwrap();
        let mut config = file_config();
        cli.apply_to(&mut config);

        assert_eq!(config.transform.angle, 30.0);
        assert_eq!(config.transform.brightness, 0.8);
        assert_eq!(config.transform.flip, FlipMode::Horizontal);
        assert_eq!(config.transform.noise_std, 4.0);
        assert_eq!(config.transform.color_shift, ColorShift::new(9, 8, 7));
        assert_eq!(config.video.codec.fourcc(), "H264");
        assert_eq!(config.video.extension(), "mp4");
        assert_eq!(config.batch.workers, 3);
        assert!(config.validate().is_ok());
    }
}
