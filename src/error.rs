use thiserror::Error;

/// Exit status for usage and configuration errors
pub const EXIT_USAGE: u8 = 1;

/// Exit status when one or more videos failed to process
pub const EXIT_PROCESSING: u8 = 2;

/// Main error type for the video-transformer library
#[derive(Error, Debug)]
pub enum TransformerError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while opening, decoding or encoding a video stream
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to open video file {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Video file contains no frames: {path}")]
    EmptyStream { path: String },

    #[error("Failed to decode {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    EncodeFailed { path: String, reason: String },

    #[error("Video backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
}

/// Transform parameter errors
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Invalid transform parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}

/// Folder processing errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input folder not found: {path}")]
    InputNotFound { path: String },

    #[error("No .{extension} files found in {path}")]
    NoMatchingFiles { path: String, extension: String },

    #[error("{failed} of {total} videos failed to process")]
    JobsFailed { failed: usize, total: usize },

    #[error("Failed to start worker pool: {reason}")]
    PoolBuild { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using TransformerError
pub type Result<T> = std::result::Result<T, TransformerError>;

impl TransformerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error stems from bad invocation parameters rather than
    /// from processing a video
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Transform(TransformError::InvalidParameter { .. })
        )
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        if self.is_usage_error() {
            EXIT_USAGE
        } else {
            EXIT_PROCESSING
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::OpenFailed { path, reason }) => {
                format!("Error opening video file: {} ({})", path, reason)
            }
            Self::Video(VideoError::BackendUnavailable { reason }) => {
                format!("{}. Please install FFmpeg and make sure it is on PATH.", reason)
            }
            Self::Batch(BatchError::NoMatchingFiles { path, extension }) => {
                format!("No {} files found in {}", extension.to_uppercase(), path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
