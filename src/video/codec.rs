use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output codec identified by its four-character code (fourcc)
///
/// The fourcc is resolved to an FFmpeg encoder when the output stream is
/// opened. MPEG-4 Part 2 family codes (XVID, DIVX, ...) are encoded with the
/// built-in `mpeg4` encoder and tagged with the requested fourcc, so players
/// that key on the tag see what they expect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codec {
    fourcc: String,
}

impl Codec {
    pub fn fourcc(&self) -> &str {
        &self.fourcc
    }

    /// FFmpeg encoder name passed to `-c:v`
    pub fn encoder(&self) -> String {
        match self.fourcc.as_str() {
            "XVID" | "DIVX" | "DX50" | "FMP4" | "MP4V" => "mpeg4".to_string(),
            "MJPG" => "mjpeg".to_string(),
            "H264" | "X264" | "AVC1" => "libx264".to_string(),
            "FFV1" => "ffv1".to_string(),
            other => other.to_lowercase(),
        }
    }

    /// Container tag to force with `-vtag`, if any
    pub fn tag(&self) -> Option<&str> {
        (self.encoder() == "mpeg4").then_some(self.fourcc.as_str())
    }

    /// Pixel format the encoder is asked to produce
    pub fn pixel_format(&self) -> Option<&'static str> {
        match self.encoder().as_str() {
            "mpeg4" | "libx264" => Some("yuv420p"),
            "mjpeg" => Some("yuvj420p"),
            _ => None,
        }
    }

    /// libx264 rejects odd dimensions in 4:2:0
    pub fn requires_even_dimensions(&self) -> bool {
        self.encoder() == "libx264"
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            fourcc: "XVID".to_string(),
        }
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!(
                "codec must be a four-character code such as XVID, got '{}'",
                s
            ));
        }
        Ok(Self {
            fourcc: s.to_ascii_uppercase(),
        })
    }
}

impl TryFrom<String> for Codec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.fourcc
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fourcc)
    }
}
