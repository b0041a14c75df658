//! Output video settings.

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Video codec of the rendered file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    H264,
    H265,
    Vp8,
    Vp9,
}

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
        }
    }

    /// ffmpeg video encoder.
    pub fn video_encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp8 => "libvpx",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// ffmpeg audio encoder that the codec's usual container accepts.
    pub fn audio_encoder(self) -> &'static str {
        match self {
            Self::H264 | Self::H265 => "aac",
            Self::Vp8 | Self::Vp9 => "libopus",
        }
    }

    /// Whether the codec is normally muxed into MP4.
    pub fn is_mp4_family(self) -> bool {
        matches!(self, Self::H264 | Self::H265)
    }
}

impl std::str::FromStr for Codec {
    type Err = SlidecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" => Ok(Self::H264),
            "h265" => Ok(Self::H265),
            "vp8" => Ok(Self::Vp8),
            "vp9" => Ok(Self::Vp9),
            other => Err(SlidecastError::validation(format!(
                "unknown codec '{other}', expected one of h264, h265, vp8, vp9"
            ))),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved output settings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: Codec,
    /// ffmpeg bitrate string, e.g. `192k`.
    pub audio_bitrate: String,
    /// ffmpeg bitrate string, e.g. `5M`.
    pub video_bitrate: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            codec: Codec::H264,
            audio_bitrate: "192k".to_owned(),
            video_bitrate: "5M".to_owned(),
        }
    }
}

/// Partial settings; `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub codec: Option<Codec>,
    pub audio_bitrate: Option<String>,
    pub video_bitrate: Option<String>,
}

impl VideoConfig {
    /// Defaults with every present override applied.
    pub fn merged(overrides: VideoConfigOverrides) -> Self {
        let d = Self::default();
        Self {
            width: overrides.width.unwrap_or(d.width),
            height: overrides.height.unwrap_or(d.height),
            fps: overrides.fps.unwrap_or(d.fps),
            codec: overrides.codec.unwrap_or(d.codec),
            audio_bitrate: overrides.audio_bitrate.unwrap_or(d.audio_bitrate),
            video_bitrate: overrides.video_bitrate.unwrap_or(d.video_bitrate),
        }
    }

    /// Check dimensions and rate. yuv420p output needs even sizes.
    pub fn validate(&self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::validation(
                "video width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(SlidecastError::validation(format!(
                "video width/height must be even, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(SlidecastError::validation("fps must be non-zero"));
        }
        for (name, value) in [
            ("audio bitrate", &self.audio_bitrate),
            ("video bitrate", &self.video_bitrate),
        ] {
            if !is_bitrate(value) {
                return Err(SlidecastError::validation(format!(
                    "{name} '{value}' is not a bitrate like 192k or 5M"
                )));
            }
        }
        Ok(())
    }

    pub fn canvas(&self) -> SlidecastResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    pub fn frame_rate(&self) -> SlidecastResult<Fps> {
        Fps::integral(self.fps)
    }
}

fn is_bitrate(s: &str) -> bool {
    let digits = s.trim_end_matches(['k', 'K', 'm', 'M']);
    !digits.is_empty()
        && digits.len() + 1 >= s.len()
        && digits.chars().all(|c| c.is_ascii_digit())
}
