use std::path::Path;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Sample rate used across decode/mix/encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

/// Something that can tell how long an audio file plays.
pub trait DurationProbe: Send + Sync {
    fn duration_secs(&self, path: &Path) -> SlidecastResult<f64>;
}

/// [`DurationProbe`] backed by the system `ffprobe`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeDuration;

impl DurationProbe for FfprobeDuration {
    fn duration_secs(&self, path: &Path) -> SlidecastResult<f64> {
        probe_duration_secs(path)
    }
}

/// Probe media duration in seconds through `ffprobe`.
pub fn probe_duration_secs(path: &Path) -> SlidecastResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: ProbeFormat,
    }

    let out = std::process::Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| SlidecastError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SlidecastError::encode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SlidecastError::encode(format!("ffprobe json parse failed: {e}")))?;
    let secs = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            SlidecastError::encode(format!(
                "ffprobe reported no duration for '{}'",
                path.display()
            ))
        })?;
    Ok(secs)
}

/// Decode audio from a media file to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> SlidecastResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            SlidecastError::encode(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(SlidecastError::encode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(SlidecastError::encode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let pcm = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

/// Return `true` when `tool -version` runs successfully from `PATH`.
pub fn is_tool_on_path(tool: &str) -> bool {
    std::process::Command::new(tool)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
