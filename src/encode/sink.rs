use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::raster::FrameRGBA;
use std::path::PathBuf;

/// Configuration provided to a [`FrameSink`] at the start of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Total frames that will be pushed.
    pub total_frames: u64,
    /// Mixed narration, if the video has sound.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInputConfig {
    /// Interleaved little-endian `f32` samples.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Destination for rendered frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order, once per frame of the
/// composition.
pub trait FrameSink: Send {
    /// Prepare for `cfg.total_frames` frames.
    fn begin(&mut self, cfg: SinkConfig) -> SlidecastResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()>;
    fn end(&mut self) -> SlidecastResult<()>;
}

/// Keeps every pushed frame in memory. Meant for tests and stills.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    audio_bytes: Option<Vec<u8>>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames, in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Contents of the audio input file, read in `begin` while it still exists.
    pub fn audio_bytes(&self) -> Option<&[u8]> {
        self.audio_bytes.as_deref()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SlidecastResult<()> {
        self.audio_bytes = match &cfg.audio {
            Some(audio) => Some(
                std::fs::read(&audio.path)
                    .map_err(|e| SlidecastError::io(&audio.path, e))?,
            ),
            None => None,
        };
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        self.ended = true;
        Ok(())
    }
}
