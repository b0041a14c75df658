use crate::foundation::error::{SlidecastError, SlidecastResult};

/// 0-based frame number on the presentation timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex,
}

impl FrameRange {
    /// Fails when `end` precedes `start`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> SlidecastResult<Self> {
        if start.0 > end.0 {
            return Err(SlidecastError::validation("frame range end precedes its start"));
        }
        Ok(Self { start, end })
    }

    /// Range of `len` frames beginning at `start`.
    pub fn with_len(start: u64, len: u64) -> Self {
        Self {
            start: FrameIndex(start),
            end: FrameIndex(start.saturating_add(len)),
        }
    }

    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    pub fn contains(self, frame: FrameIndex) -> bool {
        (self.start.0..self.end.0).contains(&frame.0)
    }
}

/// Frame rate as `num / den` frames per second, so NTSC rates stay exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub fn new(num: u32, den: u32) -> SlidecastResult<Self> {
        if num == 0 || den == 0 {
            return Err(SlidecastError::validation(format!(
                "frame rate {num}/{den} must have a non-zero numerator and denominator"
            )));
        }
        Ok(Self { num, den })
    }

    /// Integral frame rate (`fps/1`).
    pub fn integral(fps: u32) -> SlidecastResult<Self> {
        Self::new(fps, 1)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert a millisecond span to whole frames, rounding down.
    ///
    /// Integer arithmetic only, so `2000ms @ 30fps` is exactly 60 frames.
    pub fn millis_to_frames_floor(self, millis: u64) -> u64 {
        let num = millis.saturating_mul(u64::from(self.num));
        num / (1000 * u64::from(self.den))
    }

    /// Frames needed to cover `secs` of media. Negative input yields 0.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(0.0) as u64
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Output size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> SlidecastResult<Self> {
        if width == 0 || height == 0 {
            return Err(SlidecastError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Scale factor relative to the 1080-pixel-high reference canvas themes are authored for.
    pub fn reference_scale(self) -> f64 {
        f64::from(self.height) / 1080.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
