use crate::audio::resolve::AudioTable;
use crate::document::model::Presentation;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Timing constants, in milliseconds, converted to frames at the composition rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePolicy {
    /// Front page length when the document has one.
    pub front_page_ms: u64,
    /// Static lead-in before a slide's narration.
    pub buffer_before_ms: u64,
    /// Static tail after a slide's narration.
    pub buffer_after_ms: u64,
    /// Narration length assumed for slides without resolved audio.
    pub fallback_audio_ms: u64,
}

impl Default for TimelinePolicy {
    fn default() -> Self {
        Self {
            front_page_ms: 2_000,
            buffer_before_ms: 500,
            buffer_after_ms: 500,
            fallback_audio_ms: 10_000,
        }
    }
}

impl TimelinePolicy {
    pub fn front_page_frames(&self, fps: Fps) -> u64 {
        fps.millis_to_frames_floor(self.front_page_ms)
    }

    pub fn buffer_before_frames(&self, fps: Fps) -> u64 {
        fps.millis_to_frames_floor(self.buffer_before_ms)
    }

    pub fn buffer_after_frames(&self, fps: Fps) -> u64 {
        fps.millis_to_frames_floor(self.buffer_after_ms)
    }

    pub fn fallback_audio_frames(&self, fps: Fps) -> u64 {
        fps.millis_to_frames_floor(self.fallback_audio_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum SegmentOwner {
    FrontPage,
    /// 0-based position in `slides`.
    Slide(usize),
}

/// Narration placed inside a slide segment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AudioSpan {
    /// Start frame relative to the owning segment's start.
    pub offset: u64,
    pub duration: u64,
    pub asset: String,
}

/// A contiguous span of frames owned by the front page or one slide.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Segment {
    pub owner: SegmentOwner,
    pub range: FrameRange,
    pub audio: Option<AudioSpan>,
}

impl Segment {
    pub fn start(&self) -> u64 {
        self.range.start.0
    }

    pub fn duration(&self) -> u64 {
        self.range.len_frames()
    }

    /// Absolute frame range of the nested narration, if any.
    pub fn audio_range(&self) -> Option<FrameRange> {
        self.audio
            .as_ref()
            .map(|a| FrameRange::with_len(self.start() + a.offset, a.duration))
    }
}

/// Ordered, contiguous segments covering `[0, total_frames)`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Timeline {
    pub fps: Fps,
    pub segments: Vec<Segment>,
    pub total_frames: u64,
}

impl Timeline {
    /// Segment containing `frame`, or `None` past the end.
    pub fn segment_at(&self, frame: FrameIndex) -> Option<&Segment> {
        let i = self
            .segments
            .partition_point(|s| s.range.end.0 <= frame.0);
        self.segments.get(i).filter(|s| s.range.contains(frame))
    }

    /// First frame owned by `owner`.
    pub fn first_frame(&self, owner: SegmentOwner) -> Option<FrameIndex> {
        self.segments
            .iter()
            .find(|s| s.owner == owner)
            .map(|s| s.range.start)
    }

    pub fn range(&self) -> FrameRange {
        FrameRange::with_len(0, self.total_frames)
    }
}

/// Compose the frame timeline for `presentation`.
///
/// The front page (if any) occupies `[0, front_page_frames)`. Every slide then gets
/// `buffer_before + audio + buffer_after` frames, where `audio` is the resolved duration or the
/// fallback. Buffers apply whether or not the slide has narration. `audio` must hold exactly one
/// entry per slide.
pub fn build_timeline(
    presentation: &Presentation,
    audio: &AudioTable,
    fps: Fps,
    policy: &TimelinePolicy,
) -> SlidecastResult<Timeline> {
    if audio.len() != presentation.slides.len() {
        return Err(SlidecastError::validation(format!(
            "audio table has {} entries but the presentation has {} slides",
            audio.len(),
            presentation.slides.len()
        )));
    }

    let buffer_before = policy.buffer_before_frames(fps);
    let buffer_after = policy.buffer_after_frames(fps);
    let fallback = policy.fallback_audio_frames(fps);

    let mut segments = Vec::with_capacity(presentation.slides.len() + 1);
    let mut cursor = 0u64;

    if presentation.front_page.is_some() {
        let len = policy.front_page_frames(fps);
        segments.push(Segment {
            owner: SegmentOwner::FrontPage,
            range: FrameRange::with_len(cursor, len),
            audio: None,
        });
        cursor += len;
    }

    for (index, entry) in audio.entries().iter().enumerate() {
        let audio_frames = entry.as_ref().map_or(fallback, |m| m.duration_frames);
        let len = buffer_before + audio_frames + buffer_after;
        segments.push(Segment {
            owner: SegmentOwner::Slide(index),
            range: FrameRange::with_len(cursor, len),
            audio: entry.as_ref().map(|m| AudioSpan {
                offset: buffer_before,
                duration: m.duration_frames,
                asset: m.asset.clone(),
            }),
        });
        cursor += len;
    }

    tracing::debug!(
        segments = segments.len(),
        total_frames = cursor,
        fps = %fps,
        "timeline built"
    );

    Ok(Timeline {
        fps,
        segments,
        total_frames: cursor,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
