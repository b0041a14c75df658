use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::audio::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::timeline::Timeline;

/// One narration file placed on the output sample timeline.
#[derive(Clone, Debug)]
pub struct NarrationClip {
    /// First output sample, relative to the mixed range start.
    pub timeline_start_sample: u64,
    /// One past the last output sample.
    pub timeline_end_sample: u64,
    /// Source sample frame played at `timeline_start_sample`.
    pub source_start_frame: u64,
    pub source: Arc<AudioPcm>,
}

/// Everything needed to mix the narration of a frame range.
#[derive(Clone, Debug)]
pub struct AudioManifest {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    pub clips: Vec<NarrationClip>,
}

impl AudioManifest {
    pub fn is_silent(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Place each segment's narration at its audio range, clipped to `range`.
///
/// `load` decodes an asset path into PCM at [`MIX_SAMPLE_RATE`]; each distinct asset is loaded
/// once. Narration longer than its span is cut at the span end.
pub fn build_audio_manifest(
    timeline: &Timeline,
    range: FrameRange,
    mut load: impl FnMut(&str) -> SlidecastResult<AudioPcm>,
) -> SlidecastResult<AudioManifest> {
    if range.is_empty() {
        return Err(SlidecastError::validation(
            "audio manifest range must be non-empty",
        ));
    }

    let fps = timeline.fps;
    let sample_rate = MIX_SAMPLE_RATE;
    let mut decoded = BTreeMap::<String, Arc<AudioPcm>>::new();
    let mut clips = Vec::new();

    for segment in &timeline.segments {
        let (Some(span), Some(audio_range)) = (segment.audio.as_ref(), segment.audio_range()) else {
            continue;
        };
        let Some(visible) = intersect_ranges(audio_range, range) else {
            continue;
        };

        let source = match decoded.get(&span.asset) {
            Some(pcm) => pcm.clone(),
            None => {
                let pcm = load(&span.asset)?;
                if pcm.sample_rate != sample_rate {
                    return Err(SlidecastError::encode(format!(
                        "narration '{}' decoded at {} Hz, expected {sample_rate} Hz",
                        span.asset, pcm.sample_rate
                    )));
                }
                if pcm.channels == 0 {
                    return Err(SlidecastError::encode(format!(
                        "narration '{}' decoded with zero channels",
                        span.asset
                    )));
                }
                let pcm = Arc::new(pcm);
                decoded.insert(span.asset.clone(), pcm.clone());
                pcm
            }
        };

        clips.push(NarrationClip {
            timeline_start_sample: frame_to_sample(visible.start.0 - range.start.0, fps, sample_rate),
            timeline_end_sample: frame_to_sample(visible.end.0 - range.start.0, fps, sample_rate),
            source_start_frame: frame_to_sample(
                visible.start.0 - audio_range.start.0,
                fps,
                sample_rate,
            ),
            source,
        });
    }

    tracing::debug!(clips = clips.len(), "audio manifest built");
    Ok(AudioManifest {
        sample_rate,
        channels: 2,
        total_samples: frame_to_sample(range.len_frames(), fps, sample_rate),
        clips,
    })
}

/// Sum every clip into interleaved output samples, clamped to `[-1, 1]`.
pub fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let out_channels = usize::from(manifest.channels);
    let mut out = vec![0.0f32; manifest.total_samples as usize * out_channels];

    for clip in &manifest.clips {
        let src_channels = usize::from(clip.source.channels);
        let src = &clip.source.interleaved_f32;
        let src_frames = (src.len() / src_channels) as u64;
        let end = clip.timeline_end_sample.min(manifest.total_samples);

        for dst_sample in clip.timeline_start_sample..end {
            let src_frame = clip.source_start_frame + (dst_sample - clip.timeline_start_sample);
            if src_frame >= src_frames {
                break;
            }
            let i = src_frame as usize * src_channels;
            let (l, r) = if src_channels == 1 {
                (src[i], src[i])
            } else {
                (src[i], src[i + 1])
            };

            let dst_idx = dst_sample as usize * out_channels;
            out[dst_idx] += l;
            if out_channels > 1 {
                out[dst_idx + 1] += r;
            }
        }
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> SlidecastResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SlidecastError::io(parent, e))?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| SlidecastError::io(out_path, e))
}

/// Rounded sample offset of a frame delta.
pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

fn intersect_ranges(a: FrameRange, b: FrameRange) -> Option<FrameRange> {
    let start = a.start.0.max(b.start.0);
    let end = a.end.0.min(b.end.0);
    if start >= end {
        return None;
    }
    FrameRange::new(FrameIndex(start), FrameIndex(end)).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
