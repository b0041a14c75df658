use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use crate::audio::media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::audio::mix::{build_audio_manifest, mix_manifest, write_mix_to_f32le_file};
use crate::audio::resolve::AudioTable;
use crate::document::model::{Language, Presentation};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::raster::{FrameRGBA, SvgRasterizer, build_fontdb};
use crate::render::scene::SceneBuilder;
use crate::theme::ThemeRegistry;
use crate::timeline::{Segment, SegmentOwner, Timeline, TimelinePolicy, build_timeline};

/// Id of the only composition a [`SlideDriver`] knows how to render.
pub const COMPOSITION_ID: &str = "Presentation";

/// What to render and at which output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub composition_id: String,
    pub fps: Fps,
    pub canvas: Canvas,
    /// Declared length. `None` derives it from the input props; `Some` must match.
    pub duration_frames: Option<u64>,
}

impl RenderRequest {
    pub fn new(fps: Fps, canvas: Canvas) -> Self {
        Self {
            composition_id: COMPOSITION_ID.to_owned(),
            fps,
            canvas,
            duration_frames: None,
        }
    }
}

/// Data the composition is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct InputProps<'a> {
    pub presentation: &'a Presentation,
    pub language: Language,
    pub audio: &'a AudioTable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProgress {
    /// `frames_encoded / total`, in `[0, 1]`.
    pub fraction: f64,
    pub frames_rendered: u64,
    pub frames_encoded: u64,
}

/// Aggregated rendering counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames handed to the sink.
    pub frames_total: u64,
    /// Distinct rasters produced.
    pub frames_rasterized: u64,
    /// Frames that reused their segment's raster.
    pub frames_reused: u64,
    /// Narration clips mixed into the audio track.
    pub audio_clips: usize,
}

/// Turns a presentation plus its audio table into pixels and sound.
pub trait RenderDriver {
    /// Render every frame in order into `sink`, reporting progress as frames are pushed.
    fn render_media(
        &self,
        req: &RenderRequest,
        props: &InputProps<'_>,
        sink: &mut dyn FrameSink,
        on_progress: &mut dyn FnMut(RenderProgress),
    ) -> SlidecastResult<RenderStats>;

    /// Render a single frame.
    fn render_still(
        &self,
        req: &RenderRequest,
        props: &InputProps<'_>,
        frame: FrameIndex,
    ) -> SlidecastResult<FrameRGBA>;
}

type AudioDecoder = dyn Fn(&str) -> SlidecastResult<AudioPcm> + Send + Sync;

/// SVG-based driver for slide presentations.
///
/// Slides are static, so each segment is rasterized once and pushed for every frame it covers.
/// Segments are rasterized in parallel batches and emitted in timeline order.
pub struct SlideDriver {
    themes: ThemeRegistry,
    policy: TimelinePolicy,
    fontdb: Arc<usvg::fontdb::Database>,
    enable_audio: bool,
    decoder: Box<AudioDecoder>,
}

impl std::fmt::Debug for SlideDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideDriver")
            .field("themes", &self.themes.names().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .field("enable_audio", &self.enable_audio)
            .finish()
    }
}

impl SlideDriver {
    /// Driver with system fonts plus `<assets_root>/fonts`.
    pub fn new(themes: ThemeRegistry, assets_root: Option<PathBuf>) -> Self {
        Self::with_fontdb(themes, build_fontdb(assets_root.as_deref()))
    }

    pub fn with_fontdb(themes: ThemeRegistry, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self {
            themes,
            policy: TimelinePolicy::default(),
            fontdb,
            enable_audio: true,
            decoder: Box::new(|asset| {
                decode_audio_f32_stereo(std::path::Path::new(asset), MIX_SAMPLE_RATE)
            }),
        }
    }

    pub fn with_policy(mut self, policy: TimelinePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When disabled, narration still shapes the timeline but no audio track is produced.
    pub fn with_audio(mut self, enable: bool) -> Self {
        self.enable_audio = enable;
        self
    }

    /// Replace the ffmpeg-based narration decoder.
    pub fn with_audio_decoder(
        mut self,
        decoder: impl Fn(&str) -> SlidecastResult<AudioPcm> + Send + Sync + 'static,
    ) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Build the timeline for `props` and check it against the request.
    pub fn timeline(
        &self,
        req: &RenderRequest,
        props: &InputProps<'_>,
    ) -> SlidecastResult<Timeline> {
        if req.composition_id != COMPOSITION_ID {
            return Err(SlidecastError::validation(format!(
                "unknown composition '{}', expected '{COMPOSITION_ID}'",
                req.composition_id
            )));
        }
        let timeline = build_timeline(props.presentation, props.audio, req.fps, &self.policy)?;
        if let Some(declared) = req.duration_frames
            && declared != timeline.total_frames
        {
            return Err(SlidecastError::validation(format!(
                "declared duration of {declared} frames does not match the computed {} frames",
                timeline.total_frames
            )));
        }
        if timeline.total_frames == 0 {
            return Err(SlidecastError::validation("composition has no frames"));
        }
        Ok(timeline)
    }

    fn rasterize_segment(
        &self,
        scenes: &SceneBuilder<'_>,
        rasterizer: &SvgRasterizer,
        presentation: &Presentation,
        segment: &Segment,
    ) -> SlidecastResult<FrameRGBA> {
        let svg = match segment.owner {
            SegmentOwner::FrontPage => {
                let front = presentation.front_page.as_ref().ok_or_else(|| {
                    SlidecastError::render("front page segment without a front page")
                })?;
                scenes.front_page(front)
            }
            SegmentOwner::Slide(i) => {
                let slide = presentation.slides.get(i).ok_or_else(|| {
                    SlidecastError::render(format!("segment refers to missing slide #{i}"))
                })?;
                scenes.slide(slide)
            }
        };
        rasterizer.rasterize(&svg)
    }

    fn mix_audio(
        &self,
        timeline: &Timeline,
        guard: &mut TempFileGuard,
    ) -> SlidecastResult<(Option<AudioInputConfig>, usize)> {
        if !self.enable_audio {
            return Ok((None, 0));
        }
        let manifest =
            build_audio_manifest(timeline, timeline.range(), |asset| (self.decoder)(asset))?;
        if manifest.is_silent() {
            return Ok((None, 0));
        }

        let mixed = mix_manifest(&manifest);
        let path = std::env::temp_dir().join(format!(
            "slidecast_audio_mix_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        guard.0 = Some(path.clone());
        write_mix_to_f32le_file(&mixed, &path)?;
        Ok((
            Some(AudioInputConfig {
                path,
                sample_rate: manifest.sample_rate,
                channels: manifest.channels,
            }),
            manifest.clips.len(),
        ))
    }
}

impl RenderDriver for SlideDriver {
    #[tracing::instrument(skip_all, fields(slides = props.presentation.slides.len(), language = %props.language))]
    fn render_media(
        &self,
        req: &RenderRequest,
        props: &InputProps<'_>,
        sink: &mut dyn FrameSink,
        on_progress: &mut dyn FnMut(RenderProgress),
    ) -> SlidecastResult<RenderStats> {
        let timeline = self.timeline(req, props)?;
        let total = timeline.total_frames;
        let theme = self.themes.resolve(props.presentation.theme.as_deref());
        let scenes = SceneBuilder::new(theme, req.canvas);
        let rasterizer = SvgRasterizer::with_fontdb(req.canvas, self.fontdb.clone());

        let mut audio_tmp = TempFileGuard(None);
        let (audio, audio_clips) = self.mix_audio(&timeline, &mut audio_tmp)?;

        sink.begin(SinkConfig {
            width: req.canvas.width,
            height: req.canvas.height,
            fps: req.fps,
            total_frames: total,
            audio,
        })?;

        let mut stats = RenderStats {
            audio_clips,
            ..RenderStats::default()
        };
        let mut rendered = 0u64;
        let batch = rayon::current_num_threads().max(1);

        for segments in timeline.segments.chunks(batch) {
            let frames = segments
                .par_iter()
                .map(|s| self.rasterize_segment(&scenes, &rasterizer, props.presentation, s))
                .collect::<SlidecastResult<Vec<_>>>()?;

            for (segment, frame) in segments.iter().zip(&frames) {
                rendered += segment.duration();
                stats.frames_rasterized += 1;
                for f in segment.range.start.0..segment.range.end.0 {
                    sink.push_frame(FrameIndex(f), frame)?;
                    stats.frames_total += 1;
                    on_progress(RenderProgress {
                        fraction: stats.frames_total as f64 / total as f64,
                        frames_rendered: rendered,
                        frames_encoded: stats.frames_total,
                    });
                }
            }
        }

        sink.end()?;
        stats.frames_reused = stats.frames_total.saturating_sub(stats.frames_rasterized);
        tracing::info!(
            frames = stats.frames_total,
            rasterized = stats.frames_rasterized,
            audio_clips = stats.audio_clips,
            "render finished"
        );
        Ok(stats)
    }

    fn render_still(
        &self,
        req: &RenderRequest,
        props: &InputProps<'_>,
        frame: FrameIndex,
    ) -> SlidecastResult<FrameRGBA> {
        let timeline = self.timeline(req, props)?;
        let segment = timeline.segment_at(frame).ok_or_else(|| {
            SlidecastError::validation(format!(
                "frame {} is outside the composition (0..{})",
                frame.0, timeline.total_frames
            ))
        })?;
        let theme = self.themes.resolve(props.presentation.theme.as_deref());
        let scenes = SceneBuilder::new(theme, req.canvas);
        let rasterizer = SvgRasterizer::with_fontdb(req.canvas, self.fontdb.clone());
        self.rasterize_segment(&scenes, &rasterizer, props.presentation, segment)
    }
}

/// Removes the temporary mix file when the render ends, successfully or not.
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/driver.rs"]
mod tests;
