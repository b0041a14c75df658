//! Slidecast turns JSON slide decks into narrated videos.
//!
//! The pipeline is:
//!
//! - Load a document, deep-merge an optional override and validate it into a [`Presentation`]
//! - Resolve per-slide narration into an [`AudioTable`]
//! - Build a gap-free frame [`Timeline`]
//! - Render it through a [`RenderDriver`] into a [`FrameSink`]
#![forbid(unsafe_code)]

/// Narration lookup, storage, decoding and mixing.
pub mod audio;
/// Output video settings.
pub mod config;
/// Presentation documents.
pub mod document;
/// Encoding sinks.
pub mod encode;
mod foundation;
/// Slide rendering.
pub mod render;
/// Document validation.
pub mod schema;
/// Named visual themes.
pub mod theme;
/// Frame timeline composition.
pub mod timeline;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{SlideResolutionFailure, SlidecastError, SlidecastResult};

pub use crate::audio::media::{DurationProbe, FfprobeDuration};
pub use crate::audio::resolve::{
    AudioMetadata, AudioResolver, AudioTable, NarrationRequest, resolve_narration,
};
pub use crate::audio::store::{CommandSynthesizer, NarrationStore, SpeechSynthesizer};
pub use crate::config::{Codec, VideoConfig, VideoConfigOverrides};
pub use crate::document::load::load_presentation;
pub use crate::document::merge::merge_override;
pub use crate::document::model::{Block, FrontPage, Language, Presentation, Slide, TextStyle};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::render::{
    COMPOSITION_ID, FrameRGBA, InputProps, Layout, RenderDriver, RenderProgress, RenderRequest,
    RenderStats, SlideDriver,
};
pub use crate::schema::validate::{
    SchemaError, SchemaErrors, SchemaWarning, ValidatedPresentation, validate_presentation,
};
pub use crate::theme::{Theme, ThemeRegistry};
pub use crate::timeline::{Segment, SegmentOwner, Timeline, TimelinePolicy, build_timeline};
