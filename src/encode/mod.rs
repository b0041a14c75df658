//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by
//! [`crate::render::RenderDriver::render_media`].

/// `ffmpeg`-based sink (video file output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
