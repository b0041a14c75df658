//! Frame timeline composition.
//!
//! Maps a validated presentation plus a per-slide audio duration table onto a single
//! gap-free, non-overlapping frame timeline.

pub mod builder;

pub use builder::{AudioSpan, Segment, SegmentOwner, Timeline, TimelinePolicy, build_timeline};
