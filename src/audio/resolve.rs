use crate::document::model::{Language, Presentation};
use crate::foundation::core::Fps;
use crate::foundation::error::{SlideResolutionFailure, SlidecastError, SlidecastResult};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Resolved narration for one slide.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// Path of the narration file.
    pub asset: String,
    pub duration_frames: u64,
}

/// Per-slide narration lookup handed to the timeline builder.
///
/// Entry `i` belongs to `slides[i]`; `None` means "no duration available, use the fallback".
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AudioTable {
    entries: Vec<Option<AudioMetadata>>,
}

impl AudioTable {
    pub fn new(entries: Vec<Option<AudioMetadata>>) -> Self {
        Self { entries }
    }

    /// A table with no narration for any of `slides` slides.
    pub fn silent(slides: usize) -> Self {
        Self {
            entries: vec![None; slides],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Option<AudioMetadata>] {
        &self.entries
    }

    pub fn get(&self, slide_index: usize) -> Option<&AudioMetadata> {
        self.entries.get(slide_index).and_then(Option::as_ref)
    }

    /// Number of slides with resolved narration.
    pub fn resolved(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

/// One slide's narration lookup.
#[derive(Debug, Clone, Copy)]
pub struct NarrationRequest<'a> {
    pub slide_index: usize,
    pub slide_id: u64,
    pub text: &'a str,
    pub language: Language,
    pub fps: Fps,
}

/// Source of narration audio and its duration.
///
/// `Ok(None)` means no narration is available for the slide and the timeline should use its
/// fallback duration. `Err` aborts the composition.
pub trait AudioResolver: Sync {
    fn resolve(&self, req: &NarrationRequest<'_>) -> SlidecastResult<Option<AudioMetadata>>;
}

/// How one slide's narration is obtained.
enum Lookup<'a> {
    Silent,
    Resolve(NarrationRequest<'a>),
    /// Same id and text as an earlier slide; reuses its result.
    SameAs(usize),
    /// Same id as an earlier slide but different text; both would share one audio file.
    Conflict(usize),
}

/// Resolve narration for every slide concurrently and collect the full table.
///
/// Slides without narration text in `language` are `None` without consulting the resolver. Audio
/// is keyed by slide id, so a repeated id with identical text is looked up once and a repeated
/// id with different text is a failure. All lookups run to completion; if any failed, every
/// failure is reported together.
#[tracing::instrument(skip(presentation, resolver), fields(slides = presentation.slides.len()))]
pub fn resolve_narration(
    presentation: &Presentation,
    language: Language,
    fps: Fps,
    resolver: &dyn AudioResolver,
) -> SlidecastResult<AudioTable> {
    let mut first_by_id: BTreeMap<u64, (usize, &str)> = BTreeMap::new();
    let lookups: Vec<Lookup<'_>> = presentation
        .slides
        .iter()
        .enumerate()
        .map(|(slide_index, slide)| {
            let Some(text) = slide.narration(language) else {
                tracing::debug!(slide_index, "no narration text");
                return Lookup::Silent;
            };
            match first_by_id.get(&slide.id) {
                Some(&(first, first_text)) if first_text == text => Lookup::SameAs(first),
                Some(&(first, _)) => Lookup::Conflict(first),
                None => {
                    first_by_id.insert(slide.id, (slide_index, text));
                    Lookup::Resolve(NarrationRequest {
                        slide_index,
                        slide_id: slide.id,
                        text,
                        language,
                        fps,
                    })
                }
            }
        })
        .collect();

    let resolved: Vec<Option<SlidecastResult<Option<AudioMetadata>>>> = lookups
        .par_iter()
        .map(|lookup| match lookup {
            Lookup::Resolve(req) => Some(resolver.resolve(req)),
            _ => None,
        })
        .collect();

    let mut entries: Vec<Option<AudioMetadata>> = Vec::with_capacity(lookups.len());
    let mut failures = Vec::new();
    for ((slide_index, slide), (lookup, result)) in presentation
        .slides
        .iter()
        .enumerate()
        .zip(lookups.iter().zip(resolved))
    {
        let entry = match (lookup, result) {
            (Lookup::Resolve(_), Some(Ok(entry))) => entry,
            (Lookup::Resolve(_), Some(Err(e))) => {
                failures.push(SlideResolutionFailure {
                    slide_index,
                    slide_id: slide.id,
                    message: e.to_string(),
                });
                None
            }
            (Lookup::SameAs(first), _) => entries.get(*first).cloned().flatten(),
            (Lookup::Conflict(first), _) => {
                failures.push(SlideResolutionFailure {
                    slide_index,
                    slide_id: slide.id,
                    message: format!(
                        "slide #{} has the same id but different narration; \
                         both would use one audio file",
                        first + 1
                    ),
                });
                None
            }
            _ => None,
        };
        entries.push(entry);
    }
    if !failures.is_empty() {
        return Err(SlidecastError::Resolution(failures));
    }

    let table = AudioTable::new(entries);
    tracing::info!(
        resolved = table.resolved(),
        slides = table.len(),
        "narration resolved"
    );
    Ok(table)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/resolve.rs"]
mod tests;
