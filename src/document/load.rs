use crate::document::merge::{merge_override, parse_override};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::schema::validate::{ValidatedPresentation, validate_presentation};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File name of the override document looked up next to the input.
pub const OVERRIDE_FILE_NAME: &str = "override.json";

/// Read and parse a JSON document.
pub fn read_document(path: &Path) -> SlidecastResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| SlidecastError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        SlidecastError::validation(format!(
            "'{}' is not valid JSON: {e}",
            path.display()
        ))
    })
}

/// `override.json` beside `input`, if one exists and is not the input itself.
pub fn sibling_override(input: &Path) -> Option<PathBuf> {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let candidate = dir.join(OVERRIDE_FILE_NAME);
    if !candidate.is_file() {
        return None;
    }
    let same = match (candidate.canonicalize(), input.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    (!same).then_some(candidate)
}

/// Load `input`, deep-merge the override over it and validate the merged result.
///
/// With `override_path = None` a sibling [`OVERRIDE_FILE_NAME`] is used when present. An
/// explicitly named override must exist.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn load_presentation(
    input: &Path,
    override_path: Option<&Path>,
) -> SlidecastResult<ValidatedPresentation> {
    let base = read_document(input)?;

    let override_path = match override_path {
        Some(p) => Some(p.to_path_buf()),
        None => sibling_override(input),
    };
    let override_doc = match override_path.as_deref() {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| SlidecastError::io(p, e))?;
            tracing::info!(path = %p.display(), "applying override document");
            Some(parse_override(&text).map_err(|e| match e {
                SlidecastError::Merge(msg) => {
                    SlidecastError::merge(format!("'{}': {msg}", p.display()))
                }
                other => other,
            })?)
        }
        None => None,
    };

    let merged = merge_override(base, override_doc)?;
    let validated = validate_presentation(&merged)?;
    tracing::debug!(
        slides = validated.presentation.slides.len(),
        warnings = validated.warnings.len(),
        "presentation loaded"
    );
    Ok(validated)
}

#[cfg(test)]
#[path = "../../tests/unit/document/load.rs"]
mod tests;
