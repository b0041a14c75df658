use crate::schema::validate::SchemaErrors;
use std::fmt;
use std::path::PathBuf;

pub type SlidecastResult<T> = Result<T, SlidecastError>;

#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("schema validation failed:\n{0}")]
    Schema(#[from] SchemaErrors),

    #[error("merge error: {0}")]
    Merge(String),

    #[error("audio resolution failed: {}", ResolutionList(.0))]
    Resolution(Vec<SlideResolutionFailure>),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("'{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One slide whose narration could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideResolutionFailure {
    /// Position of the slide in `slides` (0-based).
    pub slide_index: usize,
    /// Slide `id` as written in the document.
    pub slide_id: u64,
    pub message: String,
}

struct ResolutionList<'a>(&'a [SlideResolutionFailure]);

impl fmt::Display for ResolutionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slide(s) failed", self.0.len())?;
        for failure in self.0 {
            write!(
                f,
                "\n  slide #{} (id {}): {}",
                failure.slide_index + 1,
                failure.slide_id,
                failure.message
            )?;
        }
        Ok(())
    }
}

impl SlidecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
