use serde::Serialize;

/// A validated presentation document.
///
/// Values of this type are produced by [`crate::validate_presentation`]; a missing optional key
/// and an explicit `null` both end up as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Theme name. Unknown or absent names resolve to the default theme.
    pub theme: Option<String>,
    pub front_page: Option<FrontPage>,
    /// Ordered slides, never empty.
    pub slides: Vec<Slide>,
    pub created_at: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontPage {
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Display/filename token. Array position, not `id`, orders the timeline.
    pub id: u64,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub audio_narration_in_english: Option<String>,
    pub audio_narration_in_hindi: Option<String>,
}

impl Slide {
    /// Narration text for `language`, if the slide carries any.
    pub fn narration(&self, language: Language) -> Option<&str> {
        let text = match language {
            Language::En => self.audio_narration_in_english.as_deref(),
            Language::Hi => self.audio_narration_in_hindi.as_deref(),
        };
        text.filter(|t| !t.trim().is_empty())
    }
}

/// Slide body content, discriminated by the JSON `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text { text: String, style: TextStyle },
    Bullets { items: Vec<String> },
    Image {
        alt: Option<String>,
        caption: Option<String>,
    },
    Code {
        language: Option<String>,
        code: String,
    },
}

impl Block {
    /// The JSON `type` tag for this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Bullets { .. } => "bullets",
            Self::Image { .. } => "image",
            Self::Code { .. } => "code",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    #[default]
    Normal,
    Title,
    Subtitle,
    Code,
}

impl TextStyle {
    pub(crate) const NAMES: [&'static str; 4] = ["normal", "title", "subtitle", "code"];

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Self::Normal),
            "title" => Some(Self::Title),
            "subtitle" => Some(Self::Subtitle),
            "code" => Some(Self::Code),
            _ => None,
        }
    }
}

/// Narration language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    /// Short code used in narration file names (`{slideId}_{code}.mp3`).
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
