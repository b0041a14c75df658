use crate::document::model::{Block, FrontPage, Presentation, Slide, TextStyle};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaPathElem {
    Field(&'static str),
    Key(String),
    Index(usize),
}

/// One violated constraint, located by its JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub path: Vec<SchemaPathElem>,
    pub message: String,
}

impl SchemaError {
    fn at(path: &[SchemaPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }

    /// `$.slides[0].blocks[2].text` style rendering of [`SchemaError::path`].
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[SchemaPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match p {
            SchemaPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Key(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

/// Every schema violation found in a document. Never empty.
#[derive(Debug, Clone)]
pub struct SchemaErrors {
    pub errors: Vec<SchemaError>,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

/// Non-fatal finding about an otherwise valid document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaWarning {
    pub path: Vec<SchemaPathElem>,
    pub message: String,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

/// A presentation that passed validation, plus any warnings raised on the way.
#[derive(Debug, Clone)]
pub struct ValidatedPresentation {
    pub presentation: Presentation,
    pub warnings: Vec<SchemaWarning>,
}

/// Short JSON type name for "expected X, got Y" messages.
pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const PRESENTATION_KEYS: &[&str] = &[
    "id",
    "title",
    "description",
    "theme",
    "frontPage",
    "slides",
    "createdAt",
    "logo",
];
const FRONT_PAGE_KEYS: &[&str] = &["title", "author", "date"];
const SLIDE_KEYS: &[&str] = &[
    "id",
    "layout",
    "title",
    "blocks",
    "audioNarrationInEnglish",
    "audioNarrationInHindi",
];
const BLOCK_TYPES: [&str; 4] = ["text", "bullets", "image", "code"];

struct Walker {
    path: Vec<SchemaPathElem>,
    errors: Vec<SchemaError>,
    warnings: Vec<SchemaWarning>,
}

impl Walker {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(SchemaError::at(&self.path, message));
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(SchemaWarning {
            path: self.path.clone(),
            message: message.into(),
        });
    }

    fn enter<T>(&mut self, elem: SchemaPathElem, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(elem);
        let out = f(self);
        self.path.pop();
        out
    }

    /// Absent and `null` are both `None`; anything else must be a string.
    fn nullable_string(&mut self, obj: &Map<String, Value>, key: &'static str) -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.enter(SchemaPathElem::Field(key), |w| {
                    w.error(format!("expected string or null, got {}", json_kind(other)));
                });
                None
            }
        }
    }

    fn required_string(&mut self, obj: &Map<String, Value>, key: &'static str) -> Option<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            found => {
                let got = found.map_or("nothing (field is required)", json_kind);
                self.enter(SchemaPathElem::Field(key), |w| {
                    w.error(format!("expected string, got {got}"));
                });
                None
            }
        }
    }

    fn ignore_unknown_keys(&mut self, obj: &Map<String, Value>, known: &[&str]) {
        for key in obj.keys().filter(|k| !known.contains(&k.as_str())) {
            self.enter(SchemaPathElem::Key(key.clone()), |w| {
                w.warn("unknown field ignored");
            });
        }
    }
}

/// Validate an arbitrary decoded JSON value as a presentation document.
///
/// Either every constraint holds and a typed [`Presentation`] is returned, or the full list of
/// violations is returned. Nothing is partially accepted.
#[tracing::instrument(skip(value))]
pub fn validate_presentation(value: &Value) -> Result<ValidatedPresentation, SchemaErrors> {
    let mut w = Walker {
        path: Vec::new(),
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let presentation = match value.as_object() {
        Some(obj) => walk_presentation(&mut w, obj),
        None => {
            w.error(format!(
                "expected presentation object, got {}",
                json_kind(value)
            ));
            None
        }
    };

    match presentation {
        Some(presentation) if w.errors.is_empty() => {
            for warning in &w.warnings {
                tracing::warn!(%warning, "presentation schema warning");
            }
            Ok(ValidatedPresentation {
                presentation,
                warnings: w.warnings,
            })
        }
        _ => Err(SchemaErrors { errors: w.errors }),
    }
}

fn walk_presentation(w: &mut Walker, obj: &Map<String, Value>) -> Option<Presentation> {
    w.ignore_unknown_keys(obj, PRESENTATION_KEYS);

    let id = w.nullable_string(obj, "id");
    let title = w.nullable_string(obj, "title");
    let description = w.nullable_string(obj, "description");
    let theme = w.nullable_string(obj, "theme");
    let created_at = w.nullable_string(obj, "createdAt");
    let logo = w.nullable_string(obj, "logo");

    let front_page = w.enter(SchemaPathElem::Field("frontPage"), |w| {
        match obj.get("frontPage") {
            None | Some(Value::Null) => Some(None),
            Some(Value::Object(fp)) => walk_front_page(w, fp).map(Some),
            Some(other) => {
                w.error(format!("expected object or null, got {}", json_kind(other)));
                None
            }
        }
    });

    let slides = w.enter(SchemaPathElem::Field("slides"), |w| match obj.get("slides") {
        Some(Value::Array(items)) => {
            if items.is_empty() {
                w.error("expected at least 1 slide, got 0");
                return None;
            }
            let slides: Vec<Option<Slide>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| w.enter(SchemaPathElem::Index(i), |w| walk_slide(w, item)))
                .collect();
            let slides: Option<Vec<Slide>> = slides.into_iter().collect();
            if let Some(slides) = slides.as_ref() {
                check_slide_ids(w, slides);
            }
            slides
        }
        found => {
            let got = found.map_or("nothing (field is required)", json_kind);
            w.error(format!("expected array of slides, got {got}"));
            None
        }
    });

    Some(Presentation {
        id,
        title,
        description,
        theme,
        front_page: front_page?,
        slides: slides?,
        created_at,
        logo,
    })
}

fn walk_front_page(w: &mut Walker, obj: &Map<String, Value>) -> Option<FrontPage> {
    w.ignore_unknown_keys(obj, FRONT_PAGE_KEYS);
    let title = w.required_string(obj, "title");
    let author = w.nullable_string(obj, "author");
    let date = w.nullable_string(obj, "date");
    Some(FrontPage {
        title: title?,
        author,
        date,
    })
}

fn walk_slide(w: &mut Walker, value: &Value) -> Option<Slide> {
    let Some(obj) = value.as_object() else {
        w.error(format!("expected slide object, got {}", json_kind(value)));
        return None;
    };
    w.ignore_unknown_keys(obj, SLIDE_KEYS);

    let id = w.enter(SchemaPathElem::Field("id"), |w| match obj.get("id") {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(id) => Some(id),
            None => {
                w.error(format!("expected non-negative integer, got {n}"));
                None
            }
        },
        found => {
            let got = found.map_or("nothing (field is required)", json_kind);
            w.error(format!("expected number, got {got}"));
            None
        }
    });
    let layout = w.nullable_string(obj, "layout");
    let title = w.nullable_string(obj, "title");
    let audio_narration_in_english = w.nullable_string(obj, "audioNarrationInEnglish");
    let audio_narration_in_hindi = w.nullable_string(obj, "audioNarrationInHindi");

    let blocks = w.enter(SchemaPathElem::Field("blocks"), |w| match obj.get("blocks") {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => {
            let blocks: Vec<Option<Block>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| w.enter(SchemaPathElem::Index(i), |w| walk_block(w, item)))
                .collect();
            blocks.into_iter().collect()
        }
        Some(other) => {
            w.error(format!("expected array of blocks, got {}", json_kind(other)));
            None
        }
    });

    Some(Slide {
        id: id?,
        layout,
        title,
        blocks: blocks?,
        audio_narration_in_english,
        audio_narration_in_hindi,
    })
}

fn walk_block(w: &mut Walker, value: &Value) -> Option<Block> {
    let Some(obj) = value.as_object() else {
        w.error(format!("expected block object, got {}", json_kind(value)));
        return None;
    };

    let tag = match obj.get("type") {
        Some(Value::String(s)) if BLOCK_TYPES.contains(&s.as_str()) => s.as_str(),
        Some(Value::String(s)) => {
            w.enter(SchemaPathElem::Field("type"), |w| {
                w.error(format!(
                    "unknown block type \"{s}\", expected one of {}",
                    BLOCK_TYPES.join(", ")
                ));
            });
            return None;
        }
        found => {
            let got = found.map_or("nothing (field is required)", json_kind);
            w.enter(SchemaPathElem::Field("type"), |w| {
                w.error(format!("expected block type string, got {got}"));
            });
            return None;
        }
    };

    let allowed: &[&str] = match tag {
        "text" => &["type", "text", "style"],
        "bullets" => &["type", "items"],
        "image" => &["type", "alt", "caption"],
        _ => &["type", "language", "code"],
    };
    let mut foreign = false;
    for key in obj.keys().filter(|k| !allowed.contains(&k.as_str())) {
        foreign = true;
        w.enter(SchemaPathElem::Key(key.clone()), |w| {
            w.error(format!("field is not allowed on a {tag} block"));
        });
    }

    let block = match tag {
        "text" => {
            let text = w.required_string(obj, "text");
            let style = w.enter(SchemaPathElem::Field("style"), |w| match obj.get("style") {
                None | Some(Value::Null) => Some(TextStyle::default()),
                Some(Value::String(s)) => {
                    let style = TextStyle::from_name(s);
                    if style.is_none() {
                        w.error(format!(
                            "unknown text style \"{s}\", expected one of {}",
                            TextStyle::NAMES.join(", ")
                        ));
                    }
                    style
                }
                Some(other) => {
                    w.error(format!("expected string, got {}", json_kind(other)));
                    None
                }
            });
            Some(Block::Text {
                text: text?,
                style: style?,
            })
        }
        "bullets" => w
            .enter(SchemaPathElem::Field("items"), |w| walk_string_array(w, obj.get("items")))
            .map(|items| Block::Bullets { items }),
        "image" => Some(Block::Image {
            alt: w.nullable_string(obj, "alt"),
            caption: w.nullable_string(obj, "caption"),
        }),
        _ => {
            let language = w.nullable_string(obj, "language");
            let code = w.required_string(obj, "code");
            Some(Block::Code {
                language,
                code: code?,
            })
        }
    };

    if foreign { None } else { block }
}

fn walk_string_array(w: &mut Walker, value: Option<&Value>) -> Option<Vec<String>> {
    let Some(Value::Array(items)) = value else {
        let got = value.map_or("nothing (field is required)", json_kind);
        w.error(format!("expected array of strings, got {got}"));
        return None;
    };

    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => out.push(s.clone()),
            other => {
                ok = false;
                w.enter(SchemaPathElem::Index(i), |w| {
                    w.error(format!("expected string, got {}", json_kind(other)));
                });
            }
        }
    }
    ok.then_some(out)
}

/// Slide ids are display tokens; mismatches with position are reported, not rejected.
fn check_slide_ids(w: &mut Walker, slides: &[Slide]) {
    let mut first_seen = HashMap::<u64, usize>::new();
    for (i, slide) in slides.iter().enumerate() {
        w.enter(SchemaPathElem::Index(i), |w| {
            w.enter(SchemaPathElem::Field("id"), |w| {
                if let Some(prev) = first_seen.get(&slide.id) {
                    w.warn(format!(
                        "duplicate slide id {} (first used by slides[{prev}])",
                        slide.id
                    ));
                } else {
                    first_seen.insert(slide.id, i);
                }
                let expected = i as u64 + 1;
                if slide.id != expected {
                    w.warn(format!(
                        "slide id {} does not match its position {expected}",
                        slide.id
                    ));
                }
            });
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/validate.rs"]
mod tests;
