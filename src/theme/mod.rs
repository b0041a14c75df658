//! Named visual themes.
//!
//! Sizes are pixels on a 1080-pixel-high reference canvas; the scene builder scales them to the
//! output resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Name of the theme every unknown or absent name resolves to.
pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    pub text_secondary: String,
    pub accent: String,
    pub border: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeFonts {
    pub heading: String,
    pub body: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSpacing {
    pub slide_margin: f64,
    pub block_gap: f64,
    pub heading_margin: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeFontSizes {
    pub title: f64,
    pub subtitle: f64,
    pub heading: f64,
    pub body: f64,
    pub small: f64,
}

/// A bundle of color, font, spacing and size tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    pub fonts: ThemeFonts,
    pub spacing: ThemeSpacing,
    pub font_size: ThemeFontSizes,
    /// Font weight for bullet items.
    pub bullet_weight: u16,
}

impl Theme {
    /// The built-in `default` theme.
    pub fn default_theme() -> Self {
        Self {
            name: DEFAULT_THEME.to_owned(),
            colors: ThemeColors {
                primary: "#3B82F6".to_owned(),
                secondary: "#8B5CF6".to_owned(),
                background: "#FFFFFF".to_owned(),
                text: "#1F2937".to_owned(),
                text_secondary: "#6B7280".to_owned(),
                accent: "#10B981".to_owned(),
                border: "#E5E7EB".to_owned(),
            },
            fonts: ThemeFonts {
                heading: "Inter, sans-serif".to_owned(),
                body: "Inter, sans-serif".to_owned(),
                code: "Fira Code, monospace".to_owned(),
            },
            spacing: ThemeSpacing {
                slide_margin: 64.0,
                block_gap: 24.0,
                heading_margin: 32.0,
            },
            font_size: ThemeFontSizes {
                title: 56.0,
                subtitle: 32.0,
                heading: 40.0,
                body: 20.0,
                small: 16.0,
            },
            bullet_weight: 400,
        }
    }

    /// The built-in `gov-blue` theme.
    pub fn gov_blue() -> Self {
        Self {
            name: "gov-blue".to_owned(),
            colors: ThemeColors {
                primary: "blue".to_owned(),
                secondary: "#3B82F6".to_owned(),
                background: "#F0F9FF".to_owned(),
                text: "#1E3A8A".to_owned(),
                text_secondary: "#3B82F6".to_owned(),
                accent: "#DBEAFE".to_owned(),
                border: "#93C5FD".to_owned(),
            },
            fonts: ThemeFonts {
                heading: "Zalando Sans, sans-serif".to_owned(),
                body: "Inter, sans-serif".to_owned(),
                code: "Fira Code, monospace".to_owned(),
            },
            spacing: ThemeSpacing {
                slide_margin: 64.0,
                block_gap: 24.0,
                heading_margin: 32.0,
            },
            font_size: ThemeFontSizes {
                title: 72.0,
                subtitle: 32.0,
                heading: 56.0,
                body: 20.0,
                small: 16.0,
            },
            bullet_weight: 500,
        }
    }
}

/// Immutable name → theme mapping, passed explicitly to whatever renders slides.
///
/// Always contains a [`DEFAULT_THEME`] entry, so [`ThemeRegistry::resolve`] is total.
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: Arc<BTreeMap<String, Theme>>,
}

impl ThemeRegistry {
    /// Registry holding `default` and `gov-blue`.
    pub fn builtin() -> Self {
        Self::from_themes([Theme::default_theme(), Theme::gov_blue()], Theme::default_theme())
    }

    /// Build a registry from `themes`. `fallback` is registered under [`DEFAULT_THEME`],
    /// replacing any theme of that name in `themes`.
    pub fn from_themes(themes: impl IntoIterator<Item = Theme>, fallback: Theme) -> Self {
        let mut map: BTreeMap<String, Theme> =
            themes.into_iter().map(|t| (t.name.clone(), t)).collect();
        map.insert(DEFAULT_THEME.to_owned(), fallback);
        Self {
            themes: Arc::new(map),
        }
    }

    /// Look up `name`, falling back to the default theme when absent or unknown.
    pub fn resolve(&self, name: Option<&str>) -> &Theme {
        if let Some(theme) = name.and_then(|n| self.themes.get(n)) {
            return theme;
        }
        if let Some(n) = name {
            tracing::warn!(theme = n, "unknown theme, using default");
        }
        &self.themes[DEFAULT_THEME]
    }

    /// Registered theme names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
