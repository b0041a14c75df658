use crate::document::model::Block;

/// How a slide's blocks are arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Blocks stacked top to bottom under the title bar.
    #[default]
    Default,
    /// Blocks centered vertically, no title bar.
    TitleSlide,
    /// First `ceil(n/2)` blocks on the left, the rest on the right.
    TwoColumn,
    /// Text blocks first, then everything else.
    TitleAndContent,
}

impl Layout {
    /// Map a slide's `layout` tag. Unknown and absent tags are [`Layout::Default`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Default;
        };
        match tag.trim().to_ascii_lowercase().as_str() {
            "title-slide" => Self::TitleSlide,
            "two-column" => Self::TwoColumn,
            "title-and-content" => Self::TitleAndContent,
            _ => Self::Default,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::TitleSlide => "title-slide",
            Self::TwoColumn => "two-column",
            Self::TitleAndContent => "title-and-content",
        }
    }

    pub fn shows_title_bar(self) -> bool {
        self != Self::TitleSlide
    }

    /// Split `blocks` into columns in drawing order.
    pub fn columns(self, blocks: &[Block]) -> Vec<Vec<&Block>> {
        match self {
            Self::TwoColumn => {
                let split = blocks.len().div_ceil(2);
                let (left, right) = blocks.split_at(split);
                vec![left.iter().collect(), right.iter().collect()]
            }
            Self::TitleAndContent => {
                let mut ordered: Vec<&Block> = blocks.iter().collect();
                ordered.sort_by_key(|b| !matches!(b, Block::Text { .. }));
                vec![ordered]
            }
            Self::Default | Self::TitleSlide => vec![blocks.iter().collect()],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
