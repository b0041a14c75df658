//! Slide and front page scenes as SVG documents.
//!
//! Theme sizes are authored for a 1080-pixel-high canvas and scaled by
//! [`Canvas::reference_scale`]. Text is wrapped greedily with an average glyph advance, so line
//! breaks do not depend on which fonts are installed.

use crate::document::model::{Block, FrontPage, Slide, TextStyle};
use crate::foundation::core::Canvas;
use crate::render::layout::Layout;
use crate::theme::Theme;

const LINE_HEIGHT: f64 = 1.3;
const CODE_LINE_HEIGHT: f64 = 1.45;
const PROPORTIONAL_ADVANCE: f64 = 0.52;
const MONO_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Start,
    Middle,
}

impl Align {
    fn anchor(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

/// Horizontal slot blocks are laid into.
#[derive(Debug, Clone, Copy)]
struct Column {
    x: f64,
    width: f64,
    align: Align,
}

impl Column {
    fn text_x(&self) -> f64 {
        match self.align {
            Align::Start => self.x,
            Align::Middle => self.x + self.width / 2.0,
        }
    }
}

struct TextRun<'t> {
    size: f64,
    weight: u16,
    family: &'t str,
    fill: &'t str,
    italic: bool,
}

/// Builds SVG scenes for one theme at one output size.
#[derive(Debug, Clone, Copy)]
pub struct SceneBuilder<'a> {
    theme: &'a Theme,
    canvas: Canvas,
    scale: f64,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(theme: &'a Theme, canvas: Canvas) -> Self {
        Self {
            theme,
            canvas,
            scale: canvas.reference_scale(),
        }
    }

    fn px(&self, v: f64) -> f64 {
        v * self.scale
    }

    fn width(&self) -> f64 {
        f64::from(self.canvas.width)
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height)
    }

    fn open(&self) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.canvas.width,
            h = self.canvas.height,
        );
        out.push_str(&format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            self.canvas.width,
            self.canvas.height,
            escape_xml(&self.theme.colors.background)
        ));
        out
    }

    /// Centered title card with optional author and date.
    pub fn front_page(&self, front: &FrontPage) -> String {
        let t = self.theme;
        let margin = self.px(t.spacing.slide_margin);
        let col = Column {
            x: margin,
            width: self.width() - 2.0 * margin,
            align: Align::Middle,
        };

        let mut body = String::new();
        let title = TextRun {
            size: self.px(t.font_size.title),
            weight: 700,
            family: &t.fonts.heading,
            fill: &t.colors.primary,
            italic: false,
        };
        let mut y = self.paragraph(&mut body, &col, 0.0, &front.title, &title, false);

        let bar_w = self.px(120.0);
        y += self.px(t.spacing.heading_margin) / 2.0;
        body.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            col.text_x() - bar_w / 2.0,
            y,
            bar_w,
            self.px(6.0),
            escape_xml(&t.colors.accent)
        ));
        y += self.px(6.0) + self.px(t.spacing.heading_margin) / 2.0;

        if let Some(author) = front.author.as_deref().filter(|s| !s.trim().is_empty()) {
            let run = TextRun {
                size: self.px(t.font_size.subtitle),
                weight: 400,
                family: &t.fonts.body,
                fill: &t.colors.text,
                italic: false,
            };
            y += self.paragraph(&mut body, &col, y, author, &run, false);
        }
        if let Some(date) = front.date.as_deref().filter(|s| !s.trim().is_empty()) {
            let run = TextRun {
                size: self.px(t.font_size.body),
                weight: 400,
                family: &t.fonts.body,
                fill: &t.colors.text_secondary,
                italic: false,
            };
            y += self.paragraph(&mut body, &col, y, date, &run, false);
        }

        let mut out = self.open();
        out.push_str(&format!(
            r#"<g transform="translate(0 {:.1})">"#,
            ((self.height() - y) / 2.0).max(0.0)
        ));
        out.push_str(&body);
        out.push_str("</g></svg>");
        out
    }

    /// A slide: optional title bar, then its blocks arranged by layout.
    pub fn slide(&self, slide: &Slide) -> String {
        let t = self.theme;
        let layout = Layout::from_tag(slide.layout.as_deref());
        let margin = self.px(t.spacing.slide_margin);
        let gap = self.px(t.spacing.block_gap);

        let mut out = self.open();
        let mut top = margin;

        if layout.shows_title_bar()
            && let Some(title) = slide.title.as_deref().filter(|s| !s.trim().is_empty())
        {
            let col = Column {
                x: margin,
                width: self.width() - 2.0 * margin,
                align: Align::Start,
            };
            let run = TextRun {
                size: self.px(t.font_size.heading),
                weight: 700,
                family: &t.fonts.heading,
                fill: &t.colors.primary,
                italic: false,
            };
            let h = self.paragraph(&mut out, &col, top, title, &run, false);
            top += h + self.px(t.spacing.heading_margin) / 2.0;
            out.push_str(&format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                margin,
                top,
                col.width,
                self.px(3.0),
                escape_xml(&t.colors.border)
            ));
            top += self.px(3.0) + self.px(t.spacing.heading_margin) / 2.0;
        }

        let columns = layout.columns(&slide.blocks);
        let n = columns.len().max(1) as f64;
        let col_width = (self.width() - 2.0 * margin - (n - 1.0) * gap) / n;
        let align = if layout == Layout::TitleSlide {
            Align::Middle
        } else {
            Align::Start
        };

        for (i, blocks) in columns.iter().enumerate() {
            let col = Column {
                x: margin + i as f64 * (col_width + gap),
                width: col_width,
                align,
            };
            let mut body = String::new();
            let mut y = 0.0;
            for (j, block) in blocks.iter().enumerate() {
                if j > 0 {
                    y += gap;
                }
                y += self.block(&mut body, &col, y, block);
            }

            let offset = match layout {
                Layout::TitleSlide => ((self.height() - y) / 2.0).max(top),
                _ => top,
            };
            out.push_str(&format!(r#"<g transform="translate(0 {offset:.1})">"#));
            out.push_str(&body);
            out.push_str("</g>");
        }

        out.push_str("</svg>");
        out
    }

    /// Draw one block at `y` and return its height.
    fn block(&self, out: &mut String, col: &Column, y: f64, block: &Block) -> f64 {
        let t = self.theme;
        match block {
            Block::Text { text, style } => {
                let run = match style {
                    TextStyle::Title => TextRun {
                        size: self.px(t.font_size.title),
                        weight: 700,
                        family: &t.fonts.heading,
                        fill: &t.colors.text,
                        italic: false,
                    },
                    TextStyle::Subtitle => TextRun {
                        size: self.px(t.font_size.subtitle),
                        weight: 400,
                        family: &t.fonts.body,
                        fill: &t.colors.text_secondary,
                        italic: false,
                    },
                    TextStyle::Code => TextRun {
                        size: self.px(t.font_size.body),
                        weight: 400,
                        family: &t.fonts.code,
                        fill: &t.colors.text,
                        italic: false,
                    },
                    TextStyle::Normal => TextRun {
                        size: self.px(t.font_size.body),
                        weight: 400,
                        family: &t.fonts.body,
                        fill: &t.colors.text,
                        italic: false,
                    },
                };
                self.paragraph(out, col, y, text, &run, *style == TextStyle::Code)
            }
            Block::Bullets { items } => self.bullets(out, col, y, items),
            Block::Image { alt, caption } => {
                self.image_placeholder(out, col, y, alt.as_deref(), caption.as_deref())
            }
            Block::Code { language, code } => {
                self.code(out, col, y, language.as_deref(), code)
            }
        }
    }

    fn bullets(&self, out: &mut String, col: &Column, y: f64, items: &[String]) -> f64 {
        let t = self.theme;
        let size = self.px(t.font_size.body);
        let run = TextRun {
            size,
            weight: t.bullet_weight,
            family: &t.fonts.body,
            fill: &t.colors.text,
            italic: false,
        };
        let item_gap = size * 0.5;
        let indent = size * 1.5;

        let mut h = 0.0;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                h += item_gap;
            }
            match col.align {
                Align::Start => {
                    out.push_str(&format!(
                        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
                        col.x + size * 0.5,
                        y + h + size * 0.65,
                        size * 0.2,
                        escape_xml(&t.colors.primary)
                    ));
                    let inner = Column {
                        x: col.x + indent,
                        width: (col.width - indent).max(size),
                        align: Align::Start,
                    };
                    h += self.paragraph(out, &inner, y + h, item, &run, false);
                }
                Align::Middle => {
                    h += self.paragraph(out, col, y + h, &format!("\u{2022} {item}"), &run, false);
                }
            }
        }
        h
    }

    fn image_placeholder(
        &self,
        out: &mut String,
        col: &Column,
        y: f64,
        alt: Option<&str>,
        caption: Option<&str>,
    ) -> f64 {
        let t = self.theme;
        let box_h = (col.width * 9.0 / 16.0).min(self.px(360.0));
        out.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="{:.1}" fill="none" stroke="{}" stroke-width="{:.1}" stroke-dasharray="{:.1} {:.1}"/>"#,
            col.x,
            y,
            col.width,
            box_h,
            self.px(8.0),
            escape_xml(&t.colors.border),
            self.px(2.0),
            self.px(10.0),
            self.px(6.0)
        ));

        let small = TextRun {
            size: self.px(t.font_size.small),
            weight: 400,
            family: &t.fonts.body,
            fill: &t.colors.text_secondary,
            italic: false,
        };
        if let Some(alt) = alt.filter(|s| !s.trim().is_empty()) {
            let inner = Column {
                x: col.x + self.px(16.0),
                width: col.width - self.px(32.0),
                align: Align::Middle,
            };
            let lines = wrap_text(alt, inner.width, small.size, false);
            let text_h = lines.len() as f64 * small.size * LINE_HEIGHT;
            let top = y + ((box_h - text_h) / 2.0).max(0.0);
            self.lines(out, &inner, top, &lines, &small);
        }

        let mut h = box_h;
        if let Some(caption) = caption.filter(|s| !s.trim().is_empty()) {
            h += self.px(8.0);
            let run = TextRun { italic: true, ..small };
            h += self.paragraph(out, col, y + h, caption, &run, false);
        }
        h
    }

    fn code(
        &self,
        out: &mut String,
        col: &Column,
        y: f64,
        language: Option<&str>,
        code: &str,
    ) -> f64 {
        let t = self.theme;
        let pad = self.px(16.0);
        let size = self.px(t.font_size.small);
        let lines: Vec<String> = code.lines().map(|l| l.replace('\t', "    ")).collect();
        let box_h = pad * 2.0 + lines.len().max(1) as f64 * size * CODE_LINE_HEIGHT;

        out.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="{:.1}" fill="{}"/>"#,
            col.x,
            y,
            col.width,
            box_h,
            self.px(8.0),
            escape_xml(&t.colors.text)
        ));
        if let Some(lang) = language.filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="{:.1}" font-family="{}" fill="{}">{}</text>"#,
                col.x + col.width - pad,
                y + pad + size * 0.8,
                size * 0.8,
                escape_xml(&t.fonts.code),
                escape_xml(&t.colors.text_secondary),
                escape_xml(lang)
            ));
        }

        let run = TextRun {
            size,
            weight: 400,
            family: &t.fonts.code,
            fill: &t.colors.background,
            italic: false,
        };
        let inner = Column {
            x: col.x + pad,
            width: col.width - 2.0 * pad,
            align: Align::Start,
        };
        for (i, line) in lines.iter().enumerate() {
            let baseline = y + pad + i as f64 * size * CODE_LINE_HEIGHT + size;
            self.text_element(out, &inner, baseline, line, &run, true);
        }
        box_h
    }

    /// Wrap `text` into `col` starting at `y` and return the height used.
    fn paragraph(
        &self,
        out: &mut String,
        col: &Column,
        y: f64,
        text: &str,
        run: &TextRun<'_>,
        mono: bool,
    ) -> f64 {
        let lines = wrap_text(text, col.width, run.size, mono);
        self.lines(out, col, y, &lines, run)
    }

    fn lines(
        &self,
        out: &mut String,
        col: &Column,
        y: f64,
        lines: &[String],
        run: &TextRun<'_>,
    ) -> f64 {
        let step = run.size * LINE_HEIGHT;
        for (i, line) in lines.iter().enumerate() {
            // Baseline sits one font size below the line box top.
            let baseline = y + i as f64 * step + run.size;
            self.text_element(out, col, baseline, line, run, false);
        }
        lines.len() as f64 * step
    }

    fn text_element(
        &self,
        out: &mut String,
        col: &Column,
        baseline: f64,
        content: &str,
        run: &TextRun<'_>,
        preserve_space: bool,
    ) {
        if content.is_empty() {
            return;
        }
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="{}" font-size="{:.1}" font-weight="{}" font-family="{}" fill="{}"{}{}>{}</text>"#,
            col.text_x(),
            baseline,
            col.align.anchor(),
            run.size,
            run.weight,
            escape_xml(run.family),
            escape_xml(run.fill),
            if run.italic { r#" font-style="italic""# } else { "" },
            if preserve_space { r#" xml:space="preserve""# } else { "" },
            escape_xml(content)
        ));
    }
}

/// Escape text for use in SVG character data and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Greedy word wrap to `max_width` pixels using an average glyph advance.
///
/// Explicit newlines start a new line. Words longer than a whole line are split.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64, mono: bool) -> Vec<String> {
    let advance = font_size * if mono { MONO_ADVANCE } else { PROPORTIONAL_ADVANCE };
    let max_chars = if advance > 0.0 {
        ((max_width / advance).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_chars = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if line_chars > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_chars = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if line_chars == 0 {
                word.len()
            } else {
                line_chars + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
                line_chars = 0;
            }
            if line_chars > 0 {
                line.push(' ');
                line_chars += 1;
            }
            line.extend(word.iter());
            line_chars += word.len();
        }
        if line_chars > 0 || lines.is_empty() || paragraph.trim().is_empty() {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
