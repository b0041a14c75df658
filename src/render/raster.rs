use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// One rendered frame, RGBA8, row-major with no padding.
///
/// Frames coming out of [`SvgRasterizer`] are premultiplied alpha. The `premultiplied` flag makes
/// this explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha `image` buffer of this frame.
    pub fn to_rgba_image(&self) -> SlidecastResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            for px in data.chunks_exact_mut(4) {
                let a = u16::from(px[3]);
                if a == 0 || a == 255 {
                    continue;
                }
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, data).ok_or_else(|| {
            SlidecastError::render(format!(
                "frame buffer does not match {}x{}",
                self.width, self.height
            ))
        })
    }
}

/// Parses SVG scenes and rasterizes them at the output canvas size.
///
/// The font database is built once and shared by every parse.
#[derive(Clone)]
pub struct SvgRasterizer {
    canvas: Canvas,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("canvas", &self.canvas)
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl SvgRasterizer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` under `<assets_root>/fonts`.
    pub fn new(canvas: Canvas, assets_root: Option<&Path>) -> Self {
        Self::with_fontdb(canvas, build_fontdb(assets_root))
    }

    pub fn with_fontdb(canvas: Canvas, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { canvas, fontdb }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn rasterize(&self, svg: &str) -> SlidecastResult<FrameRGBA> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| SlidecastError::render(format!("parse scene svg: {e}")))?;
        let data = rasterize_svg_to_premul_rgba8(&tree, self.canvas.width, self.canvas.height)?;
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> SlidecastResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SlidecastError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

pub fn build_fontdb(assets_root: Option<&Path>) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(root) = assets_root {
        load_fonts_from_dir(&mut db, &root.join("fonts"));
    }
    tracing::debug!(faces = db.len(), "font database loaded");
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let is_font = path.is_file()
            && path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| {
                    matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc")
                });
        if is_font && let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

/// Resolve the theme's font families, then fall back to generic families and finally to any
/// face at all, so text never silently disappears.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                })
                .collect();
            families.extend([Family::SansSerif, Family::Serif, Family::Monospace]);

            let style = match font.style() {
                usvg::FontStyle::Normal => Style::Normal,
                usvg::FontStyle::Italic => Style::Italic,
                usvg::FontStyle::Oblique => Style::Oblique,
            };

            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
