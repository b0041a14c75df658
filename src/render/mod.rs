//! Slide rendering: layout, SVG scenes, rasterization and the render driver.

pub mod driver;
pub mod layout;
pub mod raster;
pub mod scene;

pub use driver::{
    COMPOSITION_ID, InputProps, RenderDriver, RenderProgress, RenderRequest, RenderStats,
    SlideDriver,
};
pub use layout::Layout;
pub use raster::{FrameRGBA, SvgRasterizer};
pub use scene::SceneBuilder;
