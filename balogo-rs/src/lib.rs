//! Rendering pipeline for the two-tone halo logo.
//!
//! One render is a single pass through four stages:
//! - `params`: merge request values with configured defaults into a typed,
//!   validated [`RenderParams`] (scale applied exactly once, here)
//! - `layout`: measure the text and derive panel widths, the final canvas
//!   size, baselines, and the glyph anchor
//! - `layers`: describe the full render as an ordered list of immutable
//!   [`Layer`]s, each carrying its own blend mode and shear
//! - `canvas`: consume the layer list into a pixmap and encode it as PNG
//!
//! It uses:
//! - `tiny-skia` for 2D rasterization and compositing
//! - `cosmic-text` for text shaping and measurement
//! - `fontdb` for font database management
//! - `usvg`/`resvg` for the vector glyph templates
//!
//! # Example
//!
//! ```rust,ignore
//! use balogo_rs::{Assets, AssetConfig, RenderDefaults, RenderParams, render};
//!
//! let assets = Assets::load(&AssetConfig::default())?;
//! let params = RenderParams::resolve(&RenderDefaults::default(), &query, &body, None)?;
//! let png_data = render(&params, &assets)?;
//! ```

mod assets;
mod canvas;
mod encode;
mod error;
mod layers;
mod layout;
mod params;
mod render;

// Re-export public API
pub use assets::{AssetConfig, Assets, GlyphKind};
pub use canvas::{LogoCanvas, ShapedGlyph, ShapedText, TextShaper};
pub use encode::TextEncoding;
pub use error::{LogoError, LogoResult};
pub use layers::{plan_layers, Blend, HAlign, Layer, NotchFill, TextRun};
pub use layout::{Layout, LEFT_CLEARANCE, RIGHT_CLEARANCE, SUBTITLE_GAP};
pub use params::{OutputType, ParamMap, RenderDefaults, RenderParams, SubtitleAlign};
pub use render::render;
