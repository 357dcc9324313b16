//! Per-request orchestration: shaper → layout → layer plan → composite →
//! PNG bytes.

use crate::assets::Assets;
use crate::canvas::{LogoCanvas, TextShaper};
use crate::error::LogoResult;
use crate::layers::plan_layers;
use crate::layout::Layout;
use crate::params::RenderParams;

/// Render one logo to PNG bytes.
///
/// Stateless apart from the shared read-only assets; identical parameters
/// produce byte-identical output.
pub fn render(params: &RenderParams, assets: &Assets) -> LogoResult<Vec<u8>> {
    let mut shaper = TextShaper::new(assets);

    let layout = Layout::compute(&mut shaper, params);

    // Dimension validation happens before layer planning so an oversized
    // request fails cheaply, before any glyph rasterization.
    let width = layout.canvas_width.round().max(1.0) as u32;
    let height = layout.canvas_height.round().max(1.0) as u32;
    let mut canvas = LogoCanvas::new(width, height)?;

    let layers = plan_layers(params, &layout, assets)?;

    canvas.composite(&layers, &mut shaper);

    let png = canvas.to_png()?;
    log::debug!("rendered {}x{} ({} bytes)", width, height, png.len());
    Ok(png)
}
