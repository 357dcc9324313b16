//! Layout: text measurement to panel widths, canvas size, baselines, and
//! the glyph anchor.

use crate::canvas::TextShaper;
use crate::params::RenderParams;

/// Clearance left of the left text for the glyph artwork. Empirical, like
/// the other two constants below: tuned against the artwork, not derived
/// from font metrics.
pub const LEFT_CLEARANCE: f32 = 160.0;

/// Clearance right of the glyph for the right text.
pub const RIGHT_CLEARANCE: f32 = 50.0;

/// Vertical gap between the main baseline and the subtitle.
pub const SUBTITLE_GAP: f32 = 15.0;

/// Computed geometry for one render. All values are in device pixels
/// (parameters arrive pre-scaled).
#[derive(Debug, Clone)]
pub struct Layout {
    /// Measured left text width plus clearance.
    pub text_width_l: f32,
    /// Measured right text width plus clearance.
    pub text_width_r: f32,
    /// Left panel: text width plus padding. Also the text anchor X.
    pub panel_width_l: f32,
    /// Right panel: text width plus padding.
    pub panel_width_r: f32,
    /// Final canvas width: the two panels, nothing else.
    pub canvas_width: f32,
    /// Canvas height, fixed by parameters.
    pub canvas_height: f32,
    /// Alphabetic baseline of both text runs.
    pub baseline_y: f32,
    /// Glyph box origin (halo, cross, and the hollow notch share it).
    pub glyph_x: f32,
    pub glyph_y: f32,
    /// Glyph box edge length (the canvas height).
    pub glyph_size: f32,
    /// Subtitle anchor: centered under the right text.
    pub subtitle_x: f32,
    pub subtitle_y: f32,
}

impl Layout {
    /// Measure both text runs and derive the full geometry.
    pub fn compute(shaper: &mut TextShaper, params: &RenderParams) -> Self {
        let measured_l = shaper.measure(&params.text_l, params.font_size);
        let measured_r = shaper.measure(&params.text_r, params.font_size);

        let text_width_l = measured_l + LEFT_CLEARANCE * params.scale;
        let text_width_r = measured_r + RIGHT_CLEARANCE * params.scale;

        let panel_width_l = text_width_l + params.padding_x;
        let panel_width_r = text_width_r + params.padding_x;

        let canvas_width = panel_width_l + panel_width_r;
        let canvas_height = params.canvas_height;
        let baseline_y = canvas_height * params.text_baseline;

        let glyph_size = canvas_height;
        let glyph_x = panel_width_l - canvas_height / 2.0 + params.graph_x;
        let glyph_y = params.graph_y;

        let subtitle_x = panel_width_l + text_width_r / 2.0;
        let subtitle_y = baseline_y + params.subtitle_font_size + SUBTITLE_GAP * params.scale;

        log::debug!(
            "layout: panels {:.1}+{:.1} -> canvas {:.0}x{:.0}, baseline {:.1}",
            panel_width_l,
            panel_width_r,
            canvas_width,
            canvas_height,
            baseline_y
        );

        Self {
            text_width_l,
            text_width_r,
            panel_width_l,
            panel_width_r,
            canvas_width,
            canvas_height,
            baseline_y,
            glyph_x,
            glyph_y,
            glyph_size,
            subtitle_x,
            subtitle_y,
        }
    }
}
