//! Text measurement and shaping using cosmic-text.
//!
//! Glyphs come back as vector outlines so the compositor can fill or stroke
//! them under an arbitrary transform and blend mode.

use cosmic_text::{
    Attrs, Buffer, CacheKeyFlags, Command, Family, FontSystem, Metrics, Shaping, SwashCache,
};

use crate::assets::Assets;

/// A glyph outline positioned relative to the text origin (baseline left).
pub struct ShapedGlyph {
    pub path: tiny_skia::Path,
    pub x: f32,
    pub y: f32,
}

/// A shaped single-line text run.
pub struct ShapedText {
    pub glyphs: Vec<ShapedGlyph>,
    /// Advance width of the run in pixels.
    pub width: f32,
}

/// Per-request text engine: a font system bound to the shared database plus
/// a glyph outline cache.
pub struct TextShaper {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
}

impl TextShaper {
    pub fn new(assets: &Assets) -> Self {
        let font_system =
            FontSystem::new_with_locale_and_db("en".to_string(), assets.fontdb().clone());
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            family: assets.family().map(str::to_owned),
        }
    }

    /// Measure the advance width of `text` at `px` pixels.
    pub fn measure(&mut self, text: &str, px: f32) -> f32 {
        if !(px > 0.0) {
            return 0.0;
        }
        let metrics = Metrics::new(px, px * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);

        let family = match &self.family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new()
            .family(family)
            .cache_key_flags(CacheKeyFlags::DISABLE_HINTING);

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut width: f32 = 0.0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
        }
        width
    }

    /// Shape `text` at `px` pixels into positioned glyph outlines.
    ///
    /// Font outlines have Y pointing up while the canvas Y points down, so Y
    /// coordinates are negated during path building.
    pub fn shape(&mut self, text: &str, px: f32) -> ShapedText {
        if !(px > 0.0) {
            return ShapedText {
                glyphs: Vec::new(),
                width: 0.0,
            };
        }
        let metrics = Metrics::new(px, px * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);

        let family = match &self.family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new()
            .family(family)
            .cache_key_flags(CacheKeyFlags::DISABLE_HINTING);

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut width: f32 = 0.0;
        let mut glyphs = Vec::new();

        for run in buffer.layout_runs() {
            width = width.max(run.line_w);

            for glyph in run.glyphs.iter() {
                // The cache key is position-independent; outlines are
                // retrieved once per (font, size) pair.
                let physical_glyph = glyph.physical((0.0, 0.0), 1.0);

                let glyph_x = glyph.x + glyph.font_size * glyph.x_offset;
                let glyph_y = glyph.y - glyph.font_size * glyph.y_offset;

                if let Some(commands) = self
                    .swash_cache
                    .get_outline_commands(&mut self.font_system, physical_glyph.cache_key)
                {
                    let mut path_builder = tiny_skia::PathBuilder::new();
                    for cmd in commands {
                        match cmd {
                            Command::MoveTo(p) => path_builder.move_to(p.x, -p.y),
                            Command::LineTo(p) => path_builder.line_to(p.x, -p.y),
                            Command::QuadTo(ctrl, end) => {
                                path_builder.quad_to(ctrl.x, -ctrl.y, end.x, -end.y)
                            }
                            Command::CurveTo(c1, c2, end) => {
                                path_builder.cubic_to(c1.x, -c1.y, c2.x, -c2.y, end.x, -end.y)
                            }
                            Command::Close => path_builder.close(),
                        }
                    }

                    if let Some(path) = path_builder.finish() {
                        glyphs.push(ShapedGlyph {
                            path,
                            x: glyph_x,
                            y: glyph_y,
                        });
                    }
                }
            }
        }

        ShapedText { glyphs, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetConfig;

    fn shaper() -> TextShaper {
        let assets = Assets::load(&AssetConfig::default()).unwrap();
        TextShaper::new(&assets)
    }

    #[test]
    fn test_measure_empty_is_zero() {
        let mut shaper = shaper();
        assert_eq!(shaper.measure("", 84.0), 0.0);
    }

    #[test]
    fn test_measure_scales_exactly_with_power_of_two() {
        // Pixel sizes that differ by a power of two produce exactly
        // proportional advances (pure f32 linear math, hinting disabled).
        let mut shaper = shaper();
        let w1 = shaper.measure("Blue", 42.0);
        let w2 = shaper.measure("Blue", 84.0);
        assert_eq!(w2, w1 * 2.0);
    }

    #[test]
    fn test_measure_monotonic_in_content() {
        let mut shaper = shaper();
        let short = shaper.measure("Blue", 84.0);
        let long = shaper.measure("BlueBlue", 84.0);
        assert!(long >= short);
    }

    #[test]
    fn test_shape_width_matches_measure() {
        let mut shaper = shaper();
        let measured = shaper.measure("Archive", 84.0);
        let shaped = shaper.shape("Archive", 84.0);
        assert_eq!(shaped.width, measured);
    }
}
