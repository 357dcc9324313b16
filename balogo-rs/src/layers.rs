//! The render plan: an ordered list of immutable draw-layer descriptions.
//!
//! [`plan_layers`] turns resolved parameters plus the computed layout into
//! the exact sequence the compositor executes. Layer order is a correctness
//! invariant (background → left text → halo → right text → subtitle → notch
//! → cross), and every layer carries its own blend mode and shear so no
//! canvas state can leak from one step into the next.

use tiny_skia::Pixmap;

use crate::assets::{Assets, GlyphKind};
use crate::error::{LogoError, LogoResult};
use crate::layout::Layout;
use crate::params::{RenderParams, SubtitleAlign};

/// The fixed hollow-notch polygon in the 500-unit glyph reference frame.
pub(crate) const HOLLOW_PATH: [(f32, f32); 4] =
    [(284.0, 136.0), (321.0, 153.0), (159.0, 410.0), (148.0, 403.0)];

/// Reference frame the glyph templates and the hollow path are authored in.
pub(crate) const HOLLOW_FRAME: f32 = 500.0;

/// Contrast-halo stroke width around the right text, before scaling.
const STROKE_WIDTH: f32 = 12.0;

/// Blend mode a layer composites with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Normal source-over painting.
    Over,
    /// Destination-out: new content removes existing pixels' opacity.
    Erase,
}

impl From<Blend> for tiny_skia::BlendMode {
    fn from(blend: Blend) -> Self {
        match blend {
            Blend::Over => tiny_skia::BlendMode::SourceOver,
            Blend::Erase => tiny_skia::BlendMode::DestinationOut,
        }
    }
}

/// Horizontal alignment of a text run against its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl From<SubtitleAlign> for HAlign {
    fn from(align: SubtitleAlign) -> Self {
        match align {
            SubtitleAlign::Center => HAlign::Center,
            SubtitleAlign::Left | SubtitleAlign::Start => HAlign::Left,
            SubtitleAlign::Right | SubtitleAlign::End => HAlign::Right,
        }
    }
}

/// One text run: content, size, anchor, alignment, and color.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub px: f32,
    pub x: f32,
    pub y: f32,
    pub align: HAlign,
    pub color: tiny_skia::Color,
}

/// How the hollow notch composites.
#[derive(Debug, Clone, Copy)]
pub enum NotchFill {
    /// Punch the polygon out of everything drawn so far.
    Erase,
    /// Paint it in the background color to fake a cut.
    Color(tiny_skia::Color),
}

/// One immutable draw-layer description.
#[derive(Debug)]
pub enum Layer {
    /// Flat background fill across the whole canvas.
    Backdrop { color: tiny_skia::Color },
    /// Decoded background image stretched into a rectangle.
    Image {
        pixmap: Pixmap,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    /// Filled text, optionally sheared.
    TextFill { run: TextRun, shear: f32 },
    /// Stroked text. Never sheared; erase blend punches a cutout.
    TextStroke { run: TextRun, width: f32, blend: Blend },
    /// A recolored glyph template drawn as a square image.
    Glyph {
        pixmap: Pixmap,
        x: f32,
        y: f32,
        size: f32,
    },
    /// The hollow-notch polygon.
    Notch {
        points: [(f32, f32); 4],
        fill: NotchFill,
    },
}

/// Parse a CSS color string into a tiny_skia::Color.
pub fn parse_color(s: &str) -> LogoResult<tiny_skia::Color> {
    let parsed = csscolorparser::parse(s)
        .map_err(|err| LogoError::ColorParse(format!("{}: {}", s, err)))?;

    let [r, g, b, a] = parsed.to_array();
    Ok(tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::BLACK))
}

/// Decode an uploaded background image (PNG or JPEG) into a premultiplied
/// pixmap.
fn decode_background(bytes: &[u8]) -> LogoResult<Pixmap> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| LogoError::ImageDecode(err.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut pixmap = Pixmap::new(width, height).ok_or(LogoError::InvalidDimensions {
        width,
        height,
    })?;

    // Straight alpha in, premultiplied out. Integer math with rounding:
    // (color * alpha + 127) / 255.
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let a = src[3];
        let (r, g, b) = if a == 255 {
            (src[0], src[1], src[2])
        } else if a == 0 {
            (0, 0, 0)
        } else {
            let a16 = a as u16;
            (
                ((src[0] as u16 * a16 + 127) / 255) as u8,
                ((src[1] as u16 * a16 + 127) / 255) as u8,
                ((src[2] as u16 * a16 + 127) / 255) as u8,
            )
        };
        dst[0] = r;
        dst[1] = g;
        dst[2] = b;
        dst[3] = a;
    }

    Ok(pixmap)
}

/// Build the ordered layer list for one render.
pub fn plan_layers(
    params: &RenderParams,
    layout: &Layout,
    assets: &Assets,
) -> LogoResult<Vec<Layer>> {
    let bg_color = parse_color(&params.bg_color)?;
    let has_bg_image = params.bg_image.is_some();

    let mut layers = Vec::new();

    if !params.transparent {
        layers.push(Layer::Backdrop { color: bg_color });

        if let Some(bytes) = &params.bg_image {
            let pixmap = decode_background(bytes)?;
            // Unset extents default to "the rest of the canvas from the origin"
            let w = if params.bg_image_w != 0.0 {
                params.bg_image_w
            } else {
                layout.canvas_width - params.bg_image_x
            };
            let h = if params.bg_image_h != 0.0 {
                params.bg_image_h
            } else {
                layout.canvas_height - params.bg_image_y
            };
            layers.push(Layer::Image {
                pixmap,
                x: params.bg_image_x,
                y: params.bg_image_y,
                w,
                h,
            });
        }
    }

    layers.push(Layer::TextFill {
        run: TextRun {
            text: params.text_l.clone(),
            px: params.font_size,
            x: layout.panel_width_l,
            y: layout.baseline_y,
            align: HAlign::Right,
            color: parse_color(&params.text_l_color)?,
        },
        shear: params.horizontal_tilt,
    });

    if !params.hide_halo {
        layers.push(Layer::Glyph {
            pixmap: assets.glyph_pixmap(GlyphKind::Halo, &params.halo_color, layout.glyph_size)?,
            x: layout.glyph_x,
            y: layout.glyph_y,
            size: layout.glyph_size,
        });
    }

    // The stroke pass doubles as the contrast halo (opaque) or the cutout
    // (transparent); with a background image neither applies.
    if !has_bg_image {
        layers.push(Layer::TextStroke {
            run: TextRun {
                text: params.text_r.clone(),
                px: params.font_size,
                x: layout.panel_width_l,
                y: layout.baseline_y,
                align: HAlign::Left,
                color: bg_color,
            },
            width: STROKE_WIDTH * params.scale,
            blend: if params.transparent {
                Blend::Erase
            } else {
                Blend::Over
            },
        });
    }

    layers.push(Layer::TextFill {
        run: TextRun {
            text: params.text_r.clone(),
            px: params.font_size,
            x: layout.panel_width_l,
            y: layout.baseline_y,
            align: HAlign::Left,
            color: parse_color(&params.text_r_color)?,
        },
        shear: params.horizontal_tilt,
    });

    if !params.subtitle.is_empty() {
        layers.push(Layer::TextFill {
            run: TextRun {
                text: params.subtitle.clone(),
                px: params.subtitle_font_size,
                x: layout.subtitle_x,
                y: layout.subtitle_y,
                align: params.subtitle_align.into(),
                color: parse_color(&params.subtitle_color)?,
            },
            shear: params.horizontal_tilt,
        });
    }

    let points = HOLLOW_PATH.map(|(x, y)| {
        (
            layout.glyph_x + x / HOLLOW_FRAME * layout.glyph_size,
            layout.glyph_y + y / HOLLOW_FRAME * layout.glyph_size,
        )
    });
    if params.transparent {
        layers.push(Layer::Notch {
            points,
            fill: NotchFill::Erase,
        });
    } else if !has_bg_image {
        layers.push(Layer::Notch {
            points,
            fill: NotchFill::Color(bg_color),
        });
    }

    if !params.hide_cross {
        layers.push(Layer::Glyph {
            pixmap: assets.glyph_pixmap(GlyphKind::Cross, &params.cross_color, layout.glyph_size)?,
            x: layout.glyph_x,
            y: layout.glyph_y,
            size: layout.glyph_size,
        });
    }

    Ok(layers)
}
