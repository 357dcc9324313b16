//! The per-request drawing surface.
//!
//! [`LogoCanvas`] wraps a `tiny-skia` pixmap and knows how to consume an
//! ordered [`Layer`] list. Every operation takes its blend mode and
//! transform from the layer itself, so nothing persists between layers —
//! there is no save/restore discipline to get wrong.

mod text;

pub use text::{ShapedGlyph, ShapedText, TextShaper};

use tiny_skia::{
    BlendMode, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::error::{LogoError, LogoResult};
use crate::layers::{HAlign, Layer, NotchFill, TextRun};

/// Maximum canvas dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// One render's pixel buffer. Created after layout, consumed once into PNG.
pub struct LogoCanvas {
    width: u32,
    height: u32,
    pixmap: Pixmap,
}

impl LogoCanvas {
    /// Create a canvas with the specified dimensions.
    pub fn new(width: u32, height: u32) -> LogoResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(LogoError::InvalidDimensions { width, height });
        }
        let pixmap =
            Pixmap::new(width, height).ok_or(LogoError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            pixmap,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixel at (x, y), for probing in tests.
    pub fn pixel(&self, x: u32, y: u32) -> Option<tiny_skia::PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Consume the layer list in order. Order is the correctness invariant;
    /// each layer carries everything it needs.
    pub fn composite(&mut self, layers: &[Layer], shaper: &mut TextShaper) {
        for layer in layers {
            match layer {
                Layer::Backdrop { color } => {
                    log::debug!(target: "canvas", "backdrop");
                    self.pixmap.fill(*color);
                }
                Layer::Image { pixmap, x, y, w, h } => {
                    log::debug!(target: "canvas", "image {}x{} at {} {}", w, h, x, y);
                    self.draw_pixmap_scaled(pixmap, *x, *y, *w, *h);
                }
                Layer::TextFill { run, shear } => {
                    log::debug!(target: "canvas", "fillText \"{}\" {} {}", run.text, run.x, run.y);
                    self.render_text(shaper, run, None, *shear, BlendMode::SourceOver);
                }
                Layer::TextStroke { run, width, blend } => {
                    log::debug!(target: "canvas", "strokeText \"{}\" {} {}", run.text, run.x, run.y);
                    self.render_text(shaper, run, Some(*width), 0.0, (*blend).into());
                }
                Layer::Glyph { pixmap, x, y, size } => {
                    log::debug!(target: "canvas", "glyph at {} {} size {}", x, y, size);
                    self.draw_pixmap_scaled(pixmap, *x, *y, *size, *size);
                }
                Layer::Notch { points, fill } => {
                    log::debug!(target: "canvas", "notch {:?}", fill);
                    self.fill_polygon(points, *fill);
                }
            }
        }
    }

    /// Draw a premultiplied pixmap stretched into a destination rectangle.
    fn draw_pixmap_scaled(&mut self, image: &Pixmap, dx: f32, dy: f32, dw: f32, dh: f32) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality: tiny_skia::FilterQuality::Bilinear,
        };
        let scale_x = dw / image.width() as f32;
        let scale_y = dh / image.height() as f32;
        let transform = Transform::from_translate(dx, dy).pre_scale(scale_x, scale_y);
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    }

    fn fill_polygon(&mut self, points: &[(f32, f32); 4], fill: NotchFill) {
        let (color, blend_mode) = match fill {
            NotchFill::Erase => (tiny_skia::Color::BLACK, BlendMode::DestinationOut),
            NotchFill::Color(color) => (color, BlendMode::SourceOver),
        };

        let mut pb = PathBuilder::new();
        pb.move_to(points[0].0, points[0].1);
        for point in &points[1..] {
            pb.line_to(point.0, point.1);
        }
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint {
                anti_alias: true,
                blend_mode,
                ..Default::default()
            };
            paint.set_color(color);
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Shape the run and draw each glyph as a vector path. The shear is
    /// applied around the origin like a canvas `setTransform(1, 0, k, 1, 0, 0)`
    /// and scoped to this call.
    fn render_text(
        &mut self,
        shaper: &mut TextShaper,
        run: &TextRun,
        stroke_width: Option<f32>,
        shear: f32,
        blend_mode: BlendMode,
    ) {
        let shaped = shaper.shape(&run.text, run.px);

        let x_offset = match run.align {
            HAlign::Left => 0.0,
            HAlign::Center => -shaped.width / 2.0,
            HAlign::Right => -shaped.width,
        };
        let base_x = run.x + x_offset;
        let base_y = run.y;

        let outer = Transform::from_row(1.0, 0.0, shear, 1.0, 0.0, 0.0);

        let mut paint = Paint {
            anti_alias: true,
            blend_mode,
            ..Default::default()
        };
        paint.set_color(run.color);

        for glyph in &shaped.glyphs {
            let transform =
                Transform::from_translate(base_x + glyph.x, base_y + glyph.y).post_concat(outer);
            match stroke_width {
                None => {
                    self.pixmap
                        .fill_path(&glyph.path, &paint, FillRule::Winding, transform, None);
                }
                Some(width) => {
                    let stroke = Stroke {
                        width,
                        ..Default::default()
                    };
                    self.pixmap
                        .stroke_path(&glyph.path, &paint, &stroke, transform, None);
                }
            }
        }
    }

    /// Export the canvas as PNG data (straight-alpha RGBA, 8-bit).
    pub fn to_png(&self) -> LogoResult<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;

            let mut data = Vec::with_capacity((self.width * self.height * 4) as usize);
            for pixel in self.pixmap.pixels() {
                let c = pixel.demultiply();
                data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
            writer.write_image_data(&data)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::parse_color;

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            LogoCanvas::new(0, 100),
            Err(LogoError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            LogoCanvas::new(100, 0),
            Err(LogoError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            LogoCanvas::new(MAX_DIMENSION + 1, 100),
            Err(LogoError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = LogoCanvas::new(40, 20).unwrap();
        assert_eq!(canvas.pixel(5, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn test_backdrop_fill_pixels() {
        let mut canvas = LogoCanvas::new(40, 20).unwrap();
        canvas.pixmap.fill(parse_color("#ff0000").unwrap());
        let c = canvas.pixel(10, 10).unwrap().demultiply();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn test_polygon_erase_punches_hole() {
        let mut canvas = LogoCanvas::new(40, 40).unwrap();
        canvas.pixmap.fill(parse_color("#00ff00").unwrap());
        canvas.fill_polygon(
            &[(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0)],
            NotchFill::Erase,
        );
        // Inside the polygon: fully erased
        assert_eq!(canvas.pixel(20, 20).unwrap().alpha(), 0);
        // Outside: untouched
        assert_eq!(canvas.pixel(5, 5).unwrap().alpha(), 255);
    }

    #[test]
    fn test_polygon_color_fill() {
        let mut canvas = LogoCanvas::new(40, 40).unwrap();
        canvas.fill_polygon(
            &[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0)],
            NotchFill::Color(parse_color("#0000ff").unwrap()),
        );
        let c = canvas.pixel(20, 20).unwrap().demultiply();
        assert_eq!((c.blue(), c.alpha()), (255, 255));
    }

    #[test]
    fn test_draw_pixmap_stretches_to_rect() {
        let mut canvas = LogoCanvas::new(40, 40).unwrap();
        let mut tile = Pixmap::new(2, 2).unwrap();
        tile.fill(parse_color("#ff00ff").unwrap());
        canvas.draw_pixmap_scaled(&tile, 10.0, 10.0, 20.0, 20.0);
        assert!(canvas.pixel(20, 20).unwrap().alpha() > 0);
        assert_eq!(canvas.pixel(5, 5).unwrap().alpha(), 0);
        assert_eq!(canvas.pixel(35, 35).unwrap().alpha(), 0);
    }

    #[test]
    fn test_to_png_dimensions() {
        let canvas = LogoCanvas::new(37, 19).unwrap();
        let bytes = canvas.to_png().unwrap();
        let decoder = png::Decoder::new(bytes.as_slice());
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 37);
        assert_eq!(reader.info().height, 19);
    }
}
