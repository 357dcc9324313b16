//! Process-wide render assets: the font database and the two vector glyph
//! templates.
//!
//! Loaded once at startup and shared read-only across requests. The glyph
//! templates are kept as SVG markup (not rasterized) so their fill color can
//! be substituted per request before handing them to `resvg`.

use std::collections::HashSet;
use std::path::PathBuf;

use tiny_skia::Pixmap;

use crate::error::{LogoError, LogoResult};

/// Halo ring, 500x500 reference frame. Single un-filled `<path>` so the
/// recolor substitution applies cleanly.
const HALO_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 500 500"><path fill-rule="evenodd" d="M250 57A193 193 0 1 0 250 443A193 193 0 1 0 250 57ZM250 93A157 157 0 1 1 250 407A157 157 0 1 1 250 93Z"/></svg>"##;

/// Slanted cross, 500x500 reference frame. The long bar runs along the same
/// diagonal as the hollow notch polygon so the notch reads as the bar
/// passing through the ring.
const CROSS_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 500 500"><path d="M300 60L340 78L180 440L140 422ZM160 141L360 233L344 269L144 177Z"/></svg>"##;

/// Families tried in order when no font file or family is configured.
const PREFERRED_FAMILIES: &[&str] = &[
    "GlowSansSC-Normal-Heavy",
    "Glow Sans SC",
    "Source Han Sans SC",
    "Noto Sans CJK SC",
];

/// Which glyph template to rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Halo,
    Cross,
}

/// Font configuration for [`Assets::load`].
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Font file to register. Failure to read or parse it is fatal.
    pub font_path: Option<PathBuf>,
    /// Additional directories to scan for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Family name to select. Fatal if not present after loading.
    pub font_family: Option<String>,
    /// Whether to load system fonts (default: true).
    pub load_system_fonts: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_dirs: Vec::new(),
            font_family: None,
            load_system_fonts: true,
        }
    }
}

impl AssetConfig {
    /// Read the font configuration from `BALOGO_FONT_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("BALOGO_FONT_PATH") {
            if !path.is_empty() {
                config.font_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("BALOGO_FONT_DIR") {
            if !dir.is_empty() {
                config.font_dirs.push(PathBuf::from(dir));
            }
        }
        if let Ok(family) = std::env::var("BALOGO_FONT_FAMILY") {
            if !family.is_empty() {
                config.font_family = Some(family);
            }
        }
        config
    }
}

/// One-time loaded, read-only render assets.
pub struct Assets {
    fontdb: fontdb::Database,
    family: Option<String>,
    halo: String,
    cross: String,
}

impl Assets {
    /// Build the font database and validate the glyph templates.
    ///
    /// Errors here are startup-fatal by contract; there is no request-time
    /// remediation for a missing font file or a broken template.
    pub fn load(config: &AssetConfig) -> LogoResult<Self> {
        let mut db = fontdb::Database::new();

        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            db.load_fonts_dir(dir);
        }

        let mut file_family = None;
        if let Some(path) = &config.font_path {
            let data = std::fs::read(path).map_err(|err| {
                LogoError::Font(format!("failed to read font file {}: {}", path.display(), err))
            })?;
            let before = db.faces().count();
            db.load_font_data(data);
            file_family = db
                .faces()
                .nth(before)
                .and_then(|face| face.families.first().map(|(name, _lang)| name.clone()));
            if file_family.is_none() {
                return Err(LogoError::Font(format!(
                    "no usable face in font file {}",
                    path.display()
                )));
            }
        }

        let available: HashSet<String> = db
            .faces()
            .flat_map(|face| {
                face.families
                    .iter()
                    .map(|(name, _lang)| name.clone())
                    .collect::<Vec<_>>()
            })
            .collect();

        let family = if let Some(name) = &config.font_family {
            if !available.contains(name) {
                return Err(LogoError::Font(format!(
                    "configured font family not found: {}",
                    name
                )));
            }
            Some(name.clone())
        } else if file_family.is_some() {
            file_family
        } else {
            // Fall back through the preference list to generic sans-serif
            PREFERRED_FAMILIES
                .iter()
                .find(|name| available.contains(**name))
                .map(|name| name.to_string())
        };

        log::info!(
            "assets loaded: {} font faces, display family {:?}",
            db.faces().count(),
            family
        );

        // Parse-validate the templates once so a broken one fails the
        // process at startup instead of failing every render.
        for (name, template) in [("halo", HALO_TEMPLATE), ("cross", CROSS_TEMPLATE)] {
            usvg::Tree::from_str(template, &usvg::Options::default())
                .map_err(|err| LogoError::Glyph(format!("{}: {}", name, err)))?;
        }

        Ok(Self {
            fontdb: db,
            family,
            halo: HALO_TEMPLATE.to_string(),
            cross: CROSS_TEMPLATE.to_string(),
        })
    }

    pub fn fontdb(&self) -> &fontdb::Database {
        &self.fontdb
    }

    /// Resolved display family, if any; `None` falls back to sans-serif.
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    /// Recolor a glyph template and rasterize it into a square pixmap.
    ///
    /// The color is parsed (and normalized to hex) before substitution so an
    /// arbitrary request string cannot break the markup.
    pub fn glyph_pixmap(&self, kind: GlyphKind, color: &str, size: f32) -> LogoResult<Pixmap> {
        let parsed = csscolorparser::parse(color)
            .map_err(|err| LogoError::ColorParse(format!("{}: {}", color, err)))?;
        let [r, g, b, a] = parsed.to_array();
        let fill = format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            (a * 255.0).round() as u8
        );

        let template = match kind {
            GlyphKind::Halo => &self.halo,
            GlyphKind::Cross => &self.cross,
        };
        let svg = template.replacen("<path ", &format!("<path fill=\"{}\" ", fill), 1);

        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|err| LogoError::Glyph(err.to_string()))?;

        let px = size.ceil().max(1.0) as u32;
        let mut pixmap = Pixmap::new(px, px).ok_or(LogoError::InvalidDimensions {
            width: px,
            height: px,
        })?;

        let sx = size / tree.size().width();
        let sy = size / tree.size().height();
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        Ok(pixmap)
    }
}
