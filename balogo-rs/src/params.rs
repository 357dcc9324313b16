//! Typed parameter resolution: request values merged with configured
//! defaults into one immutable [`RenderParams`].
//!
//! For each recognized key, value = query override ?? body override ??
//! configured default. Numeric-looking strings are coerced to numbers (with
//! silent fallback to the default on a parse failure), `"true"` coerces a
//! flag to true, and the three enumerated fields (`type`, `subtitleAlign`,
//! `encode`) are validated strictly. This is also the single place the
//! `scale` factor is applied: every spatial field leaves here pre-multiplied
//! and is never re-scaled downstream.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::encode::TextEncoding;
use crate::error::{LogoError, LogoResult};

/// Raw string key/value pairs from a query string or request body.
pub type ParamMap = HashMap<String, String>;

/// Response payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    /// Raw PNG bytes with an image/png content type.
    #[default]
    Image,
    /// JSON envelope wrapping the text-encoded PNG bytes.
    Json,
}

impl FromStr for OutputType {
    type Err = LogoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(OutputType::Image),
            "json" => Ok(OutputType::Json),
            _ => Err(LogoError::InvalidParam {
                field: "type",
                value: s.to_string(),
            }),
        }
    }
}

/// Subtitle alignment, canvas-style (start/end are the LTR aliases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleAlign {
    #[default]
    Center,
    End,
    Left,
    Right,
    Start,
}

impl FromStr for SubtitleAlign {
    type Err = LogoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(SubtitleAlign::Center),
            "end" => Ok(SubtitleAlign::End),
            "left" => Ok(SubtitleAlign::Left),
            "right" => Ok(SubtitleAlign::Right),
            "start" => Ok(SubtitleAlign::Start),
            _ => Err(LogoError::InvalidParam {
                field: "subtitleAlign",
                value: s.to_string(),
            }),
        }
    }
}

/// Process-wide defaults for every recognized field, before scaling.
///
/// Built-in values match the public interface documentation; any of them can
/// be overridden through `BALOGO_*` environment variables via [`Self::from_env`].
#[derive(Debug, Clone)]
pub struct RenderDefaults {
    pub output: OutputType,
    pub encoding: TextEncoding,
    pub canvas_height: f32,
    pub canvas_width: f32,
    pub scale: f32,
    pub padding_x: f32,
    pub text_l: String,
    pub text_r: String,
    pub font_size: f32,
    pub text_baseline: f32,
    pub horizontal_tilt: f32,
    pub subtitle: String,
    pub subtitle_color: String,
    pub subtitle_align: SubtitleAlign,
    pub subtitle_font_size: f32,
    pub transparent: bool,
    pub bg_color: String,
    pub text_l_color: String,
    pub text_r_color: String,
    pub graph_x: f32,
    pub graph_y: f32,
    pub bg_image_x: f32,
    pub bg_image_y: f32,
    pub bg_image_w: f32,
    pub bg_image_h: f32,
    pub hide_halo: bool,
    pub hide_cross: bool,
    pub halo_color: String,
    pub cross_color: String,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            output: OutputType::Image,
            encoding: TextEncoding::Base64Url,
            canvas_height: 250.0,
            canvas_width: 900.0,
            scale: 1.0,
            padding_x: 10.0,
            text_l: "Blue".to_string(),
            text_r: "Archive".to_string(),
            font_size: 84.0,
            text_baseline: 0.68,
            horizontal_tilt: -0.4,
            subtitle: String::new(),
            subtitle_color: "#128AFA".to_string(),
            subtitle_align: SubtitleAlign::Center,
            subtitle_font_size: 36.0,
            transparent: false,
            bg_color: "#ffffff".to_string(),
            text_l_color: "#128AFA".to_string(),
            text_r_color: "#2B2B2B".to_string(),
            graph_x: -15.0,
            graph_y: 0.0,
            bg_image_x: 0.0,
            bg_image_y: 0.0,
            bg_image_w: 0.0,
            bg_image_h: 0.0,
            hide_halo: false,
            hide_cross: false,
            halo_color: "#2B2B2B".to_string(),
            cross_color: "#128AFA".to_string(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_num(name: &str, slot: &mut f32) {
    if let Some(v) = env_var(name) {
        if let Ok(n) = v.parse::<f32>() {
            *slot = n;
        }
    }
}

fn env_flag(name: &str, slot: &mut bool) {
    if let Some(v) = env_var(name) {
        *slot = v == "true";
    }
}

fn env_text(name: &str, slot: &mut String) {
    if let Some(v) = env_var(name) {
        *slot = v;
    }
}

impl RenderDefaults {
    /// Build defaults from the environment, on top of the built-in values.
    ///
    /// Environment values go through the same coercion rules as request
    /// values. An invalid enum value in the environment is a hard error so
    /// a misconfigured process refuses to start instead of serving 409s for
    /// every request.
    pub fn from_env() -> LogoResult<Self> {
        let mut d = Self::default();

        if let Some(v) = env_var("BALOGO_TYPE") {
            d.output = v.parse()?;
        }
        if let Some(v) = env_var("BALOGO_ENCODE") {
            d.encoding = v.parse()?;
        }
        if let Some(v) = env_var("BALOGO_SUBTITLE_ALIGN") {
            d.subtitle_align = v.parse()?;
        }

        env_num("BALOGO_CANVAS_HEIGHT", &mut d.canvas_height);
        env_num("BALOGO_CANVAS_WIDTH", &mut d.canvas_width);
        env_num("BALOGO_SCALE", &mut d.scale);
        env_num("BALOGO_PADDING_X", &mut d.padding_x);
        env_num("BALOGO_FONT_SIZE", &mut d.font_size);
        env_num("BALOGO_TEXT_BASELINE", &mut d.text_baseline);
        env_num("BALOGO_HORIZONTAL_TILT", &mut d.horizontal_tilt);
        env_num("BALOGO_SUBTITLE_FONT_SIZE", &mut d.subtitle_font_size);
        env_num("BALOGO_GRAPH_X", &mut d.graph_x);
        env_num("BALOGO_GRAPH_Y", &mut d.graph_y);
        env_num("BALOGO_BG_IMAGE_X", &mut d.bg_image_x);
        env_num("BALOGO_BG_IMAGE_Y", &mut d.bg_image_y);
        env_num("BALOGO_BG_IMAGE_W", &mut d.bg_image_w);
        env_num("BALOGO_BG_IMAGE_H", &mut d.bg_image_h);

        env_flag("BALOGO_TRANSPARENT", &mut d.transparent);
        env_flag("BALOGO_HIDE_HALO", &mut d.hide_halo);
        env_flag("BALOGO_HIDE_CROSS", &mut d.hide_cross);

        env_text("BALOGO_TEXT_L", &mut d.text_l);
        env_text("BALOGO_TEXT_R", &mut d.text_r);
        env_text("BALOGO_SUBTITLE", &mut d.subtitle);
        env_text("BALOGO_SUBTITLE_COLOR", &mut d.subtitle_color);
        env_text("BALOGO_BG_COLOR", &mut d.bg_color);
        env_text("BALOGO_TEXT_L_COLOR", &mut d.text_l_color);
        env_text("BALOGO_TEXT_R_COLOR", &mut d.text_r_color);
        env_text("BALOGO_HALO_COLOR", &mut d.halo_color);
        env_text("BALOGO_CROSS_COLOR", &mut d.cross_color);

        Ok(d)
    }
}

/// Fully resolved, immutable per-request parameters.
///
/// Every spatial field is already multiplied by `scale`; colors stay CSS
/// strings and are parsed during layer planning.
#[derive(Debug, Clone)]
pub struct RenderParams {
    pub output: OutputType,
    pub encoding: TextEncoding,
    pub canvas_height: f32,
    pub canvas_width: f32,
    pub scale: f32,
    pub padding_x: f32,
    pub text_l: String,
    pub text_r: String,
    pub font_size: f32,
    pub text_baseline: f32,
    pub horizontal_tilt: f32,
    pub subtitle: String,
    pub subtitle_color: String,
    pub subtitle_align: SubtitleAlign,
    pub subtitle_font_size: f32,
    pub transparent: bool,
    pub bg_color: String,
    pub text_l_color: String,
    pub text_r_color: String,
    pub graph_x: f32,
    pub graph_y: f32,
    pub bg_image: Option<Arc<Vec<u8>>>,
    pub bg_image_x: f32,
    pub bg_image_y: f32,
    pub bg_image_w: f32,
    pub bg_image_h: f32,
    pub hide_halo: bool,
    pub hide_cross: bool,
    pub halo_color: String,
    pub cross_color: String,
}

fn lookup<'a>(key: &str, query: &'a ParamMap, body: &'a ParamMap) -> Option<&'a str> {
    query
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .or_else(|| body.get(key).map(String::as_str).filter(|v| !v.is_empty()))
}

fn num(key: &str, query: &ParamMap, body: &ParamMap, default: f32) -> f32 {
    lookup(key, query, body)
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn flag(key: &str, query: &ParamMap, body: &ParamMap, default: bool) -> bool {
    lookup(key, query, body)
        .map(|v| v == "true")
        .unwrap_or(default)
}

fn text(key: &str, query: &ParamMap, body: &ParamMap, default: &str) -> String {
    lookup(key, query, body)
        .map(str::to_owned)
        .unwrap_or_else(|| default.to_owned())
}

impl RenderParams {
    /// Merge request values over the configured defaults and validate.
    ///
    /// The uploaded background image, if any, is passed through untouched;
    /// decoding happens during layer planning so a bad upload is a render
    /// error, not a validation error.
    pub fn resolve(
        defaults: &RenderDefaults,
        query: &ParamMap,
        body: &ParamMap,
        bg_image: Option<Arc<Vec<u8>>>,
    ) -> LogoResult<Self> {
        let output = match lookup("type", query, body) {
            Some(v) => v.parse::<OutputType>()?,
            None => defaults.output,
        };
        let encoding = match lookup("encode", query, body) {
            Some(v) => v.parse::<TextEncoding>()?,
            None => defaults.encoding,
        };
        let subtitle_align = match lookup("subtitleAlign", query, body) {
            Some(v) => v.parse::<SubtitleAlign>()?,
            None => defaults.subtitle_align,
        };

        let scale = num("scale", query, body, defaults.scale);
        // A non-positive multiplier cannot produce a canvas; collapse to 1
        let scale = if scale > 0.0 { scale } else { 1.0 };

        Ok(Self {
            output,
            encoding,
            subtitle_align,
            canvas_height: num("canvasHeight", query, body, defaults.canvas_height) * scale,
            canvas_width: num("canvasWidth", query, body, defaults.canvas_width) * scale,
            scale,
            padding_x: num("paddingX", query, body, defaults.padding_x) * scale,
            text_l: text("textL", query, body, &defaults.text_l),
            text_r: text("textR", query, body, &defaults.text_r),
            font_size: num("fontSize", query, body, defaults.font_size) * scale,
            text_baseline: num("textBaseLine", query, body, defaults.text_baseline),
            horizontal_tilt: num("horizontalTilt", query, body, defaults.horizontal_tilt),
            subtitle: text("subtitle", query, body, &defaults.subtitle),
            subtitle_color: text("subtitleColor", query, body, &defaults.subtitle_color),
            subtitle_font_size: num("subtitleFontSize", query, body, defaults.subtitle_font_size)
                * scale,
            transparent: flag("transparent", query, body, defaults.transparent),
            bg_color: text("bgColor", query, body, &defaults.bg_color),
            text_l_color: text("textLColor", query, body, &defaults.text_l_color),
            text_r_color: text("textRColor", query, body, &defaults.text_r_color),
            graph_x: num("graphX", query, body, defaults.graph_x) * scale,
            graph_y: num("graphY", query, body, defaults.graph_y) * scale,
            bg_image,
            bg_image_x: num("bgImageX", query, body, defaults.bg_image_x) * scale,
            bg_image_y: num("bgImageY", query, body, defaults.bg_image_y) * scale,
            bg_image_w: num("bgImageW", query, body, defaults.bg_image_w) * scale,
            bg_image_h: num("bgImageH", query, body, defaults.bg_image_h) * scale,
            hide_halo: flag("hideHalo", query, body, defaults.hide_halo),
            hide_cross: flag("hideCross", query, body, defaults.hide_cross),
            halo_color: text("haloColor", query, body, &defaults.halo_color),
            cross_color: text("crossColor", query, body, &defaults.cross_color),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_pass_through() {
        let d = RenderDefaults::default();
        let p = RenderParams::resolve(&d, &ParamMap::new(), &ParamMap::new(), None).unwrap();
        assert_eq!(p.output, OutputType::Image);
        assert_eq!(p.encoding, TextEncoding::Base64Url);
        assert_eq!(p.text_l, "Blue");
        assert_eq!(p.text_r, "Archive");
        assert_eq!(p.canvas_height, 250.0);
        assert_eq!(p.font_size, 84.0);
        assert_eq!(p.graph_x, -15.0);
        assert!(!p.transparent);
    }

    #[test]
    fn test_query_wins_over_body() {
        let d = RenderDefaults::default();
        let q = map(&[("textL", "Red")]);
        let b = map(&[("textL", "Green"), ("textR", "Velvet")]);
        let p = RenderParams::resolve(&d, &q, &b, None).unwrap();
        assert_eq!(p.text_l, "Red");
        assert_eq!(p.text_r, "Velvet");
    }

    #[test]
    fn test_empty_value_falls_through() {
        let d = RenderDefaults::default();
        let q = map(&[("textL", "")]);
        let p = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap();
        assert_eq!(p.text_l, "Blue");
    }

    #[test]
    fn test_scale_applied_to_spatial_fields_once() {
        let d = RenderDefaults::default();
        let q = map(&[("scale", "2"), ("graphX", "-15"), ("fontSize", "84")]);
        let p = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap();
        assert_eq!(p.scale, 2.0);
        assert_eq!(p.canvas_height, 500.0);
        assert_eq!(p.canvas_width, 1800.0);
        assert_eq!(p.padding_x, 20.0);
        assert_eq!(p.font_size, 168.0);
        assert_eq!(p.subtitle_font_size, 72.0);
        assert_eq!(p.graph_x, -30.0);
        // Ratios and the shear factor are not spatial
        assert_eq!(p.text_baseline, 0.68);
        assert_eq!(p.horizontal_tilt, -0.4);
    }

    #[test]
    fn test_numeric_coercion_falls_back_on_garbage() {
        let d = RenderDefaults::default();
        let q = map(&[("fontSize", "huge"), ("canvasHeight", "300")]);
        let p = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap();
        assert_eq!(p.font_size, 84.0);
        assert_eq!(p.canvas_height, 300.0);
    }

    #[test]
    fn test_flag_coercion() {
        let d = RenderDefaults::default();
        let q = map(&[("transparent", "true"), ("hideHalo", "yes")]);
        let p = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap();
        assert!(p.transparent);
        // Anything but the literal "true" is false when provided
        assert!(!p.hide_halo);
    }

    #[test]
    fn test_invalid_type_rejected() {
        let d = RenderDefaults::default();
        let q = map(&[("type", "xml")]);
        let err = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap_err();
        assert!(matches!(
            err,
            LogoError::InvalidParam { field: "type", .. }
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_invalid_subtitle_align_rejected() {
        let d = RenderDefaults::default();
        let q = map(&[("subtitleAlign", "diagonal")]);
        let err = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap_err();
        assert!(matches!(
            err,
            LogoError::InvalidParam {
                field: "subtitleAlign",
                ..
            }
        ));
    }

    #[test]
    fn test_valid_enum_values_accepted() {
        let d = RenderDefaults::default();
        for align in ["center", "end", "left", "right", "start"] {
            let q = map(&[("subtitleAlign", align)]);
            assert!(RenderParams::resolve(&d, &q, &ParamMap::new(), None).is_ok());
        }
        let q = map(&[("type", "json"), ("encode", "hex")]);
        let p = RenderParams::resolve(&d, &q, &ParamMap::new(), None).unwrap();
        assert_eq!(p.output, OutputType::Json);
        assert_eq!(p.encoding, TextEncoding::Hex);
    }
}
