use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use balogo_rs::{render, AssetConfig, Assets, ParamMap, RenderDefaults, RenderParams};

/// balogo: render the two-tone halo logo to a PNG file
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path of the PNG file to write
    #[clap(short, long, default_value = "logo.png")]
    output: PathBuf,

    /// Left text
    #[clap(long)]
    text_l: Option<String>,

    /// Right text
    #[clap(long)]
    text_r: Option<String>,

    /// Subtitle under the right text
    #[clap(long)]
    subtitle: Option<String>,

    /// Resolution multiplier
    #[clap(long)]
    scale: Option<f32>,

    /// Render on a transparent background
    #[clap(long)]
    transparent: bool,

    /// Background image file
    #[clap(long)]
    bg_image: Option<PathBuf>,

    /// Any other recognized field, as key=value (e.g. --param bgColor=#333)
    #[clap(long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Font file to register (fatal if unreadable)
    #[clap(long, env = "BALOGO_FONT_PATH")]
    font_path: Option<PathBuf>,

    /// Font family to select for the logo text
    #[clap(long, env = "BALOGO_FONT_FAMILY")]
    font_family: Option<String>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Args = Args::parse();

    let mut query = ParamMap::new();
    for (key, value) in &args.params {
        query.insert(key.clone(), value.clone());
    }
    if let Some(text_l) = &args.text_l {
        query.insert("textL".to_string(), text_l.clone());
    }
    if let Some(text_r) = &args.text_r {
        query.insert("textR".to_string(), text_r.clone());
    }
    if let Some(subtitle) = &args.subtitle {
        query.insert("subtitle".to_string(), subtitle.clone());
    }
    if let Some(scale) = args.scale {
        query.insert("scale".to_string(), scale.to_string());
    }
    if args.transparent {
        query.insert("transparent".to_string(), "true".to_string());
    }

    let bg_image = match &args.bg_image {
        Some(path) => Some(Arc::new(
            std::fs::read(path)
                .with_context(|| format!("failed to read background image {}", path.display()))?,
        )),
        None => None,
    };

    let defaults = RenderDefaults::from_env().context("invalid configuration")?;
    let params = RenderParams::resolve(&defaults, &query, &ParamMap::new(), bg_image)?;

    let asset_config = AssetConfig {
        font_path: args.font_path,
        font_family: args.font_family,
        ..AssetConfig::from_env()
    };
    let assets = Assets::load(&asset_config).context("failed to load render assets")?;

    let png = render(&params, &assets)?;
    std::fs::write(&args.output, &png)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    log::info!("wrote {} ({} bytes)", args.output.display(), png.len());
    Ok(())
}
