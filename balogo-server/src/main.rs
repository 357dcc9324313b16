use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use balogo_rs::{AssetConfig, Assets, RenderDefaults};
use balogo_server::{build_router, AppState};

/// balogo-server: HTTP server rendering the two-tone halo logo on demand
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[clap(long, env = "BALOGO_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[clap(long, env = "BALOGO_PORT", default_value_t = 3000)]
    port: u16,

    /// Font file to register at startup (fatal if unreadable)
    #[clap(long, env = "BALOGO_FONT_PATH")]
    font_path: Option<PathBuf>,

    /// Additional directory to scan for fonts
    #[clap(long, env = "BALOGO_FONT_DIR")]
    font_dir: Option<PathBuf>,

    /// Font family to select for the logo text
    #[clap(long, env = "BALOGO_FONT_FAMILY")]
    font_family: Option<String>,

    /// Skip loading system fonts
    #[clap(long)]
    no_system_fonts: bool,
}

#[tokio::main]
async fn main() {
    // fmt().init() also bridges `log` records from the rendering library
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = Args::parse();

    let defaults = match RenderDefaults::from_env() {
        Ok(defaults) => defaults,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let asset_config = AssetConfig {
        font_path: args.font_path,
        font_dirs: args.font_dir.into_iter().collect(),
        font_family: args.font_family,
        load_system_fonts: !args.no_system_fonts,
    };
    let assets = match Assets::load(&asset_config) {
        Ok(assets) => assets,
        Err(err) => {
            eprintln!("Failed to load render assets: {}", err);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        assets: Arc::new(assets),
        defaults,
    });
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on {}", addr);

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", err);
        std::process::exit(1);
    }
}
