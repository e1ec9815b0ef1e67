//! arpx-pub - AR Experience Publisher
//!
//! Accepts a reference photo and an overlay video, runs the publishing
//! pipeline (transcode, target compile, QR, composite, materialize),
//! and serves the resulting self-contained AR sessions statically.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arpx_pub::config::{ConfigOverrides, PublishConfig};
use arpx_pub::AppState;

/// AR experience publisher
#[derive(Debug, Parser)]
#[command(name = "arpx-pub", version)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// HTTP listen port
    #[arg(long)]
    port: Option<u16>,

    /// Root directory for published sessions
    #[arg(long)]
    public_root: Option<std::path::PathBuf>,

    /// Externally reachable base URL for published sessions
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PublishConfig::resolve(&ConfigOverrides {
        config_path: cli.config,
        port: cli.port,
        public_root: cli.public_root,
        public_base_url: cli.base_url,
    })?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting arpx-pub (AR Experience Publisher)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}, {})",
        env!("BUILD_TIMESTAMP"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    // Tool absence is a configuration error, not a per-request error
    config
        .verify_tools()
        .map_err(|e| anyhow::anyhow!("external tool check failed: {}", e))?;
    info!(
        transcoder = %config.transcoder_bin,
        target_compiler = %config.target_compiler_bin,
        qr_encoder = %config.qr_encoder_bin,
        "External tools verified"
    );

    std::fs::create_dir_all(&config.public_root)?;
    info!("Public root: {}", config.public_root.display());
    info!("Public base URL: {}", config.public_base_url);

    let port = config.port;
    let state = AppState::new(config)?;
    let app = arpx_pub::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
