//! Configuration resolution for arpx-pub
//!
//! **[APX-CFG-020]** Resolves the immutable runtime configuration once
//! at startup with CLI → ENV → TOML → default priority, then verifies
//! the external tools are present. There is no process-wide mutable
//! configuration: the resolved struct is passed into the orchestrator
//! at construction.

use arpx_common::config::{default_public_root, load_toml_config, TomlConfig};
use arpx_common::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Compiled-in entry-page template
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/experience.html");

const DEFAULT_PORT: u16 = 5740;
const DEFAULT_MAX_CONCURRENT_TOOLS: usize = 4;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_VIDEO_WIDTH: u32 = 1280;
const DEFAULT_MAX_VIDEO_BITRATE_KBPS: u32 = 2500;
const DEFAULT_QR_PIXEL_SIZE: u32 = 8;
const DEFAULT_MAX_UPLOAD_MB: u64 = 512;

/// Startup overrides from the command line (highest priority tier)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub public_root: Option<PathBuf>,
    pub public_base_url: Option<String>,
}

/// Immutable runtime configuration
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Externally reachable base URL for published sessions
    pub public_base_url: String,
    /// Root directory holding one subdirectory per session
    pub public_root: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// Bound on concurrently running external tools (process-wide)
    pub max_concurrent_tools: usize,
    /// Wall-clock timeout per tool invocation
    pub tool_timeout: Duration,
    /// Transcode envelope
    pub max_video_width: u32,
    pub max_video_bitrate_kbps: u32,
    /// QR module pixel size
    pub qr_pixel_size: u32,
    /// Upload body ceiling in bytes
    pub max_upload_bytes: usize,
    /// External tool binaries
    pub transcoder_bin: String,
    pub target_compiler_bin: String,
    pub qr_encoder_bin: String,
    /// Resolved entry-page template text
    pub template: String,
    /// Log filter when RUST_LOG is unset
    pub log_level: String,
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", name, raw);
            None
        }
    }
}

impl PublishConfig {
    /// Resolve configuration with CLI → ENV → TOML → default priority
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_path = overrides
            .config_path
            .clone()
            .or_else(|| env_parsed::<PathBuf>("ARPX_CONFIG"))
            .or_else(arpx_common::config::default_config_path);
        let toml: TomlConfig = match &toml_path {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };

        let port = overrides
            .port
            .or_else(|| env_parsed("ARPX_PORT"))
            .or(toml.port)
            .unwrap_or(DEFAULT_PORT);

        let public_root = overrides
            .public_root
            .clone()
            .or_else(|| env_parsed("ARPX_PUBLIC_ROOT"))
            .or(toml.public_root)
            .unwrap_or_else(default_public_root);

        let public_base_url = overrides
            .public_base_url
            .clone()
            .or_else(|| std::env::var("ARPX_PUBLIC_BASE_URL").ok())
            .or(toml.public_base_url)
            .unwrap_or_else(|| format!("http://127.0.0.1:{}/p", port));

        let tool_timeout_secs = env_parsed("ARPX_TOOL_TIMEOUT_SECS")
            .or(toml.tool_timeout_secs)
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS);

        let template = match toml.template_path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => std::fs::read_to_string(path)
                .map_err(|e| {
                    Error::Config(format!(
                        "failed to read template {}: {}",
                        path.display(),
                        e
                    ))
                })?,
            _ => DEFAULT_TEMPLATE.to_string(),
        };

        let max_upload_mb = env_parsed("ARPX_MAX_UPLOAD_MB")
            .or(toml.max_upload_mb)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        Ok(Self {
            public_base_url,
            public_root,
            port,
            max_concurrent_tools: env_parsed("ARPX_MAX_CONCURRENT_TOOLS")
                .or(toml.max_concurrent_tools)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_TOOLS),
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            max_video_width: toml.max_video_width.unwrap_or(DEFAULT_MAX_VIDEO_WIDTH),
            max_video_bitrate_kbps: toml
                .max_video_bitrate_kbps
                .unwrap_or(DEFAULT_MAX_VIDEO_BITRATE_KBPS),
            qr_pixel_size: toml.qr_pixel_size.unwrap_or(DEFAULT_QR_PIXEL_SIZE),
            max_upload_bytes: (max_upload_mb as usize) * 1024 * 1024,
            transcoder_bin: std::env::var("ARPX_TRANSCODER_BIN")
                .ok()
                .or(toml.transcoder_bin)
                .unwrap_or_else(|| "ffmpeg".to_string()),
            target_compiler_bin: std::env::var("ARPX_TARGET_COMPILER_BIN")
                .ok()
                .or(toml.target_compiler_bin)
                .unwrap_or_else(|| "mindar-compiler".to_string()),
            qr_encoder_bin: std::env::var("ARPX_QR_ENCODER_BIN")
                .ok()
                .or(toml.qr_encoder_bin)
                .unwrap_or_else(|| "qrencode".to_string()),
            template,
            log_level: std::env::var("ARPX_LOG")
                .ok()
                .or(toml.logging.level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Verify the configured external tools can be launched
    ///
    /// Tool absence is a configuration error at startup, never a
    /// per-request error.
    pub fn verify_tools(&self) -> Result<()> {
        let probes = [
            (self.transcoder_bin.as_str(), "-version"),
            (self.target_compiler_bin.as_str(), "--version"),
            (self.qr_encoder_bin.as_str(), "--version"),
        ];
        for (bin, probe) in probes {
            if let Err(e) = std::process::Command::new(bin)
                .arg(probe)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
            {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(Error::Config(format!("{} not found in PATH", bin)));
                }
                return Err(Error::Config(format!("failed to probe {}: {}", bin, e)));
            }
        }
        Ok(())
    }
}
