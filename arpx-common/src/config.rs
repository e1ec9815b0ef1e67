//! Configuration loading for ARPX services
//!
//! **[APX-CFG-010]** Configuration is resolved once at startup and
//! immutable afterwards. Resolution priority for every value:
//! 1. Command-line argument (highest priority)
//! 2. `ARPX_*` environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns the TOML layer; services resolve their own runtime
//! configuration structs on top of it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// TOML configuration file contents
///
/// All fields are optional; missing values fall through to environment
/// variables and compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Externally reachable base URL for published sessions
    pub public_base_url: Option<String>,
    /// Root directory holding one subdirectory per published session
    pub public_root: Option<PathBuf>,
    /// HTTP listen port
    pub port: Option<u16>,
    /// Upper bound on concurrently running external tools
    pub max_concurrent_tools: Option<usize>,
    /// Wall-clock timeout per external tool invocation (seconds)
    pub tool_timeout_secs: Option<u64>,
    /// Transcode envelope: maximum output video width (pixels)
    pub max_video_width: Option<u32>,
    /// Transcode envelope: maximum output video bitrate (kbit/s)
    pub max_video_bitrate_kbps: Option<u32>,
    /// QR module pixel size passed to the encoder
    pub qr_pixel_size: Option<u32>,
    /// Upload body size ceiling (megabytes)
    pub max_upload_mb: Option<u64>,
    /// Video transcoder binary
    pub transcoder_bin: Option<String>,
    /// Image-target compiler binary
    pub target_compiler_bin: Option<String>,
    /// QR encoder binary
    pub qr_encoder_bin: Option<String>,
    /// Entry-page template override (empty/missing uses the compiled-in template)
    pub template_path: Option<PathBuf>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter level (e.g. "info", "debug")
    pub level: Option<String>,
}

/// Default configuration file path for the platform
///
/// Linux: `~/.config/arpx/arpx-pub.toml`, with `/etc/arpx/arpx-pub.toml`
/// as the system-wide fallback.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("arpx").join("arpx-pub.toml"));
    if let Some(path) = &user_config {
        if path.exists() {
            return user_config;
        }
    }
    let system_config = PathBuf::from("/etc/arpx/arpx-pub.toml");
    if system_config.exists() {
        return Some(system_config);
    }
    user_config
}

/// OS-dependent default root folder for published sessions
pub fn default_public_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("arpx").join("public"))
        .unwrap_or_else(|| PathBuf::from("./arpx_public"))
}

/// Load TOML configuration from a file
///
/// A missing file is not an error; it yields the empty config so the
/// ENV/default tiers take over.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("No configuration file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config =
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_toml_config(Path::new("/nonexistent/arpx-pub.toml")).unwrap();
        assert!(config.public_base_url.is_none());
        assert!(config.port.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = [not toml").unwrap();
        assert!(load_toml_config(&path).is_err());
    }
}
