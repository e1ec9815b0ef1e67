//! Tests for TOML configuration loading and write-back

use arpx_common::config::{load_toml_config, write_toml_config, LoggingConfig, TomlConfig};
use std::path::PathBuf;

#[test]
fn test_round_trip_preserves_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arpx-pub.toml");

    let config = TomlConfig {
        public_base_url: Some("http://ar.example.com/p".to_string()),
        public_root: Some(PathBuf::from("/srv/arpx/public")),
        port: Some(5740),
        max_concurrent_tools: Some(2),
        tool_timeout_secs: Some(90),
        max_video_width: Some(1280),
        max_video_bitrate_kbps: Some(2500),
        qr_pixel_size: Some(8),
        max_upload_mb: Some(256),
        transcoder_bin: Some("ffmpeg".to_string()),
        target_compiler_bin: Some("mindar-compiler".to_string()),
        qr_encoder_bin: Some("qrencode".to_string()),
        template_path: None,
        logging: LoggingConfig {
            level: Some("debug".to_string()),
        },
    };

    write_toml_config(&config, &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(loaded.public_base_url.as_deref(), Some("http://ar.example.com/p"));
    assert_eq!(loaded.port, Some(5740));
    assert_eq!(loaded.max_concurrent_tools, Some(2));
    assert_eq!(loaded.max_video_bitrate_kbps, Some(2500));
    assert_eq!(loaded.transcoder_bin.as_deref(), Some("ffmpeg"));
    assert_eq!(loaded.logging.level.as_deref(), Some("debug"));
}

#[test]
fn test_write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("arpx-pub.toml");

    write_toml_config(&TomlConfig::default(), &path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_write_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arpx-pub.toml");

    write_toml_config(&TomlConfig::default(), &path).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["arpx-pub.toml".to_string()]);
}

#[test]
fn test_partial_config_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "port = 8080\n\n[logging]\nlevel = \"trace\"\n").unwrap();

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded.port, Some(8080));
    assert_eq!(loaded.logging.level.as_deref(), Some("trace"));
    assert!(loaded.public_base_url.is_none());
}
