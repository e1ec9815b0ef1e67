//! Configuration resolution tests
//!
//! Resolution reads process environment variables, so every test here
//! is serialized and starts from a clean ARPX_* slate.

use arpx_pub::config::{ConfigOverrides, PublishConfig, DEFAULT_TEMPLATE};
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

const ENV_VARS: &[&str] = &[
    "ARPX_CONFIG",
    "ARPX_PORT",
    "ARPX_PUBLIC_ROOT",
    "ARPX_PUBLIC_BASE_URL",
    "ARPX_TOOL_TIMEOUT_SECS",
    "ARPX_MAX_CONCURRENT_TOOLS",
    "ARPX_MAX_UPLOAD_MB",
    "ARPX_TRANSCODER_BIN",
    "ARPX_TARGET_COMPILER_BIN",
    "ARPX_QR_ENCODER_BIN",
    "ARPX_LOG",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

/// Overrides pointing the TOML tier at a path that does not exist, so
/// no developer-machine config leaks into the test
fn isolated_overrides(dir: &tempfile::TempDir) -> ConfigOverrides {
    ConfigOverrides {
        config_path: Some(dir.path().join("missing.toml")),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_is_configured() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let config = PublishConfig::resolve(&isolated_overrides(&dir)).unwrap();

    assert_eq!(config.port, 5740);
    assert_eq!(config.public_base_url, "http://127.0.0.1:5740/p");
    assert_eq!(config.max_concurrent_tools, 4);
    assert_eq!(config.tool_timeout, Duration::from_secs(120));
    assert_eq!(config.max_video_width, 1280);
    assert_eq!(config.max_video_bitrate_kbps, 2500);
    assert_eq!(config.qr_pixel_size, 8);
    assert_eq!(config.max_upload_bytes, 512 * 1024 * 1024);
    assert_eq!(config.transcoder_bin, "ffmpeg");
    assert_eq!(config.target_compiler_bin, "mindar-compiler");
    assert_eq!(config.qr_encoder_bin, "qrencode");
    assert_eq!(config.template, DEFAULT_TEMPLATE);
    assert_eq!(config.log_level, "info");
}

#[test]
#[serial]
fn test_toml_tier_overrides_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arpx-pub.toml");
    std::fs::write(
        &path,
        r#"
port = 8100
transcoder_bin = "/opt/media/bin/ffmpeg"
max_video_width = 960
qr_pixel_size = 12

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = PublishConfig::resolve(&ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.port, 8100);
    // The default base URL follows the resolved port
    assert_eq!(config.public_base_url, "http://127.0.0.1:8100/p");
    assert_eq!(config.transcoder_bin, "/opt/media/bin/ffmpeg");
    assert_eq!(config.max_video_width, 960);
    assert_eq!(config.qr_pixel_size, 12);
    assert_eq!(config.log_level, "debug");
}

#[test]
#[serial]
fn test_env_tier_overrides_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arpx-pub.toml");
    std::fs::write(&path, "port = 8100\n").unwrap();

    std::env::set_var("ARPX_PORT", "9000");
    std::env::set_var("ARPX_TRANSCODER_BIN", "avconv");
    let config = PublishConfig::resolve(&ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    })
    .unwrap();
    clear_env();

    assert_eq!(config.port, 9000);
    assert_eq!(config.transcoder_bin, "avconv");
}

#[test]
#[serial]
fn test_cli_tier_overrides_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    std::env::set_var("ARPX_PORT", "9000");
    std::env::set_var("ARPX_PUBLIC_BASE_URL", "http://env.example.com/p");
    let config = PublishConfig::resolve(&ConfigOverrides {
        config_path: Some(dir.path().join("missing.toml")),
        port: Some(7000),
        public_root: Some(PathBuf::from("/srv/arpx/public")),
        public_base_url: Some("https://cli.example.com/exp".to_string()),
    })
    .unwrap();
    clear_env();

    assert_eq!(config.port, 7000);
    assert_eq!(config.public_root, PathBuf::from("/srv/arpx/public"));
    assert_eq!(config.public_base_url, "https://cli.example.com/exp");
}

#[test]
#[serial]
fn test_unparseable_env_value_falls_through() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    std::env::set_var("ARPX_PORT", "not-a-port");
    let config = PublishConfig::resolve(&isolated_overrides(&dir)).unwrap();
    clear_env();

    assert_eq!(config.port, 5740);
}

#[test]
#[serial]
fn test_template_path_replaces_compiled_in_template() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("custom.html");
    std::fs::write(
        &template,
        "<html>{{PHOTO}} {{VIDEO}} {{TARGETS}}</html>",
    )
    .unwrap();
    let path = dir.path().join("arpx-pub.toml");
    std::fs::write(
        &path,
        format!("template_path = \"{}\"\n", template.display()),
    )
    .unwrap();

    let config = PublishConfig::resolve(&ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.template, "<html>{{PHOTO}} {{VIDEO}} {{TARGETS}}</html>");
}

#[test]
#[serial]
fn test_missing_template_path_is_a_config_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arpx-pub.toml");
    std::fs::write(&path, "template_path = \"/nonexistent/custom.html\"\n").unwrap();

    let err = PublishConfig::resolve(&ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    })
    .unwrap_err();

    assert!(err.to_string().contains("template"));
}
