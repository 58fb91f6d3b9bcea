//! Tests for `mapgestr::config` - TOML parsing, engine-setting merging,
//! click-action inheritance, device filtering, and error handling.

use std::io::Write;
use tempfile::NamedTempFile;

use mapgestr::config::{AppConfig, parse_config_file, resolve_action};
use mapgestr::engine::PanningMode;
use mapgestr::listener::ClickKind;

// ── Helpers ──────────────────────────────────────────────────

/// Write TOML to a temp file and parse it.
fn load(toml_content: &str) -> AppConfig {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(toml_content.as_bytes()).unwrap();
    f.flush().unwrap();
    parse_config_file(f.path()).unwrap()
}

/// Parse raw TOML that is expected to fail.
fn load_err(toml_content: &str) -> String {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(toml_content.as_bytes()).unwrap();
    f.flush().unwrap();
    parse_config_file(f.path()).unwrap_err().to_string()
}

const ONE_DEVICE: &str = r#"
[device.panel]
device_usb_id = "1234:5678"
enabled = true
"#;

// ── Error handling ───────────────────────────────────────────

#[test]
fn test_file_not_found() {
    let msg = parse_config_file(std::path::Path::new("/no/such/file.toml"))
        .unwrap_err()
        .to_string();
    assert!(msg.contains("Failed to read config file"));
    assert!(msg.contains("/no/such/file.toml"));
}

#[test]
fn test_invalid_toml() {
    let msg = load_err("this is not valid toml [[[");
    assert!(msg.contains("Failed to parse config file"));
}

#[test]
fn test_invalid_panning_mode() {
    let msg = load_err(&format!(
        "{ONE_DEVICE}\n[device.panel.engine]\npanning_mode = \"stickyish\"\n"
    ));
    assert!(msg.contains("invalid panning_mode"));
    assert!(msg.contains("stickyish"));
    assert!(msg.contains("panel"));
}

// ── Empty / minimal configs ──────────────────────────────────

#[test]
fn test_empty_config() {
    let config = load("");
    assert!(config.devices.is_empty());
    assert_eq!(config.log_level, "info");
    assert_eq!(config.log_file, None);
}

#[test]
fn test_minimal_device_gets_defaults() {
    let config = load(ONE_DEVICE);
    let dev = &config.devices["panel"];

    assert_eq!(dev.device_usb_id, "1234:5678");
    let s = &dev.settings;
    assert_eq!(s.dpi, 160.0);
    assert_eq!(s.panning_mode, PanningMode::Free);
    assert!(s.pan && s.zoom && s.rotate && s.tilt);
    assert!(s.double_tap && s.double_tap_drag);
}

// ── Engine-setting merging ───────────────────────────────────

#[test]
fn test_global_engine_settings_inherited() {
    let config = load(&format!(
        r#"
[global.engine]
dpi = 200.0
rotate = false
panning_mode = "sticky"

{ONE_DEVICE}
"#
    ));
    let s = &config.devices["panel"].settings;

    assert_eq!(s.dpi, 200.0);
    assert!(!s.rotate);
    assert_eq!(s.panning_mode, PanningMode::Sticky);
    // Untouched fields stay at defaults.
    assert!(s.tilt);
}

#[test]
fn test_device_engine_settings_override_global() {
    let config = load(&format!(
        r#"
[global.engine]
dpi = 200.0
tilt = false

{ONE_DEVICE}

[device.panel.engine]
dpi = 220.0
panning_mode = "sticky_final"
"#
    ));
    let s = &config.devices["panel"].settings;

    assert_eq!(s.dpi, 220.0);
    assert_eq!(s.panning_mode, PanningMode::StickyFinal);
    // Global still applies where the device is silent.
    assert!(!s.tilt);
}

// ── Click-action merging ─────────────────────────────────────

#[test]
fn test_clicks_inherit_and_override() {
    let config = load(&format!(
        r#"
[global.clicks.single]
action = "xdotool click 1"
enabled = true

[global.clicks.double]
action = "global double"
enabled = true

{ONE_DEVICE}

[device.panel.clicks.double]
action = "device double"
"#
    ));
    let clicks = &config.devices["panel"].clicks;

    assert_eq!(
        resolve_action(ClickKind::Single, clicks),
        Some("xdotool click 1")
    );
    assert_eq!(resolve_action(ClickKind::Double, clicks), Some("device double"));
    assert_eq!(resolve_action(ClickKind::Long, clicks), None);
}

#[test]
fn test_disabled_click_resolves_to_nothing() {
    let config = load(&format!(
        r#"
[global.clicks.dual]
action = "notify-send dual"
enabled = false

{ONE_DEVICE}
"#
    ));
    let clicks = &config.devices["panel"].clicks;
    assert_eq!(resolve_action(ClickKind::Dual, clicks), None);
}

#[test]
fn test_click_without_action_resolves_to_nothing() {
    let config = load(&format!(
        r#"
[global.clicks.long]
enabled = true

{ONE_DEVICE}
"#
    ));
    let clicks = &config.devices["panel"].clicks;
    assert_eq!(resolve_action(ClickKind::Long, clicks), None);
}

// ── Device filtering ─────────────────────────────────────────

#[test]
fn test_disabled_device_is_skipped() {
    let config = load(
        r#"
[device.panel]
device_usb_id = "1234:5678"
enabled = false
"#,
    );
    assert!(config.devices.is_empty());
}

#[test]
fn test_device_without_usb_id_is_skipped() {
    let config = load(
        r#"
[device.panel]
enabled = true

[device.other]
device_usb_id = ""
enabled = true
"#,
    );
    assert!(config.devices.is_empty());
}

#[test]
fn test_multiple_devices() {
    let config = load(
        r#"
[device.kiosk]
device_usb_id = "1234:5678"
enabled = true

[device.wall]
device_usb_id = "abcd:ef01"
enabled = true

[device.wall.engine]
dpi = 300.0
"#,
    );
    assert_eq!(config.devices.len(), 2);
    assert_eq!(config.devices["kiosk"].settings.dpi, 160.0);
    assert_eq!(config.devices["wall"].settings.dpi, 300.0);
}

// ── Logging settings ─────────────────────────────────────────

#[test]
fn test_log_settings() {
    let config = load(
        r#"
[global]
log_level = "debug"
log_file = "/var/log/mapgestr.log"
"#,
    );
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.log_file.as_deref(), Some("/var/log/mapgestr.log"));
}
