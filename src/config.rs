//! Configuration data structures and TOML parsing.
//!
//! The config file uses TOML format. Example:
//!
//! ```toml
//! [global]
//! log_level = "info"
//!
//! [global.engine]
//! dpi = 160.0
//! panning_mode = "free"
//! pan = true
//! zoom = true
//! rotate = true
//! tilt = true
//! double_tap = true
//! double_tap_drag = true
//!
//! [global.clicks.single]
//! action = "xdotool click 1"
//! enabled = true
//!
//! [device.kiosk]
//! device_usb_id = "1234:5678"
//! enabled = true
//!
//! [device.kiosk.engine]
//! dpi = 220.0
//! panning_mode = "sticky"
//!
//! [device.kiosk.clicks.double]
//! action = "notify-send 'zoom in'"
//! enabled = true
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::engine::{EngineSettings, PanningMode};
use crate::listener::ClickKind;

/// Top-level error type used throughout the crate.
#[derive(Debug, Error)]
pub enum MapgestrError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error("Config validation error for device '{device}': invalid panning_mode '{value}'")]
    InvalidPanningMode { device: String, value: String },
}

/// Root of the TOML config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    global: RawGlobal,
    #[serde(default)]
    device: HashMap<String, RawDevice>,
}

/// The `[global]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawGlobal {
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default)]
    engine: RawEngine,
    #[serde(default)]
    clicks: HashMap<String, RawClickConfig>,
}

/// Engine settings - all optional so device sections can partially
/// override.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct RawEngine {
    dpi: Option<f32>,
    panning_mode: Option<String>,
    pan: Option<bool>,
    zoom: Option<bool>,
    rotate: Option<bool>,
    tilt: Option<bool>,
    double_tap: Option<bool>,
    double_tap_drag: Option<bool>,
}

/// A click entry (action + enabled).
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
struct RawClickConfig {
    action: Option<String>,
    enabled: Option<bool>,
}

/// A `[device.<id>]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawDevice {
    device_usb_id: Option<String>,
    enabled: Option<bool>,
    #[serde(default)]
    engine: RawEngine,
    #[serde(default)]
    clicks: HashMap<String, RawClickConfig>,
}

/// Click configuration (action + enabled).
#[derive(Debug, Clone)]
pub struct ClickConfig {
    pub action: Option<String>,
    pub enabled: bool,
}

/// Configuration for a single touch device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub device_usb_id: String,
    pub clicks: HashMap<String, ClickConfig>,
    pub settings: EngineSettings,
}

/// Top-level parsed configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<String>,
    pub devices: HashMap<String, DeviceConfig>,
}

/// Generate the global-to-device fallback merge for engine fields.
macro_rules! engine_fields {
    ($($field:ident),+ $(,)?) => {
        impl RawEngine {
            fn merge_with_fallback(&self, fallback: &RawEngine) -> RawEngine {
                RawEngine {
                    panning_mode: self
                        .panning_mode
                        .clone()
                        .or_else(|| fallback.panning_mode.clone()),
                    $($field: self.$field.or(fallback.$field),)+
                }
            }
        }
    };
}

engine_fields!(dpi, pan, zoom, rotate, tilt, double_tap, double_tap_drag);

impl RawEngine {
    /// Resolve into validated settings; unset fields take the engine
    /// defaults.
    fn into_settings(self, device: &str) -> Result<EngineSettings, MapgestrError> {
        let defaults = EngineSettings::default();

        let panning_mode = match self.panning_mode {
            Some(raw) => {
                PanningMode::from_str(&raw).map_err(|_| MapgestrError::InvalidPanningMode {
                    device: device.to_string(),
                    value: raw.clone(),
                })?
            }
            None => defaults.panning_mode,
        };

        Ok(EngineSettings {
            dpi: self.dpi.unwrap_or(defaults.dpi),
            panning_mode,
            pan: self.pan.unwrap_or(defaults.pan),
            zoom: self.zoom.unwrap_or(defaults.zoom),
            rotate: self.rotate.unwrap_or(defaults.rotate),
            tilt: self.tilt.unwrap_or(defaults.tilt),
            double_tap: self.double_tap.unwrap_or(defaults.double_tap),
            double_tap_drag: self.double_tap_drag.unwrap_or(defaults.double_tap_drag),
        })
    }
}

/// Merge click maps: global first, then device-specific overrides.
fn merge_clicks(
    global: &HashMap<String, RawClickConfig>,
    device: &HashMap<String, RawClickConfig>,
) -> HashMap<String, ClickConfig> {
    let mut merged = HashMap::new();

    for (name, cc) in global.iter().chain(device.iter()) {
        if ClickKind::from_str(name).is_err() {
            warn!("Unknown click kind '{name}' in config - expected single/long/double/dual");
        }
        let entry = merged.entry(name.clone()).or_insert(ClickConfig {
            action: None,
            enabled: false,
        });
        if cc.action.is_some() {
            entry.action.clone_from(&cc.action);
        }
        if let Some(enabled) = cc.enabled {
            entry.enabled = enabled;
        }
    }

    merged
}

/// Look up the action string for an emitted click in the device config.
///
/// Returns `Some(action)` if the click kind is configured, enabled, and has
/// an action.
pub fn resolve_action(kind: ClickKind, clicks: &HashMap<String, ClickConfig>) -> Option<&str> {
    let name: &str = kind.into();
    clicks
        .get(name)
        .filter(|cc| cc.enabled)
        .and_then(|cc| cc.action.as_deref())
}

/// Parse a TOML config file and return the fully resolved `AppConfig`.
pub fn parse_config_file(path: &Path) -> Result<AppConfig, MapgestrError> {
    let raw: RawConfig =
        toml::from_str(
            &fs::read_to_string(path).map_err(|e| MapgestrError::ConfigReadError {
                path: path.to_path_buf(),
                source: e,
            })?,
        )
        .map_err(|e| MapgestrError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut devices = HashMap::new();

    for (device_id, raw_dev) in &raw.device {
        if !raw_dev.enabled.unwrap_or(false) {
            debug!("Device '{device_id}' is not enabled – skipping.");
            continue;
        }

        let Some(usb_id) = raw_dev.device_usb_id.as_deref().filter(|s| !s.is_empty()) else {
            warn!(
                "Device '{device_id}' is enabled but has no device_usb_id – skipping. \
                 Run 'mapgestr --list-devices' to find your USB ID.",
            );
            continue;
        };

        devices.insert(
            device_id.clone(),
            DeviceConfig {
                device_usb_id: usb_id.to_string(),
                clicks: merge_clicks(&raw.global.clicks, &raw_dev.clicks),
                settings: raw_dev
                    .engine
                    .merge_with_fallback(&raw.global.engine)
                    .into_settings(device_id)?,
            },
        );
    }

    Ok(AppConfig {
        log_level: raw.global.log_level.unwrap_or_else(|| "info".to_string()),
        log_file: raw.global.log_file,
        devices,
    })
}
