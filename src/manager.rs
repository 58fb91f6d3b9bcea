//! Multi-device gesture manager and device discovery (I/O layer).
//!
//! Pure event-processing logic lives in [`crate::event`] and
//! [`crate::engine`]. Each configured device gets a reader thread feeding
//! raw touch events over a channel into an engine loop; the loop also
//! ticks the kinetic driver so flings keep animating between event
//! batches.

use std::collections::HashMap;
use std::process::{Command, ExitCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use evdev::{AbsoluteAxisType, Device};
use log::{debug, error, info, warn};

use crate::config::{
    AppConfig, ClickConfig, DeviceConfig, MapgestrError, parse_config_file, resolve_action,
};
use crate::engine::GestureEngine;
use crate::event::{TouchEvent, TouchTracker, classify_event, process_touch_events};
use crate::listener::{ClickKind, MapClickListener};
use crate::view::PlanarView;

/// Kinetic tick period while waiting for device events.
const TICK: Duration = Duration::from_millis(16);

enum DeviceMessage {
    Events(Vec<TouchEvent>),
    Disconnected,
}

enum LoopExit {
    Shutdown,
    Disconnected,
}

// -- GestureManager (top-level orchestrator) ------------------

/// Manages gesture engines across multiple touch devices.
pub struct GestureManager {
    config: AppConfig,
    running: Arc<AtomicBool>,
}

impl GestureManager {
    pub fn new(config_path: impl AsRef<std::path::Path>) -> Result<Self, MapgestrError> {
        Ok(Self {
            config: parse_config_file(config_path.as_ref())?,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start listening to all configured devices.
    pub fn start(&mut self) {
        if self.config.devices.is_empty() {
            error!("No devices configured");
            return;
        }

        self.running.store(true, Ordering::Relaxed);
        info!("Starting gesture manager");

        let mut handles = Vec::new();

        for (device_id, device_config) in &self.config.devices {
            if let Some(device) = find_device(device_id, device_config) {
                let device_id = device_id.clone();
                let config = device_config.clone();
                let running = Arc::clone(&self.running);

                handles.push(
                    thread::Builder::new()
                        .name(format!("gesture-{device_id}"))
                        .spawn(move || {
                            run_device_loop(&device_id, device, &config, &running);
                        })
                        .expect("Failed to spawn device thread"),
                );
            } else {
                warn!("Device not found: {device_id}");
            }
        }

        if handles.is_empty() {
            error!("No devices found, exiting");
            return;
        }

        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Stop listening to devices.
    #[allow(dead_code)]
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        info!("Gesture manager stopped");
    }

    /// Get a reference to the running flag for signal handling.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Get the log level from the parsed configuration.
    pub fn config_log_level(&self) -> &str {
        &self.config.log_level
    }

    /// Get the optional log file path from the parsed configuration.
    pub fn config_log_file(&self) -> Option<&str> {
        self.config.log_file.as_deref()
    }
}

// -- Click actions --------------------------------------------

/// Spawns the configured shell action when the engine emits a click.
struct ClickActions {
    device_id: String,
    clicks: HashMap<String, ClickConfig>,
}

impl MapClickListener for ClickActions {
    fn on_map_click(&self, kind: ClickKind, x: f32, y: f32) -> bool {
        let name: &str = kind.into();
        if let Some(action) = resolve_action(kind, &self.clicks) {
            match Command::new("sh").arg("-c").arg(action).spawn() {
                Ok(_) => debug!("Spawned action: {action}"),
                Err(e) => error!("Failed to execute action '{action}': {e}"),
            }
            info!("{}: {name} click at ({x:.0}, {y:.0})", self.device_id);
        }
        // Engine defaults (e.g. double-click zoom) still apply.
        false
    }
}

// -- Device I/O -----------------------------------------------

/// Parse a USB vendor:product ID string into `(vendor, product)`.
///
/// Accepts formats like `"1234:5678"` or `"USB:1234:5678"`
/// (case-insensitive). Returns `None` if the format is invalid or the hex
/// values cannot be parsed.
pub fn parse_usb_id(raw: &str) -> Option<(u16, u16)> {
    let cleaned = raw.to_lowercase().replace("usb:", "");
    let (vendor_str, product_str) = cleaned.split_once(':')?;
    let vendor = u16::from_str_radix(vendor_str, 16).ok()?;
    let product = u16::from_str_radix(product_str, 16).ok()?;
    Some((vendor, product))
}

/// Check if a device has multi-touch capabilities.
fn is_touch_device(device: &Device) -> bool {
    let Some(abs_axes) = device.supported_absolute_axes() else {
        return false;
    };
    abs_axes.contains(AbsoluteAxisType::ABS_MT_POSITION_X)
        && abs_axes.contains(AbsoluteAxisType::ABS_MT_POSITION_Y)
}

/// Find a touchscreen device by USB vendor:product ID.
fn find_device(device_id: &str, config: &DeviceConfig) -> Option<Device> {
    let Some((vendor, product)) = parse_usb_id(&config.device_usb_id) else {
        warn!(
            "Device {device_id}: invalid USB ID format '{}' (expected vendor:product)",
            config.device_usb_id
        );
        return None;
    };

    for (path, device) in evdev::enumerate() {
        if !is_touch_device(&device) {
            continue;
        }
        let id = device.input_id();
        if id.vendor() == vendor && id.product() == product {
            info!(
                "Found device for {} by USB ID {}: {} ({})",
                device_id,
                config.device_usb_id,
                device.name().unwrap_or("unknown"),
                path.display()
            );
            return Some(device);
        }
    }

    warn!(
        "Device {}: no touch device with USB ID {} found",
        device_id, config.device_usb_id
    );
    None
}

/// Set up the engine and virtual view for a device, then run the engine
/// loop with reconnects.
fn run_device_loop(
    device_id: &str,
    mut device: Device,
    config: &DeviceConfig,
    running: &Arc<AtomicBool>,
) {
    let abs = match device.get_abs_state() {
        Ok(state) => state,
        Err(e) => {
            error!("Device {device_id} failed to get abs state: {e}");
            return;
        }
    };

    let x = &abs[AbsoluteAxisType::ABS_MT_POSITION_X.0 as usize];
    let y = &abs[AbsoluteAxisType::ABS_MT_POSITION_Y.0 as usize];

    info!(
        "Started processing device: {device_id} (USB {})",
        config.device_usb_id
    );
    debug!(
        "  X range: {}..{}, Y range: {}..{}",
        x.minimum, x.maximum, y.minimum, y.maximum
    );

    let mut engine = GestureEngine::with_settings(config.settings.clone());
    engine.set_click_listener(Some(Arc::new(ClickActions {
        device_id: device_id.to_string(),
        clicks: config.clicks.clone(),
    })));

    let mut view = PlanarView::new(
        (x.maximum - x.minimum).max(1) as f32,
        (y.maximum - y.minimum).max(1) as f32,
    );

    loop {
        let (tx, rx) = mpsc::channel();
        let reader = spawn_reader(device, tx, Arc::clone(running), device_id.to_string());

        let exit = drive_engine(&rx, &mut engine, &mut view, running);

        match exit {
            // The reader exits on its own once its blocking read yields.
            LoopExit::Shutdown => return,
            LoopExit::Disconnected => {
                let _ = reader.join();
                engine.cancel();
                match attempt_reconnect(device_id, config, running) {
                    Some(new_device) => device = new_device,
                    None => return,
                }
            }
        }
    }
}

/// Blocking reads from the kernel, forwarded as classified batches.
fn spawn_reader(
    mut device: Device,
    tx: mpsc::Sender<DeviceMessage>,
    running: Arc<AtomicBool>,
    device_id: String,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            match device.fetch_events() {
                Ok(events) => {
                    let batch: Vec<TouchEvent> =
                        events.filter_map(|e| classify_event(&e)).collect();
                    if !batch.is_empty() && tx.send(DeviceMessage::Events(batch)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if running.load(Ordering::Relaxed) {
                        warn!("Device {device_id} disconnected: {e}");
                        let _ = tx.send(DeviceMessage::Disconnected);
                    }
                    break;
                }
            }
        }
    })
}

/// Feed tracker output into the engine and tick the kinetic driver.
fn drive_engine(
    rx: &mpsc::Receiver<DeviceMessage>,
    engine: &mut GestureEngine,
    view: &mut PlanarView,
    running: &Arc<AtomicBool>,
) -> LoopExit {
    let mut tracker = TouchTracker::new();
    let mut last_tick = Instant::now();

    loop {
        if !running.load(Ordering::Relaxed) {
            return LoopExit::Shutdown;
        }

        match rx.recv_timeout(TICK) {
            Ok(DeviceMessage::Events(batch)) => {
                for pe in process_touch_events(&mut tracker, &batch) {
                    engine.on_touch(view, pe.action, pe.pos1, pe.pos2);
                }
                debug!(
                    "view: center=({:.1}, {:.1}) zoom={:.2} yaw={:.2} pitch={:.2}",
                    view.center.0, view.center.1, view.zoom, view.yaw, view.pitch
                );
            }
            Ok(DeviceMessage::Disconnected) => return LoopExit::Disconnected,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return LoopExit::Disconnected,
        }

        let now = Instant::now();
        let dt = now.saturating_duration_since(last_tick).as_secs_f32();
        last_tick = now;
        engine.update(view, dt);
    }
}

/// Attempt to reconnect to a device after it disconnects.
fn attempt_reconnect(
    device_id: &str,
    config: &DeviceConfig,
    running: &Arc<AtomicBool>,
) -> Option<Device> {
    const MAX_RETRIES: usize = 10;
    const RETRY_INTERVAL: Duration = Duration::from_secs(5);

    for attempt in 1..=MAX_RETRIES {
        if !running.load(Ordering::Relaxed) {
            return None;
        }
        info!("Reconnect attempt {attempt}/{MAX_RETRIES} for {device_id}...");
        thread::sleep(RETRY_INTERVAL);

        if let Some(new_device) = find_device(device_id, config) {
            info!("Reconnected to {device_id}");
            return Some(new_device);
        }
    }
    error!("Failed to reconnect to {device_id} after {MAX_RETRIES} attempts");
    None
}

/// List all multi-touch capable devices.
pub fn list_touch_devices() -> ExitCode {
    println!("\n=== mapgestr: Available Touchscreen Devices ===\n");
    let mut touch_count = 0;

    for (path, device) in evdev::enumerate() {
        if !is_touch_device(&device) {
            continue;
        }

        touch_count += 1;
        println!(
            "Device {touch_count}:\n\
             \x20 Path:      {}\n\
             \x20 Name:      {}\n\
             \x20 USB ID:    {:04x}:{:04x}\n\
             \x20 Phys:      {}\n",
            path.display(),
            device.name().unwrap_or("unknown"),
            device.input_id().vendor(),
            device.input_id().product(),
            device.physical_path().unwrap_or("N/A"),
        );
    }

    if touch_count == 0 {
        println!(
            "No multi-touch devices found.\n\n\
             Troubleshooting:\n\
             \x20 - Check if touchscreen is connected\n\
             \x20 - Run 'libinput list-devices' to see all devices\n\
             \x20 - Run as root if devices are not visible"
        );
        return ExitCode::FAILURE;
    }

    println!(
        "Found {touch_count} touch device(s).\n\n\
         Add the USB ID to your gestures.toml:\n\
         \x20 [device.<name>]\n\
         \x20 device_usb_id = \"<USB ID>\"\n\
         \x20 enabled = true"
    );
    ExitCode::SUCCESS
}
