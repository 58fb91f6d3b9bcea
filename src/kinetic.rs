//! Fling momentum: velocity estimation while a gesture runs and the
//! exponential decay loop that plays it out after release.

use std::time::Instant;

use crate::view::MapView;

/// Damping factor for translation; reciprocal of the decay period in
/// seconds.
pub const DAMPING_PAN: f32 = 4.0;

/// Damping factor for zoom; reciprocal of the decay period in seconds.
pub const DAMPING_ZOOM: f32 = 6.0;

/// Minimum translation at which momentum should start (pixels per second).
pub const THRESHOLD_START_PAN: f32 = 350.0;

/// Minimum translation at which momentum should stop (pixels per second).
pub const THRESHOLD_STOP_PAN: f32 = 24.0;

/// Minimum zoom at which momentum should start (zoom levels per second).
pub const THRESHOLD_START_ZOOM: f32 = 1.0;

/// Minimum zoom at which momentum should stop (zoom levels per second).
pub const THRESHOLD_STOP_ZOOM: f32 = 0.3;

/// Blend factor for the per-move velocity average.
const SMOOTHING: f32 = 0.5;

/// Event gap above which the previous average no longer describes the
/// pointer and the estimate restarts from the latest sample.
const SAMPLE_GAP_SECS: f32 = 0.04;

/// A release this long after the last move means the pointer was resting;
/// no momentum.
const VELOCITY_HORIZON_SECS: f32 = 0.1;

/// Decaying pan/zoom velocities with their move-delta estimator.
///
/// Pan velocity is in map meters per second, zoom velocity in zoom levels
/// per second. Fields are public for direct manipulation in tests.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    pub velocity_pan: (f32, f32),
    pub velocity_zoom: f32,
    last_pan_sample: Option<Instant>,
    last_zoom_sample: Option<Instant>,
}

impl Momentum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.velocity_pan = (0.0, 0.0);
        self.velocity_zoom = 0.0;
        self.last_pan_sample = None;
        self.last_zoom_sample = None;
    }

    /// Record a pan step of `(dx, dy)` map meters applied at `now`.
    pub fn track_pan(&mut self, dx: f32, dy: f32, now: Instant) {
        let prev = self.last_pan_sample.replace(now);
        let Some(prev) = prev else {
            return;
        };
        let dt = now.saturating_duration_since(prev).as_secs_f32();
        if dt <= 0.0 {
            return;
        }
        let inst = (dx / dt, dy / dt);
        if dt > SAMPLE_GAP_SECS {
            self.velocity_pan = inst;
        } else {
            self.velocity_pan.0 += SMOOTHING * (inst.0 - self.velocity_pan.0);
            self.velocity_pan.1 += SMOOTHING * (inst.1 - self.velocity_pan.1);
        }
    }

    /// Record a zoom step of `dz` levels applied at `now`.
    pub fn track_zoom(&mut self, dz: f32, now: Instant) {
        let prev = self.last_zoom_sample.replace(now);
        let Some(prev) = prev else {
            return;
        };
        let dt = now.saturating_duration_since(prev).as_secs_f32();
        if dt <= 0.0 {
            return;
        }
        let inst = dz / dt;
        if dt > SAMPLE_GAP_SECS {
            self.velocity_zoom = inst;
        } else {
            self.velocity_zoom += SMOOTHING * (inst - self.velocity_zoom);
        }
    }

    fn stale(sample: Option<Instant>, now: Instant) -> bool {
        match sample {
            Some(t) => now.saturating_duration_since(t).as_secs_f32() > VELOCITY_HORIZON_SECS,
            None => true,
        }
    }

    /// Keep the pan velocity for flinging if it clears the start threshold
    /// at `now`; zero it otherwise.
    pub fn arm_pan(&mut self, view: &dyn MapView, now: Instant) {
        if Self::stale(self.last_pan_sample, now) {
            self.velocity_pan = (0.0, 0.0);
            return;
        }
        let to_px = view.pixels_per_meter() / view.pixel_scale();
        let speed = (self.velocity_pan.0 * to_px).hypot(self.velocity_pan.1 * to_px);
        if speed <= THRESHOLD_START_PAN {
            self.velocity_pan = (0.0, 0.0);
        }
    }

    /// Keep the zoom velocity for flinging if it clears the start threshold
    /// at `now`; zero it otherwise.
    pub fn arm_zoom(&mut self, now: Instant) {
        if Self::stale(self.last_zoom_sample, now)
            || self.velocity_zoom.abs() < THRESHOLD_START_ZOOM
        {
            self.velocity_zoom = 0.0;
        }
    }

    /// True while either velocity is above its stop threshold.
    pub fn is_flinging(&self, view: &dyn MapView) -> bool {
        let to_px = view.pixels_per_meter() / view.pixel_scale();
        let pan_px = (self.velocity_pan.0 * to_px).hypot(self.velocity_pan.1 * to_px);
        pan_px > THRESHOLD_STOP_PAN || self.velocity_zoom.abs() > THRESHOLD_STOP_ZOOM
    }

    /// Integrate one tick of decay; returns whether a fling is still in
    /// progress. `dt` is clamped to non-negative seconds.
    pub fn update(&mut self, view: &mut dyn MapView, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if !self.is_flinging(view) {
            return false;
        }

        let damp = (dt * DAMPING_PAN).min(1.0);
        self.velocity_pan.0 -= damp * self.velocity_pan.0;
        self.velocity_pan.1 -= damp * self.velocity_pan.1;
        view.translate(dt * self.velocity_pan.0, dt * self.velocity_pan.1);

        let damp = (dt * DAMPING_ZOOM).min(1.0);
        self.velocity_zoom -= damp * self.velocity_zoom;
        view.zoom_by(self.velocity_zoom * dt);

        true
    }
}
