//! The view interface the engine mutates, plus a flat-plane implementation.
//!
//! The engine never owns a view; every entry point borrows one. Gesture
//! math only needs the narrow contract below: projection of screen points
//! onto the ground plane and the four mutators.

use std::f32::consts::PI;

/// Square tile size in pixels, the usual web-map convention.
const TILE_SIZE: f32 = 256.0;

/// Length of the projected world at zoom 0, in meters.
const WORLD_CIRCUMFERENCE_M: f32 = 40_075_016.7;

const MIN_ZOOM: f32 = 0.0;
const MAX_ZOOM: f32 = 22.0;

/// Map view consumed by the gesture engine.
///
/// `screen_to_ground_plane` returns the ground-plane offset of a screen
/// position *relative to the view center*, in map meters. Offsets rather
/// than absolute coordinates are what the rotation anchor identity
/// `Δcenter = offset − rotate(offset, Δθ)` requires.
pub trait MapView {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    /// Screen pixels per map meter at the view center.
    fn pixels_per_meter(&self) -> f32;
    /// Display density multiplier (device pixels per logical pixel).
    fn pixel_scale(&self) -> f32;
    fn zoom(&self) -> f32;
    fn pitch(&self) -> f32;
    fn max_pitch(&self) -> f32;

    /// Terrain elevation under a screen position, in meters.
    fn elevation_at(&self, x: f32, y: f32) -> f32;
    /// Project a screen position onto the ground plane at the given
    /// elevation.
    fn screen_to_ground_plane(&self, x: f32, y: f32, elev: f32) -> (f32, f32);

    /// Shift the view center by ground-plane meters.
    fn translate(&mut self, dx: f32, dy: f32);
    /// Change the zoom by a delta in zoom levels.
    fn zoom_by(&mut self, delta: f32);
    /// Rotate the view about the vertical axis.
    fn yaw_by(&mut self, radians: f32);
    /// Tilt the view; implementations clamp to `[0, max_pitch]`.
    fn pitch_by(&mut self, radians: f32);
}

/// A flat-plane map view with web-mercator-style scaling.
///
/// Projection ignores pitch (the plane is viewed top-down); pitch is kept
/// for the tilt gesture and pan limiting. Good enough for the daemon's
/// virtual map and for exercising the engine in tests.
///
/// State is public for direct manipulation in tests.
#[derive(Debug, Clone)]
pub struct PlanarView {
    pub width: f32,
    pub height: f32,
    pub pixel_scale: f32,
    pub zoom: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub max_pitch: f32,
    /// View center in map meters.
    pub center: (f32, f32),
}

impl PlanarView {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_scale: 1.0,
            zoom: 10.0,
            yaw: 0.0,
            pitch: 0.0,
            max_pitch: PI / 2.0,
            center: (0.0, 0.0),
        }
    }

    /// Absolute ground-plane position under a screen point, in map meters.
    pub fn ground_position(&self, x: f32, y: f32) -> (f32, f32) {
        let (gx, gy) = self.screen_to_ground_plane(x, y, 0.0);
        (self.center.0 + gx, self.center.1 + gy)
    }
}

impl MapView for PlanarView {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn pixels_per_meter(&self) -> f32 {
        self.pixel_scale * TILE_SIZE * 2f32.powf(self.zoom) / WORLD_CIRCUMFERENCE_M
    }

    fn pixel_scale(&self) -> f32 {
        self.pixel_scale
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn max_pitch(&self) -> f32 {
        self.max_pitch
    }

    fn elevation_at(&self, _x: f32, _y: f32) -> f32 {
        0.0
    }

    fn screen_to_ground_plane(&self, x: f32, y: f32, _elev: f32) -> (f32, f32) {
        let ppm = self.pixels_per_meter();
        let sx = (x - self.width * 0.5) / ppm;
        let sy = (y - self.height * 0.5) / ppm;
        let (sin, cos) = self.yaw.sin_cos();
        (sx * cos - sy * sin, sx * sin + sy * cos)
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.center.0 += dx;
        self.center.1 += dy;
    }

    fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn yaw_by(&mut self, radians: f32) {
        self.yaw += radians;
    }

    fn pitch_by(&mut self, radians: f32) {
        self.pitch = (self.pitch + radians).clamp(0.0, self.max_pitch);
    }
}
