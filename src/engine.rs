//! The gesture engine: nine-state machine, pointer-action dispatch, and
//! the geometric transforms that turn pointer deltas into view mutations.
//!
//! All entry points run on one thread and borrow the view for the duration
//! of the call; time advances only with incoming actions, sampled from a
//! monotonic clock (or supplied by the caller via [`GestureEngine::on_touch_at`]).

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strum::{Display, EnumString};

use crate::event::{ScreenPos, TouchAction};
use crate::kinetic::Momentum;
use crate::listener::{ClickKind, ListenerBroker, MapClickListener, MapInteractionListener};
use crate::view::MapView;

// Two taps this close in time and space form a double tap.
pub const DOUBLE_TAP_TIMEOUT: Duration = Duration::from_millis(300);

// A motionless press this long is a long click.
pub const LONG_PRESS_TIMEOUT: Duration = Duration::from_millis(500);

// After one finger of a dual gesture lifts, single-pointer pan stays
// suppressed for this long so the surviving finger doesn't jerk the map.
pub const DUAL_STOP_HOLD_DURATION: Duration = Duration::from_millis(500);

// A second release within this window of the first still arms momentum.
pub const DUAL_KINETIC_HOLD_DURATION: Duration = Duration::from_millis(200);

// Maximum movement for a press to still count as a click, in inches.
pub const TAP_MOVEMENT_THRESHOLD_INCHES: f32 = 0.1;

// Fingers further apart vertically than this cannot be a tilt.
pub const GUESS_MAX_DELTA_Y_INCHES: f32 = 1.0;

// Accumulated swipe lengths at which the dual guess commits, in inches.
pub const GUESS_MIN_SWIPE_LENGTH_SAME: f32 = 0.1;
pub const GUESS_MIN_SWIPE_LENGTH_OPPOSITE: f32 = 0.075;

// Dominance factor at which a sticky gesture switches rotate <-> scale.
pub const ROTATION_SCALING_THRESHOLD_STICKY: f32 = 0.3;

// Zoom levels per pixel of vertical drag in double-tap-drag zoom.
pub const SINGLE_POINTER_ZOOM_SENSITIVITY: f32 = 0.005;

// Pitch beyond which ground-plane pan deltas are clamped to the screen
// delta, and the ceiling for the tilt gesture.
pub const MAX_PITCH_FOR_PAN_LIMITING: f32 = 75.0 * PI / 180.0;

pub const DEFAULT_DPI: f32 = 160.0;

// -- Modes and settings ---------------------------------------

/// The nine gesture hypotheses. Exactly one is active at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    SingleClickGuess,
    DualClickGuess,
    SinglePan,
    SingleZoom,
    DualGuess,
    DualTilt,
    DualRotate,
    DualScale,
    DualFree,
}

/// Policy for concurrent rotate/scale in a dual gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PanningMode {
    /// Rotate and scale apply simultaneously.
    #[default]
    Free,
    /// Lock to whichever of rotate/scale dominates, switching mid-gesture
    /// when dominance flips.
    Sticky,
    /// Lock until both pointers release.
    StickyFinal,
}

/// Tunable engine behavior. Usually produced by the config layer.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub dpi: f32,
    pub panning_mode: PanningMode,
    pub pan: bool,
    pub zoom: bool,
    pub rotate: bool,
    pub tilt: bool,
    pub double_tap: bool,
    pub double_tap_drag: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            panning_mode: PanningMode::default(),
            pan: true,
            zoom: true,
            rotate: true,
            tilt: true,
            double_tap: true,
            double_tap_drag: true,
        }
    }
}

// -- Transform helpers ----------------------------------------

/// Ground-plane translation that moves the point under `start` to `end`,
/// clamped near the horizon and zeroed on non-finite projections.
pub fn get_translation(view: &dyn MapView, start: ScreenPos, end: ScreenPos) -> (f32, f32) {
    let elev = view.elevation_at(start.x, start.y);
    let (sx, sy) = view.screen_to_ground_plane(start.x, start.y, elev);
    let (ex, ey) = view.screen_to_ground_plane(end.x, end.y, elev);
    let mut dr = (sx - ex, sy - ey);

    if !(dr.0.is_finite() && dr.1.is_finite()) {
        return (0.0, 0.0);
    }

    // prevent extreme panning when the view is nearly horizontal
    if view.pitch() > MAX_PITCH_FOR_PAN_LIMITING {
        let dpx = start.distance_to(&end) / view.pixels_per_meter();
        let dd = dr.0.hypot(dr.1);
        if dd > dpx {
            dr.0 = dr.0 * dpx / dd;
            dr.1 = dr.1 * dpx / dd;
        }
    }
    dr
}

/// Zoom by `delta` levels keeping the ground point under `anchor` fixed on
/// screen.
pub fn anchored_zoom(view: &mut dyn MapView, anchor: ScreenPos, delta: f32) {
    let elev = view.elevation_at(anchor.x, anchor.y);
    let (sx, sy) = view.screen_to_ground_plane(anchor.x, anchor.y, elev);
    view.zoom_by(delta);
    let (ex, ey) = view.screen_to_ground_plane(anchor.x, anchor.y, elev);
    let (dx, dy) = (sx - ex, sy - ey);
    if dx.is_finite() && dy.is_finite() {
        view.translate(dx, dy);
    }
}

/// Dominance of rotation vs scaling between two pointer configurations.
///
/// Positive angle change when rotation dominates scaling by at least 2x,
/// negative scale change when scaling dominates by at least 2x, zero when
/// neither wins.
pub fn calculate_rotating_scaling_factor(
    prev1: ScreenPos,
    prev2: ScreenPos,
    pos1: ScreenPos,
    pos2: ScreenPos,
) -> f32 {
    let prev_dist = prev1.distance_to(&prev2);
    let curr_dist = pos1.distance_to(&pos2);
    let prev_angle = (prev2.y - prev1.y).atan2(prev2.x - prev1.x);
    let curr_angle = (pos2.y - pos1.y).atan2(pos2.x - pos1.x);

    let mut angle_change = (curr_angle - prev_angle).abs();
    if angle_change > PI {
        angle_change = 2.0 * PI - angle_change;
    }
    let scale_change = if prev_dist > 0.0 {
        (curr_dist / prev_dist - 1.0).abs()
    } else {
        0.0
    };

    if angle_change >= 2.0 * scale_change {
        angle_change
    } else if scale_change >= 2.0 * angle_change {
        -scale_change
    } else {
        0.0
    }
}

// -- GestureEngine --------------------------------------------

/// Translates the six-action pointer protocol into map operations.
///
/// Gesture state is public for direct manipulation in tests.
pub struct GestureEngine {
    pub settings: EngineSettings,

    pub mode: GestureMode,
    pub pointers_down: u8,
    pub no_dual_pointer_yet: bool,
    pub interaction_consumed: bool,
    pub dual_click_emitted: bool,

    pub prev1: ScreenPos,
    pub prev2: ScreenPos,

    pub first_tap: Option<(ScreenPos, Instant)>,
    pub p1_down_time: Option<Instant>,
    pub dual_release_time: Option<Instant>,

    pub double_tap_start_pos: ScreenPos,
    pub single_zoom_start_zoom: f32,

    /// Accumulated DPI-normalized displacements for the dual guess.
    pub swipe1: (f32, f32),
    pub swipe2: (f32, f32),

    pub momentum: Momentum,

    listeners: Arc<ListenerBroker>,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureEngine {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            mode: GestureMode::SingleClickGuess,
            pointers_down: 0,
            no_dual_pointer_yet: true,
            interaction_consumed: false,
            dual_click_emitted: false,
            prev1: ScreenPos::NONE,
            prev2: ScreenPos::NONE,
            first_tap: None,
            p1_down_time: None,
            dual_release_time: None,
            double_tap_start_pos: ScreenPos::NONE,
            single_zoom_start_zoom: 0.0,
            swipe1: (0.0, 0.0),
            swipe2: (0.0, 0.0),
            momentum: Momentum::new(),
            listeners: Arc::new(ListenerBroker::new()),
        }
    }

    /// Shared handle to the listener holders; may be kept on another
    /// thread.
    pub fn listeners(&self) -> Arc<ListenerBroker> {
        Arc::clone(&self.listeners)
    }

    pub fn set_click_listener(&self, listener: Option<Arc<dyn MapClickListener>>) {
        self.listeners.set_click_listener(listener);
    }

    pub fn set_interaction_listener(&self, listener: Option<Arc<dyn MapInteractionListener>>) {
        self.listeners.set_interaction_listener(listener);
    }

    pub fn set_dpi(&mut self, dpi: f32) {
        self.settings.dpi = dpi;
    }

    pub fn set_panning_mode(&mut self, mode: PanningMode) {
        self.settings.panning_mode = mode;
    }

    /// Maximum click movement in device pixels.
    pub fn tap_threshold_px(&self) -> f32 {
        TAP_MOVEMENT_THRESHOLD_INCHES * self.settings.dpi
    }

    /// Hard reset: zero velocities, drop all pointers, back to click guess.
    pub fn cancel(&mut self) {
        self.momentum.reset();
        self.mode = GestureMode::SingleClickGuess;
        self.pointers_down = 0;
        self.interaction_consumed = false;
    }

    /// Kinetic tick; returns whether a fling is still in progress. Inactive
    /// while any pointer is down.
    pub fn update(&mut self, view: &mut dyn MapView, dt: f32) -> bool {
        if self.pointers_down > 0 {
            return false;
        }
        self.momentum.update(view, dt)
    }

    /// Ingest a pointer action stamped with the current time. Returns
    /// whether the interaction listener consumed the gesture.
    pub fn on_touch(
        &mut self,
        view: &mut dyn MapView,
        action: TouchAction,
        pos1: ScreenPos,
        pos2: ScreenPos,
    ) -> bool {
        self.on_touch_at(view, action, pos1, pos2, Instant::now())
    }

    /// Ingest a pointer action with an explicit monotonic timestamp.
    pub fn on_touch_at(
        &mut self,
        view: &mut dyn MapView,
        action: TouchAction,
        pos1: ScreenPos,
        pos2: ScreenPos,
        now: Instant,
    ) -> bool {
        // Malformed sequences reset implicitly before the action applies.
        match action {
            TouchAction::Pointer1Down if self.pointers_down > 0 => self.cancel(),
            TouchAction::Pointer2Down if self.pointers_down > 1 => self.cancel(),
            _ => {}
        }

        match action {
            TouchAction::Pointer1Down => self.on_pointer1_down(view, pos1, now),
            TouchAction::Pointer2Down => self.on_pointer2_down(pos1, pos2),
            TouchAction::Move => self.on_move(view, pos1, pos2, now),
            TouchAction::Cancel => self.cancel(),
            TouchAction::Pointer1Up => self.on_pointer1_up(view, pos1, pos2, now),
            TouchAction::Pointer2Up => self.on_pointer2_up(view, pos1, pos2, now),
        }

        if action.is_down() {
            self.pointers_down = (self.pointers_down + 1).min(2);
        } else if action.is_up() {
            self.pointers_down = self.pointers_down.saturating_sub(1);
        }

        self.interaction_consumed
    }

    // -- Action handlers --------------------------------------

    fn on_pointer1_down(&mut self, view: &mut dyn MapView, pos1: ScreenPos, now: Instant) {
        self.p1_down_time = Some(now);
        self.no_dual_pointer_yet = true;
        self.interaction_consumed = false;
        self.dual_click_emitted = false;
        self.momentum.reset();
        self.prev1 = pos1;

        let is_second_tap = self.settings.double_tap
            && self.mode == GestureMode::SingleClickGuess
            && self.first_tap.is_some_and(|(pos, time)| {
                now.saturating_duration_since(time) < DOUBLE_TAP_TIMEOUT
                    && pos1.distance_to(&pos) < self.tap_threshold_px()
            });

        if is_second_tap && self.settings.double_tap_drag {
            if self.consult_interaction(false, true, false, false) {
                self.first_tap = Some((pos1, now));
            } else {
                self.start_single_zoom(view, pos1);
            }
        } else if !is_second_tap {
            self.mode = GestureMode::SingleClickGuess;
            self.first_tap = Some((pos1, now));
        }
        // Second tap with drag-zoom disabled: stay in click guess and let
        // the release decide.
    }

    fn on_pointer2_down(&mut self, pos1: ScreenPos, pos2: ScreenPos) {
        self.no_dual_pointer_yet = false;
        match self.mode {
            GestureMode::SingleClickGuess => {
                self.mode = GestureMode::DualClickGuess;
                self.prev1 = pos1;
                self.prev2 = pos2;
                self.swipe1 = (0.0, 0.0);
                self.swipe2 = (0.0, 0.0);
            }
            GestureMode::SinglePan | GestureMode::SingleZoom => {
                self.start_dual_pointer(pos1, pos2);
            }
            _ => {}
        }
    }

    fn on_move(&mut self, view: &mut dyn MapView, pos1: ScreenPos, pos2: ScreenPos, now: Instant) {
        if self.interaction_consumed {
            return;
        }

        match self.mode {
            GestureMode::SingleClickGuess => {
                if pos1.distance_to(&self.prev1) > self.tap_threshold_px()
                    && self.settings.pan
                    && !self.consult_interaction(true, false, false, false)
                {
                    self.mode = GestureMode::SinglePan;
                    self.prev1 = pos1;
                }
            }
            GestureMode::DualClickGuess => {
                if !self.consult_interaction(true, true, true, true) {
                    self.mode = GestureMode::DualGuess;
                    self.dual_pointer_guess(view, pos1, pos2, now);
                }
            }
            GestureMode::SinglePan => {
                if !self.in_dual_stop_hold(now) {
                    self.single_pointer_pan(view, pos1, now);
                }
            }
            GestureMode::SingleZoom => self.single_pointer_zoom(view, pos1, now),
            GestureMode::DualGuess => self.dual_pointer_guess(view, pos1, pos2, now),
            GestureMode::DualTilt => self.dual_pointer_tilt(view, pos1),
            GestureMode::DualRotate | GestureMode::DualScale => {
                if self.settings.panning_mode == PanningMode::Sticky {
                    let factor =
                        calculate_rotating_scaling_factor(self.prev1, self.prev2, pos1, pos2);
                    if self.mode == GestureMode::DualRotate
                        && factor < -ROTATION_SCALING_THRESHOLD_STICKY
                    {
                        self.mode = GestureMode::DualScale;
                    } else if self.mode == GestureMode::DualScale
                        && factor > ROTATION_SCALING_THRESHOLD_STICKY
                    {
                        self.mode = GestureMode::DualRotate;
                    }
                }
                let rotate = self.mode == GestureMode::DualRotate;
                self.dual_pointer_pan(view, pos1, pos2, rotate, !rotate, now);
            }
            GestureMode::DualFree => self.dual_pointer_pan(view, pos1, pos2, true, true, now),
        }
    }

    fn on_pointer1_up(
        &mut self,
        view: &mut dyn MapView,
        pos1: ScreenPos,
        pos2: ScreenPos,
        now: Instant,
    ) {
        let tap_duration = self.p1_down_time.map(|t| now.saturating_duration_since(t));
        let move_dist = pos1.distance_to(&self.prev1);
        let is_tap = move_dist < self.tap_threshold_px();

        match self.mode {
            GestureMode::SingleClickGuess => {
                if !self.dual_click_emitted {
                    if is_tap && tap_duration.is_some_and(|d| d >= LONG_PRESS_TIMEOUT) {
                        self.emit_click(ClickKind::Long, pos1.x, pos1.y);
                    } else if tap_duration.is_some_and(|d| d < DOUBLE_TAP_TIMEOUT) {
                        self.emit_click(ClickKind::Single, self.prev1.x, self.prev1.y);
                    }
                }
            }
            GestureMode::DualClickGuess => {
                self.mode = GestureMode::SingleClickGuess;
            }
            GestureMode::SinglePan => {
                self.mode = GestureMode::SingleClickGuess;
                if self.can_arm_kinetic(now) {
                    self.momentum.arm_pan(view, now);
                    self.momentum.arm_zoom(now);
                } else {
                    self.momentum.velocity_pan = (0.0, 0.0);
                    self.momentum.velocity_zoom = 0.0;
                }
            }
            GestureMode::SingleZoom => {
                if is_tap && tap_duration.is_some_and(|d| d < DOUBLE_TAP_TIMEOUT) {
                    let consumed = self.emit_click(ClickKind::Double, pos1.x, pos1.y);
                    if !consumed {
                        self.momentum.reset();
                        anchored_zoom(view, pos1, 1.0);
                    }
                }
                self.mode = GestureMode::SingleClickGuess;
                if self.can_arm_kinetic(now) {
                    self.momentum.arm_zoom(now);
                } else {
                    self.momentum.velocity_zoom = 0.0;
                }
            }
            GestureMode::DualGuess
            | GestureMode::DualTilt
            | GestureMode::DualRotate
            | GestureMode::DualScale
            | GestureMode::DualFree => {
                // Pointer 2 becomes the surviving pan anchor.
                self.dual_release_time = Some(now);
                self.prev1 = if pos2.is_valid() { pos2 } else { pos1 };
                self.mode = GestureMode::SinglePan;
            }
        }
    }

    fn on_pointer2_up(
        &mut self,
        view: &mut dyn MapView,
        pos1: ScreenPos,
        pos2: ScreenPos,
        now: Instant,
    ) {
        match self.mode {
            GestureMode::DualClickGuess => {
                let quick = self
                    .p1_down_time
                    .is_some_and(|t| now.saturating_duration_since(t) < DOUBLE_TAP_TIMEOUT);
                if quick {
                    let mid = pos1.midpoint(&pos2);
                    self.dual_click_emitted = true;
                    if !self.emit_click(ClickKind::Dual, mid.x, mid.y) {
                        self.momentum.reset();
                        anchored_zoom(view, mid, -1.0);
                    }
                }
                self.mode = GestureMode::SingleClickGuess;
            }
            GestureMode::DualGuess
            | GestureMode::DualTilt
            | GestureMode::DualRotate
            | GestureMode::DualScale
            | GestureMode::DualFree => {
                self.dual_release_time = Some(now);
                self.prev1 = pos1;
                self.mode = GestureMode::SinglePan;
            }
            _ => {}
        }
    }

    // -- Continuous transforms ---------------------------------

    fn start_single_zoom(&mut self, view: &dyn MapView, pos: ScreenPos) {
        self.single_zoom_start_zoom = view.zoom();
        self.double_tap_start_pos = pos;
        self.prev1 = pos;
        self.mode = GestureMode::SingleZoom;
    }

    fn start_dual_pointer(&mut self, pos1: ScreenPos, pos2: ScreenPos) {
        self.prev1 = pos1;
        self.prev2 = pos2;
        self.swipe1 = (0.0, 0.0);
        self.swipe2 = (0.0, 0.0);
        self.mode = GestureMode::DualGuess;
    }

    fn single_pointer_pan(&mut self, view: &mut dyn MapView, pos: ScreenPos, now: Instant) {
        let (dx, dy) = get_translation(view, self.prev1, pos);
        view.translate(dx, dy);
        self.momentum.track_pan(dx, dy, now);
        self.prev1 = pos;
    }

    fn single_pointer_zoom(&mut self, view: &mut dyn MapView, pos: ScreenPos, now: Instant) {
        let dz = (pos.y - self.prev1.y) * SINGLE_POINTER_ZOOM_SENSITIVITY;
        anchored_zoom(view, self.double_tap_start_pos, dz);
        self.momentum.track_zoom(dz, now);
        self.prev1 = pos;
    }

    /// Classify an ambiguous dual gesture, then let the winning mode handle
    /// the same move so no pointer delta is lost.
    fn dual_pointer_guess(
        &mut self,
        view: &mut dyn MapView,
        pos1: ScreenPos,
        pos2: ScreenPos,
        now: Instant,
    ) {
        let tilt_enabled = self.settings.tilt;
        let turn_enabled = self.settings.rotate || self.settings.zoom;
        let dpi = self.settings.dpi;

        match (tilt_enabled, turn_enabled) {
            (false, false) => {
                self.mode = GestureMode::SingleClickGuess;
                return;
            }
            (true, false) => self.mode = GestureMode::DualTilt,
            (false, true) => self.mode = GestureMode::DualFree,
            (true, true) => {
                if (pos1.y - pos2.y).abs() / dpi > GUESS_MAX_DELTA_Y_INCHES {
                    // Fingers too far apart vertically to be a tilt.
                    self.mode = GestureMode::DualFree;
                } else {
                    self.swipe1.0 += (pos1.x - self.prev1.x) / dpi;
                    self.swipe1.1 += (pos1.y - self.prev1.y) / dpi;
                    self.swipe2.0 += (pos2.x - self.prev2.x) / dpi;
                    self.swipe2.1 += (pos2.y - self.prev2.y) / dpi;

                    let longest = self.swipe1.0.hypot(self.swipe1.1)
                        .max(self.swipe2.0.hypot(self.swipe2.1));
                    let y_product = self.swipe1.1 * self.swipe2.1;

                    if longest > GUESS_MIN_SWIPE_LENGTH_OPPOSITE && y_product <= 0.0 {
                        self.mode = match self.settings.panning_mode {
                            PanningMode::Free => GestureMode::DualFree,
                            PanningMode::Sticky | PanningMode::StickyFinal => {
                                GestureMode::DualRotate
                            }
                        };
                    } else if longest > GUESS_MIN_SWIPE_LENGTH_SAME && y_product > 0.0 {
                        self.mode = GestureMode::DualTilt;
                    }
                }
            }
        }

        match self.mode {
            GestureMode::DualGuess => {
                // Still ambiguous; keep measuring from the latest positions.
                self.prev1 = pos1;
                self.prev2 = pos2;
            }
            GestureMode::DualTilt => self.dual_pointer_tilt(view, pos1),
            GestureMode::DualRotate => self.dual_pointer_pan(view, pos1, pos2, true, false, now),
            GestureMode::DualFree => self.dual_pointer_pan(view, pos1, pos2, true, true, now),
            _ => {}
        }
    }

    fn dual_pointer_pan(
        &mut self,
        view: &mut dyn MapView,
        pos1: ScreenPos,
        pos2: ScreenPos,
        rotate: bool,
        scale: bool,
        now: Instant,
    ) {
        let prev_center = self.prev1.midpoint(&self.prev2);
        let curr_center = pos1.midpoint(&pos2);

        if self.settings.pan {
            let (dx, dy) = get_translation(view, prev_center, curr_center);
            view.translate(dx, dy);
            self.momentum.track_pan(dx, dy, now);
        }

        if scale && self.settings.zoom {
            let prev_dist = self.prev1.distance_to(&self.prev2);
            let curr_dist = pos1.distance_to(&pos2);
            if prev_dist > 0.0 && curr_dist > 0.0 {
                let dz = (curr_dist / prev_dist).log2();
                anchored_zoom(view, curr_center, dz);
                self.momentum.track_zoom(dz, now);
            }
        }

        if rotate && self.settings.rotate {
            let prev_angle = (self.prev2.y - self.prev1.y).atan2(self.prev2.x - self.prev1.x);
            let curr_angle = (pos2.y - pos1.y).atan2(pos2.x - pos1.x);
            let rotation = curr_angle - prev_angle;

            let elev = view.elevation_at(curr_center.x, curr_center.y);
            let (ox, oy) = view.screen_to_ground_plane(curr_center.x, curr_center.y, elev);
            let (sin, cos) = rotation.sin_cos();
            let (dx, dy) = (ox - (ox * cos - oy * sin), oy - (ox * sin + oy * cos));
            if dx.is_finite() && dy.is_finite() {
                view.translate(dx, dy);
            }
            view.yaw_by(rotation);
        }

        self.prev1 = pos1;
        self.prev2 = pos2;
    }

    fn dual_pointer_tilt(&mut self, view: &mut dyn MapView, pos1: ScreenPos) {
        let angle = -PI * (pos1.y - self.prev1.y) / view.height();

        let max_pitch = MAX_PITCH_FOR_PAN_LIMITING.min(view.max_pitch());
        let pitch0 = view.pitch().clamp(0.0, max_pitch);
        let pitch1 = (view.pitch() + angle).clamp(0.0, max_pitch);

        view.pitch_by(pitch1 - pitch0);
        self.prev1 = pos1;
    }

    // -- Listener plumbing -------------------------------------

    fn consult_interaction(&mut self, pan: bool, zoom: bool, rotate: bool, tilt: bool) -> bool {
        let consumed = self.listeners.dispatch_interaction(pan, zoom, rotate, tilt);
        if consumed {
            self.interaction_consumed = true;
        }
        consumed
    }

    fn emit_click(&self, kind: ClickKind, x: f32, y: f32) -> bool {
        self.listeners.dispatch_click(kind, x, y)
    }

    fn in_dual_stop_hold(&self, now: Instant) -> bool {
        self.dual_release_time
            .is_some_and(|t| now.saturating_duration_since(t) < DUAL_STOP_HOLD_DURATION)
    }

    fn can_arm_kinetic(&self, now: Instant) -> bool {
        self.no_dual_pointer_yet
            || self
                .dual_release_time
                .is_some_and(|t| now.saturating_duration_since(t) < DUAL_KINETIC_HOLD_DURATION)
    }
}
