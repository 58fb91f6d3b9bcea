//! Pointer protocol and touch-event synthesis - no I/O, no hardware, fully
//! testable.
//!
//! This module contains the deterministic input side of the engine: the
//! six-action pointer protocol, the hardware-decoupled [`TouchEvent`]
//! representation, and [`TouchTracker`], which turns Linux multi-touch
//! (type B) reports into protocol actions the way platform views do it:
//! two tracked pointers, and pointer 2 promoted to pointer 1 when the
//! first finger lifts mid-gesture.

/// Sentinel for a pointer position that is not applicable to an action.
pub const NO_COORDINATE: f32 = -1.0;

/// Kernel multi-touch slots tracked per device. Only the first two active
/// touches become protocol pointers; the rest are ignored.
const MAX_SLOTS: usize = 10;

// -- Screen positions -----------------------------------------

/// A position in device pixels, origin at the view's top-left, y-down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    /// The "no coordinate" value passed for unused pointer positions.
    pub const NONE: ScreenPos = ScreenPos {
        x: NO_COORDINATE,
        y: NO_COORDINATE,
    };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &ScreenPos) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &ScreenPos) -> ScreenPos {
        ScreenPos {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }

    /// False for the `(-1, -1)` sentinel and non-finite values.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && !(self.x < 0.0 && self.y < 0.0)
    }
}

// -- Pointer actions ------------------------------------------

/// The six-action pointer protocol. Integer codes match the native
/// platform constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Pointer1Down = 0,
    Pointer2Down = 1,
    Move = 2,
    Cancel = 3,
    Pointer1Up = 4,
    Pointer2Up = 5,
}

impl TouchAction {
    /// Decode a native action code; `None` for out-of-range values.
    pub fn from_code(code: i32) -> Option<TouchAction> {
        match code {
            0 => Some(TouchAction::Pointer1Down),
            1 => Some(TouchAction::Pointer2Down),
            2 => Some(TouchAction::Move),
            3 => Some(TouchAction::Cancel),
            4 => Some(TouchAction::Pointer1Up),
            5 => Some(TouchAction::Pointer2Up),
            _ => None,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, TouchAction::Pointer1Down | TouchAction::Pointer2Down)
    }

    pub fn is_up(&self) -> bool {
        matches!(self, TouchAction::Pointer1Up | TouchAction::Pointer2Up)
    }
}

/// A protocol action with its two pointer positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: TouchAction,
    pub pos1: ScreenPos,
    pub pos2: ScreenPos,
}

// -- TouchEvent -----------------------------------------------

/// Intermediate representation of a relevant touch event, decoupled from
/// `evdev` types for testability.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    Slot(i32),
    TrackingId(i32),
    PositionX(f32),
    PositionY(f32),
    FingerUp,
    SynReport,
}

// -- TouchTracker ---------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SlotState {
    tracking_id: i32, // -1 = empty
    x: f32,
    y: f32,
}

impl Default for SlotState {
    fn default() -> Self {
        Self {
            tracking_id: -1,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Synthesizes protocol actions from multi-touch slot events.
///
/// Feed [`TouchEvent`]s in kernel order; each `SynReport` may yield zero or
/// more [`PointerEvent`]s. The first active slot becomes pointer 1, the
/// second pointer 2. When pointer 1 lifts while pointer 2 remains, the
/// surviving touch is promoted to pointer 1 so a continuing drag stays on
/// the primary pointer.
#[derive(Debug)]
pub struct TouchTracker {
    slots: [SlotState; MAX_SLOTS],
    cur_slot: usize,
    p1_slot: Option<usize>,
    p2_slot: Option<usize>,
    moved: bool,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            slots: [SlotState::default(); MAX_SLOTS],
            cur_slot: 0,
            p1_slot: None,
            p2_slot: None,
            moved: false,
        }
    }

    /// Drop all touch state, e.g. after a device disconnect. The caller is
    /// responsible for sending `Cancel` to the engine.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn on_event(&mut self, event: &TouchEvent) -> Vec<PointerEvent> {
        match event {
            TouchEvent::Slot(i) => {
                self.cur_slot = (*i).clamp(0, MAX_SLOTS as i32 - 1) as usize;
                Vec::new()
            }
            TouchEvent::TrackingId(id) => {
                self.slots[self.cur_slot].tracking_id = *id;
                Vec::new()
            }
            TouchEvent::FingerUp => {
                self.slots[self.cur_slot].tracking_id = -1;
                Vec::new()
            }
            TouchEvent::PositionX(x) => {
                self.slots[self.cur_slot].x = *x;
                self.moved = true;
                Vec::new()
            }
            TouchEvent::PositionY(y) => {
                self.slots[self.cur_slot].y = *y;
                self.moved = true;
                Vec::new()
            }
            TouchEvent::SynReport => self.flush_report(),
        }
    }

    fn pos(&self, slot: usize) -> ScreenPos {
        ScreenPos::new(self.slots[slot].x, self.slots[slot].y)
    }

    fn slot_active(&self, slot: usize) -> bool {
        self.slots[slot].tracking_id >= 0
    }

    /// Diff the slot state against the pointer assignment and emit actions.
    fn flush_report(&mut self) -> Vec<PointerEvent> {
        let mut out = Vec::new();

        // Releases. Pointer 2 first so a simultaneous double release reads
        // as P2Up then P1Up; slot positions survive the release for the
        // final event.
        if let Some(s2) = self.p2_slot {
            if !self.slot_active(s2) {
                let p1 = self.p1_slot.map(|s| self.pos(s)).unwrap_or(ScreenPos::NONE);
                out.push(PointerEvent {
                    action: TouchAction::Pointer2Up,
                    pos1: p1,
                    pos2: self.pos(s2),
                });
                self.p2_slot = None;
            }
        }
        if let Some(s1) = self.p1_slot {
            if !self.slot_active(s1) {
                let pos1 = self.pos(s1);
                let pos2 = self.p2_slot.map(|s| self.pos(s)).unwrap_or(ScreenPos::NONE);
                out.push(PointerEvent {
                    action: TouchAction::Pointer1Up,
                    pos1,
                    pos2,
                });
                // Surviving touch becomes the primary pointer.
                self.p1_slot = self.p2_slot.take();
            }
        }

        // New touches: the first unassigned active slot fills the free role.
        for slot in 0..MAX_SLOTS {
            if !self.slot_active(slot)
                || self.p1_slot == Some(slot)
                || self.p2_slot == Some(slot)
            {
                continue;
            }
            if self.p1_slot.is_none() {
                self.p1_slot = Some(slot);
                out.push(PointerEvent {
                    action: TouchAction::Pointer1Down,
                    pos1: self.pos(slot),
                    pos2: ScreenPos::NONE,
                });
            } else if self.p2_slot.is_none() {
                let s1 = self.p1_slot.unwrap();
                self.p2_slot = Some(slot);
                out.push(PointerEvent {
                    action: TouchAction::Pointer2Down,
                    pos1: self.pos(s1),
                    pos2: self.pos(slot),
                });
            }
            // Third and later touches are ignored.
        }

        // Moves are only reported on quiet frames; a frame that changed the
        // pointer set already carries the fresh positions in its action.
        if out.is_empty() && self.moved {
            if let Some(s1) = self.p1_slot {
                let pos2 = self.p2_slot.map(|s| self.pos(s)).unwrap_or(ScreenPos::NONE);
                out.push(PointerEvent {
                    action: TouchAction::Move,
                    pos1: self.pos(s1),
                    pos2,
                });
            }
        }
        self.moved = false;

        out
    }
}

// -- Core processing ------------------------------------------

/// Feed a sequence of [`TouchEvent`]s through a tracker and collect the
/// protocol actions that fire. Pure and deterministic.
pub fn process_touch_events(
    tracker: &mut TouchTracker,
    events: &[TouchEvent],
) -> Vec<PointerEvent> {
    let mut actions = Vec::new();
    for event in events {
        actions.extend(tracker.on_event(event));
    }
    actions
}

/// Classify a single `evdev::InputEvent` into one of the touch-relevant
/// categories the tracker cares about. Returns `None` for irrelevant
/// events.
pub fn classify_event(event: &evdev::InputEvent) -> Option<TouchEvent> {
    use evdev::{AbsoluteAxisType, InputEventKind};

    match event.kind() {
        InputEventKind::AbsAxis(axis) => match axis {
            AbsoluteAxisType::ABS_MT_SLOT => Some(TouchEvent::Slot(event.value())),
            AbsoluteAxisType::ABS_MT_POSITION_X => {
                Some(TouchEvent::PositionX(event.value() as f32))
            }
            AbsoluteAxisType::ABS_MT_POSITION_Y => {
                Some(TouchEvent::PositionY(event.value() as f32))
            }
            AbsoluteAxisType::ABS_MT_TRACKING_ID => {
                if event.value() == -1 {
                    Some(TouchEvent::FingerUp)
                } else {
                    Some(TouchEvent::TrackingId(event.value()))
                }
            }
            _ => None,
        },
        InputEventKind::Synchronization(evdev::Synchronization::SYN_REPORT) => {
            Some(TouchEvent::SynReport)
        }
        _ => None,
    }
}
