//! Tests for `mapgestr::event` - screen positions, action codes, and the
//! multi-touch slot tracker that synthesizes the pointer protocol.

use mapgestr::event::{
    PointerEvent, ScreenPos, TouchAction, TouchEvent, TouchTracker, process_touch_events,
};
use mapgestr::manager::parse_usb_id;

// ── Helpers ──────────────────────────────────────────────────

fn pos(x: f32, y: f32) -> ScreenPos {
    ScreenPos::new(x, y)
}

fn feed(tracker: &mut TouchTracker, events: &[TouchEvent]) -> Vec<PointerEvent> {
    process_touch_events(tracker, events)
}

// ── ScreenPos ────────────────────────────────────────────────

#[test]
fn test_screen_pos_distance_and_midpoint() {
    let a = pos(0.0, 0.0);
    let b = pos(3.0, 4.0);
    assert_eq!(a.distance_to(&b), 5.0);
    assert_eq!(a.midpoint(&b), pos(1.5, 2.0));
}

#[test]
fn test_screen_pos_sentinel_is_invalid() {
    assert!(!ScreenPos::NONE.is_valid());
    assert!(!pos(f32::NAN, 10.0).is_valid());
    assert!(pos(0.0, 0.0).is_valid());
    assert!(pos(400.0, 300.0).is_valid());
}

// ── Action codes ─────────────────────────────────────────────

#[test]
fn test_action_codes_roundtrip() {
    for code in 0..=5 {
        let action = TouchAction::from_code(code).unwrap();
        assert_eq!(action as i32, code);
    }
    assert_eq!(TouchAction::from_code(6), None);
    assert_eq!(TouchAction::from_code(-1), None);
}

// ── Single-finger synthesis ──────────────────────────────────

#[test]
fn test_single_finger_lifecycle() {
    let mut tracker = TouchTracker::new();

    let down = feed(
        &mut tracker,
        &[
            TouchEvent::TrackingId(7),
            TouchEvent::PositionX(100.0),
            TouchEvent::PositionY(150.0),
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(
        down,
        vec![PointerEvent {
            action: TouchAction::Pointer1Down,
            pos1: pos(100.0, 150.0),
            pos2: ScreenPos::NONE,
        }]
    );

    let moved = feed(
        &mut tracker,
        &[TouchEvent::PositionX(110.0), TouchEvent::SynReport],
    );
    assert_eq!(
        moved,
        vec![PointerEvent {
            action: TouchAction::Move,
            pos1: pos(110.0, 150.0),
            pos2: ScreenPos::NONE,
        }]
    );

    let up = feed(&mut tracker, &[TouchEvent::FingerUp, TouchEvent::SynReport]);
    assert_eq!(
        up,
        vec![PointerEvent {
            action: TouchAction::Pointer1Up,
            pos1: pos(110.0, 150.0),
            pos2: ScreenPos::NONE,
        }]
    );
}

#[test]
fn test_quiet_report_emits_nothing() {
    let mut tracker = TouchTracker::new();
    assert!(feed(&mut tracker, &[TouchEvent::SynReport]).is_empty());
}

// ── Two-finger synthesis ─────────────────────────────────────

fn press_two_fingers(tracker: &mut TouchTracker) {
    feed(
        tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::TrackingId(1),
            TouchEvent::PositionX(100.0),
            TouchEvent::PositionY(100.0),
            TouchEvent::SynReport,
        ],
    );
    feed(
        tracker,
        &[
            TouchEvent::Slot(1),
            TouchEvent::TrackingId(2),
            TouchEvent::PositionX(200.0),
            TouchEvent::PositionY(220.0),
            TouchEvent::SynReport,
        ],
    );
}

#[test]
fn test_second_finger_down_carries_both_positions() {
    let mut tracker = TouchTracker::new();

    feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::TrackingId(1),
            TouchEvent::PositionX(100.0),
            TouchEvent::PositionY(100.0),
            TouchEvent::SynReport,
        ],
    );
    let second = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(1),
            TouchEvent::TrackingId(2),
            TouchEvent::PositionX(200.0),
            TouchEvent::PositionY(220.0),
            TouchEvent::SynReport,
        ],
    );

    assert_eq!(
        second,
        vec![PointerEvent {
            action: TouchAction::Pointer2Down,
            pos1: pos(100.0, 100.0),
            pos2: pos(200.0, 220.0),
        }]
    );
}

#[test]
fn test_dual_move_reports_both_positions() {
    let mut tracker = TouchTracker::new();
    press_two_fingers(&mut tracker);

    let moved = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::PositionX(110.0),
            TouchEvent::Slot(1),
            TouchEvent::PositionX(210.0),
            TouchEvent::SynReport,
        ],
    );

    assert_eq!(
        moved,
        vec![PointerEvent {
            action: TouchAction::Move,
            pos1: pos(110.0, 100.0),
            pos2: pos(210.0, 220.0),
        }]
    );
}

#[test]
fn test_second_finger_up() {
    let mut tracker = TouchTracker::new();
    press_two_fingers(&mut tracker);

    let up = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(1),
            TouchEvent::FingerUp,
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(
        up,
        vec![PointerEvent {
            action: TouchAction::Pointer2Up,
            pos1: pos(100.0, 100.0),
            pos2: pos(200.0, 220.0),
        }]
    );

    // The first finger keeps reporting as pointer 1.
    let moved = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::PositionX(130.0),
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(moved[0].action, TouchAction::Move);
    assert_eq!(moved[0].pos1, pos(130.0, 100.0));
    assert_eq!(moved[0].pos2, ScreenPos::NONE);
}

#[test]
fn test_first_finger_up_promotes_second() {
    let mut tracker = TouchTracker::new();
    press_two_fingers(&mut tracker);

    let up = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::FingerUp,
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(
        up,
        vec![PointerEvent {
            action: TouchAction::Pointer1Up,
            pos1: pos(100.0, 100.0),
            pos2: pos(200.0, 220.0),
        }]
    );

    // The surviving touch now drives pointer 1.
    let moved = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(1),
            TouchEvent::PositionX(230.0),
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(
        moved,
        vec![PointerEvent {
            action: TouchAction::Move,
            pos1: pos(230.0, 220.0),
            pos2: ScreenPos::NONE,
        }]
    );

    let final_up = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(1),
            TouchEvent::FingerUp,
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(
        final_up,
        vec![PointerEvent {
            action: TouchAction::Pointer1Up,
            pos1: pos(230.0, 220.0),
            pos2: ScreenPos::NONE,
        }]
    );
}

#[test]
fn test_simultaneous_release_orders_pointer2_first() {
    let mut tracker = TouchTracker::new();
    press_two_fingers(&mut tracker);

    let ups = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::FingerUp,
            TouchEvent::Slot(1),
            TouchEvent::FingerUp,
            TouchEvent::SynReport,
        ],
    );

    assert_eq!(ups.len(), 2);
    assert_eq!(ups[0].action, TouchAction::Pointer2Up);
    assert_eq!(ups[1].action, TouchAction::Pointer1Up);
    assert_eq!(ups[1].pos2, ScreenPos::NONE);
}

#[test]
fn test_third_finger_is_ignored() {
    let mut tracker = TouchTracker::new();

    let actions = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::TrackingId(1),
            TouchEvent::PositionX(100.0),
            TouchEvent::PositionY(100.0),
            TouchEvent::Slot(1),
            TouchEvent::TrackingId(2),
            TouchEvent::PositionX(200.0),
            TouchEvent::PositionY(200.0),
            TouchEvent::Slot(2),
            TouchEvent::TrackingId(3),
            TouchEvent::PositionX(300.0),
            TouchEvent::PositionY(300.0),
            TouchEvent::SynReport,
        ],
    );

    let kinds: Vec<TouchAction> = actions.iter().map(|a| a.action).collect();
    assert_eq!(kinds, vec![TouchAction::Pointer1Down, TouchAction::Pointer2Down]);
}

#[test]
fn test_reset_forgets_touches() {
    let mut tracker = TouchTracker::new();
    press_two_fingers(&mut tracker);

    tracker.reset();

    let down = feed(
        &mut tracker,
        &[
            TouchEvent::Slot(0),
            TouchEvent::TrackingId(9),
            TouchEvent::PositionX(50.0),
            TouchEvent::PositionY(60.0),
            TouchEvent::SynReport,
        ],
    );
    assert_eq!(down.len(), 1);
    assert_eq!(down[0].action, TouchAction::Pointer1Down);
    assert_eq!(down[0].pos1, pos(50.0, 60.0));
}

// ── USB ID parsing ───────────────────────────────────────────

#[test]
fn test_parse_usb_id_formats() {
    assert_eq!(parse_usb_id("1234:5678"), Some((0x1234, 0x5678)));
    assert_eq!(parse_usb_id("USB:abcd:0001"), Some((0xabcd, 0x0001)));
    assert_eq!(parse_usb_id("ABCD:EF01"), Some((0xabcd, 0xef01)));
}

#[test]
fn test_parse_usb_id_rejects_garbage() {
    assert_eq!(parse_usb_id("nope"), None);
    assert_eq!(parse_usb_id("12:zz"), None);
    assert_eq!(parse_usb_id(""), None);
}
