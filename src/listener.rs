//! Application-level listeners that may observe or suppress gestures.
//!
//! Hosts register listeners from any thread; the engine dispatches them
//! synchronously on its own thread. Both the holder swap and the callback
//! run under the holder mutex, so a swap never races an in-flight
//! dispatch. Listeners must not call back into the engine.

use std::sync::{Arc, Mutex};

use strum::{Display, EnumString, IntoStaticStr};

/// Kinds of click gesture the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ClickKind {
    /// Press and release within the tap thresholds.
    #[strum(serialize = "single")]
    Single,
    /// Press held past the long-press timeout without moving.
    #[strum(serialize = "long")]
    Long,
    /// Two fast consecutive taps.
    #[strum(serialize = "double")]
    Double,
    /// Two simultaneous taps.
    #[strum(serialize = "dual")]
    Dual,
}

/// Observes click gestures. Returning `true` consumes the click and
/// suppresses the engine's default behavior (e.g. the double-click zoom).
pub trait MapClickListener: Send + Sync {
    fn on_map_click(&self, kind: ClickKind, x: f32, y: f32) -> bool;
}

/// Observes the start of a continuous interaction. Returning `true`
/// consumes the whole gesture: every subsequent `Move` is ignored until
/// the next pointer-down.
pub trait MapInteractionListener: Send + Sync {
    fn on_map_interaction(
        &self,
        panning: bool,
        zooming: bool,
        rotating: bool,
        tilting: bool,
    ) -> bool;
}

/// Mutex-guarded holders for both listener kinds.
#[derive(Default)]
pub struct ListenerBroker {
    click: Mutex<Option<Arc<dyn MapClickListener>>>,
    interaction: Mutex<Option<Arc<dyn MapInteractionListener>>>,
}

impl ListenerBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_click_listener(&self, listener: Option<Arc<dyn MapClickListener>>) {
        if let Ok(mut holder) = self.click.lock() {
            *holder = listener;
        }
    }

    pub fn set_interaction_listener(&self, listener: Option<Arc<dyn MapInteractionListener>>) {
        if let Ok(mut holder) = self.interaction.lock() {
            *holder = listener;
        }
    }

    /// Dispatch a click; returns the listener's consume flag, `false` when
    /// no listener is registered.
    pub fn dispatch_click(&self, kind: ClickKind, x: f32, y: f32) -> bool {
        match self.click.lock() {
            Ok(holder) => match holder.as_ref() {
                Some(listener) => listener.on_map_click(kind, x, y),
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Dispatch an interaction start; returns the listener's consume flag,
    /// `false` when no listener is registered.
    pub fn dispatch_interaction(
        &self,
        panning: bool,
        zooming: bool,
        rotating: bool,
        tilting: bool,
    ) -> bool {
        match self.interaction.lock() {
            Ok(holder) => match holder.as_ref() {
                Some(listener) => {
                    listener.on_map_interaction(panning, zooming, rotating, tilting)
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}
