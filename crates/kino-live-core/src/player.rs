//! Capability surfaces consumed by the analytics tracker
//!
//! The media engine and the hosting page are black boxes. The tracker only
//! needs event subscription, a position query and an unload notification,
//! so a fake implementation is enough to drive it in tests.

use crate::types::PlayerEvent;
use std::sync::Arc;

/// Callback invoked when a subscribed event fires
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Handle to a live media player
pub trait PlayerHandle: Send + Sync + 'static {
    /// Subscribe to the next occurrence of `event` only
    fn once(&self, event: PlayerEvent, handler: EventHandler);

    /// Subscribe to every occurrence of `event`
    fn on(&self, event: PlayerEvent, handler: EventHandler);

    /// Current playback position in seconds, if known
    fn current_time(&self) -> Option<f64>;
}

/// Identifier of a registered unload listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Page lifecycle signals
pub trait PageLifecycle: Send + Sync + 'static {
    /// Register a handler for the "about to unload" notification
    fn on_unload(&self, handler: EventHandler) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Lifecycle that never unloads (headless and CLI embedders)
#[derive(Debug, Default)]
pub struct NoPageLifecycle;

impl PageLifecycle for NoPageLifecycle {
    fn on_unload(&self, _handler: EventHandler) -> ListenerId {
        ListenerId(0)
    }

    fn remove_listener(&self, _id: ListenerId) {}
}
