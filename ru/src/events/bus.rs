//! Event Bus - broadcast implementation of the change notifier
//!
//! The EventBus uses a tokio broadcast channel so any number of observers
//! (UI, loggers, the CLI) can react to reader changes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::ReaderEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Fire-and-forget sink for reader change events
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: ReaderEvent);
}

/// Central event bus for reader change notifications
pub struct EventBus {
    tx: broadcast::Sender<ReaderEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no subscribers the event is dropped.
    pub fn emit(&self, event: ReaderEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl ChangeNotifier for EventBus {
    fn notify(&self, event: ReaderEvent) {
        self.emit(event);
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
