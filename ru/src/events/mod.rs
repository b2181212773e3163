//! Change notification
//!
//! The merge engine publishes a [`ReaderEvent`] through an injected
//! [`ChangeNotifier`] each time a category's persisted state changes.
//! [`EventBus`] is the broadcast-channel implementation; observers subscribe
//! to it.
//!
//! ```rust,ignore
//! let bus = create_event_bus();
//! let mut rx = bus.subscribe();
//! // hand `bus.clone()` to the coordinator as its notifier
//! while let Ok(event) = rx.recv().await {
//!     println!("{}", event);
//! }
//! ```

mod bus;
mod types;

pub use bus::{ChangeNotifier, DEFAULT_CHANNEL_CAPACITY, EventBus, create_event_bus};
pub use types::ReaderEvent;
