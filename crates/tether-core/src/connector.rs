//! Connector abstraction
//!
//! The [`Connector`] trait is the only part of a network connector that the
//! activity log cares about: a connector can be handed an activity handler,
//! and can later have that handler removed.
//!
//! ## Implementations
//!
//! - [`SimulatedConnector`](crate::SimulatedConnector): in-memory connector for
//!   tests and demos
//! - Real connectors embed an [`ActivityEmitter`](crate::ActivityEmitter) and
//!   forward the two handler methods to it
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_core::{ActivityEvent, Connector, SimulatedConnector};
//!
//! let connector = SimulatedConnector::new("feed-1");
//! let handler_id = connector.add_activity_handler(Arc::new(|event: &ActivityEvent| {
//!     println!("{}", event);
//! }));
//!
//! connector.record("Connected to 10.0.0.5");
//! connector.remove_activity_handler(handler_id);
//! ```

use std::sync::Arc;

use crate::event::ActivityEvent;
use crate::identity::{ConnectorId, HandlerId};

/// Callback invoked by a connector for every activity it records
pub type ActivityHandler = Arc<dyn Fn(&ActivityEvent) + Send + Sync>;

/// Anything that produces activity events
///
/// Implementations must invoke registered handlers for each activity, in
/// the order the activities happened, and must stop invoking a handler for
/// any emission that starts after `remove_activity_handler` returns.
pub trait Connector: Send + Sync {
    /// Identity of this connector
    fn id(&self) -> ConnectorId;

    /// Display name (for logging)
    fn name(&self) -> &str;

    /// Register a handler to be invoked for every activity
    fn add_activity_handler(&self, handler: ActivityHandler) -> HandlerId;

    /// Remove a previously registered handler
    ///
    /// Returns `false` if the handler was not registered.
    fn remove_activity_handler(&self, id: HandlerId) -> bool;
}

impl<C: Connector + ?Sized> Connector for Arc<C> {
    fn id(&self) -> ConnectorId {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn add_activity_handler(&self, handler: ActivityHandler) -> HandlerId {
        (**self).add_activity_handler(handler)
    }

    fn remove_activity_handler(&self, id: HandlerId) -> bool {
        (**self).remove_activity_handler(id)
    }
}
