//! Simulated connector for testing
//!
//! Provides an in-memory connector that records activity on demand, so the
//! activity log can be exercised without real network connections.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tether_core::{Connector, SimulatedConnector};
//!
//! let feeds = SimulatedConnector::fleet("feed", 4);
//! for feed in &feeds {
//!     feed.open_connection("10.0.0.5:30003");
//!     feed.record("Received 120 bytes");
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::connector::{ActivityHandler, Connector};
use crate::emitter::ActivityEmitter;
use crate::event::ActivityEvent;
use crate::identity::{ConnectorId, HandlerId};

/// A connector that emits activity when told to
pub struct SimulatedConnector {
    /// Our identity
    id: ConnectorId,
    /// Display name
    name: String,
    /// Registered activity handlers
    emitter: ActivityEmitter,
    /// Number of events emitted so far
    emitted: AtomicU64,
}

impl SimulatedConnector {
    /// Create a new simulated connector with a fresh identity
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ConnectorId::new(), name)
    }

    /// Create a simulated connector with a specific identity
    pub fn with_id(id: ConnectorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            emitter: ActivityEmitter::new(),
            emitted: AtomicU64::new(0),
        }
    }

    /// Create `count` connectors named `{prefix}-0`, `{prefix}-1`, ...
    pub fn fleet(prefix: &str, count: usize) -> Vec<Arc<SimulatedConnector>> {
        (0..count)
            .map(|i| Arc::new(Self::new(format!("{}-{}", prefix, i))))
            .collect()
    }

    /// Emit a prepared event to every registered handler
    ///
    /// Returns the number of handlers that saw the event.
    pub fn emit(&self, event: ActivityEvent) -> usize {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        self.emitter.emit(&event)
    }

    /// Emit an informational message
    pub fn record(&self, message: impl Into<String>) -> usize {
        self.emit(ActivityEvent::message(self.id, self.name.clone(), message))
    }

    /// Emit an error with detail
    pub fn record_error(&self, message: impl Into<String>, error: impl Into<String>) -> usize {
        self.emit(ActivityEvent::error(self.id, self.name.clone(), message, error))
    }

    /// Emit a connection-established event
    pub fn open_connection(&self, connection_id: impl Into<String>) -> usize {
        self.emit(ActivityEvent::connected(self.id, self.name.clone(), connection_id))
    }

    /// Emit a connection-closed event
    pub fn close_connection(&self, connection_id: impl Into<String>) -> usize {
        self.emit(ActivityEvent::disconnected(self.id, self.name.clone(), connection_id))
    }

    /// Number of events emitted, whether or not anyone was listening
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.emitter.len()
    }
}

impl Connector for SimulatedConnector {
    fn id(&self) -> ConnectorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn add_activity_handler(&self, handler: ActivityHandler) -> HandlerId {
        self.emitter.add(handler)
    }

    fn remove_activity_handler(&self, id: HandlerId) -> bool {
        self.emitter.remove(id)
    }
}

impl std::fmt::Debug for SimulatedConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedConnector")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("handlers", &self.emitter.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::event::ActivityKind;

    #[test]
    fn test_simulated_connector_emits_to_handler() {
        let connector = SimulatedConnector::new("feed");
        let seen: Arc<Mutex<Vec<ActivityEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        connector.add_activity_handler(Arc::new(move |event: &ActivityEvent| {
            sink.lock().push(event.clone());
        }));

        connector.open_connection("s1");
        connector.record("payload");
        connector.record_error("read failed", "timeout");
        connector.close_connection("s1");

        let seen = seen.lock();
        let kinds: Vec<_> = seen.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::Connected,
                ActivityKind::Message,
                ActivityKind::Error,
                ActivityKind::Disconnected
            ]
        );
        assert!(seen.iter().all(|e| e.connector() == connector.id()));
        assert!(seen.iter().all(|e| e.connector_name() == "feed"));
    }

    #[test]
    fn test_emit_without_handlers_is_counted() {
        let connector = SimulatedConnector::new("idle");
        assert_eq!(connector.record("nobody listening"), 0);
        assert_eq!(connector.emitted(), 1);
    }

    #[test]
    fn test_fleet_names_and_ids() {
        let fleet = SimulatedConnector::fleet("feed", 3);
        assert_eq!(fleet.len(), 3);
        assert_eq!(fleet[2].name(), "feed-2");
        assert_ne!(fleet[0].id(), fleet[1].id());
    }

    #[test]
    fn test_arc_connector_forwards() {
        let connector: Arc<dyn Connector> = Arc::new(SimulatedConnector::new("shared"));
        let id = connector.add_activity_handler(Arc::new(|_event: &ActivityEvent| {}));
        assert!(connector.remove_activity_handler(id));
        assert_eq!(connector.name(), "shared");
    }
}
