//! Activity log facade
//!
//! [`ActivityLog`] ties the history store, connector registry, and listener
//! relay together. It is created once at startup and shared by `Arc` with
//! every connector owner and every consumer.

use std::sync::{Arc, Weak};

use tether_core::{ActivityEvent, Connector, ConnectorId};
use tracing::{info, trace};

use crate::config::ActivityLogConfig;
use crate::error::ActivityResult;
use crate::registry::SubscriptionRegistry;
use crate::relay::{ActivityListener, EventRelay, ListenerId, Subscription};
use crate::store::{ActivityFilter, HistoryStats, HistoryStore};

/// Store and relay shared with every installed connector handler
struct LogCore {
    store: HistoryStore,
    relay: EventRelay,
}

impl LogCore {
    fn record(&self, event: &ActivityEvent) {
        let evicted = self.store.append(event.clone());
        trace!(
            connector = %event.connector(),
            kind = %event.kind(),
            evicted,
            "Activity recorded"
        );
        self.relay.notify(event);
    }
}

/// Bounded, thread-safe log of connector activity
pub struct ActivityLog {
    core: Arc<LogCore>,
    registry: SubscriptionRegistry,
}

impl ActivityLog {
    /// Create an activity log from a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidCapacity`](crate::ActivityError::InvalidCapacity)
    /// if the configured capacity is zero.
    pub fn new(config: ActivityLogConfig) -> ActivityResult<Arc<Self>> {
        config.validate()?;
        let store = HistoryStore::new(config.capacity)?;
        info!(capacity = config.capacity, "Activity log created");
        Ok(Self::from_store(store))
    }

    /// Create an activity log with the default capacity
    pub fn with_defaults() -> Arc<Self> {
        Self::from_store(HistoryStore::default())
    }

    fn from_store(store: HistoryStore) -> Arc<Self> {
        let core = Arc::new(LogCore {
            store,
            relay: EventRelay::new(),
        });

        // Connectors may outlive the log; their handlers then drop events.
        let weak: Weak<LogCore> = Arc::downgrade(&core);
        let registry = SubscriptionRegistry::new(Arc::new(move |event: &ActivityEvent| {
            if let Some(core) = weak.upgrade() {
                core.record(event);
            }
        }));

        Arc::new(Self { core, registry })
    }

    /// Start recording a connector's activity
    ///
    /// Returns `false` if the connector was already being recorded. If the log
    /// is dropped without detaching, the connector keeps an inert handler
    /// until it is dropped itself; use [`track`](Self::track) when the log
    /// may go first.
    pub fn record_connector_created<C: Connector + ?Sized>(&self, connector: &C) -> bool {
        self.registry.attach(connector)
    }

    /// Stop recording a connector's activity
    ///
    /// Safe to call for connectors that were never recorded; returns `false`
    /// in that case.
    pub fn record_connector_destroyed<C: Connector + ?Sized>(&self, connector: &C) -> bool {
        self.registry.detach(connector)
    }

    /// Record a connector and stop recording it when the guard drops
    pub fn track<C: Connector + 'static>(self: &Arc<Self>, connector: Arc<C>) -> ConnectorGuard {
        let connector: Arc<dyn Connector> = connector;
        self.registry.attach_shared(&connector);
        ConnectorGuard {
            log: Arc::downgrade(self),
            connector: Some(connector),
        }
    }

    /// Record an event directly, as an attached connector would
    pub fn record(&self, event: ActivityEvent) {
        self.core.record(&event);
    }

    /// Copy of the retained history, oldest first
    pub fn activity_history(&self) -> Vec<ActivityEvent> {
        self.core.store.snapshot()
    }

    /// Copy of the most recent `count` events, oldest first
    pub fn latest(&self, count: usize) -> Vec<ActivityEvent> {
        self.core.store.latest(count)
    }

    /// Copy of the retained events matching a filter, oldest first
    pub fn query(&self, filter: &ActivityFilter) -> Vec<ActivityEvent> {
        self.core.store.query(filter)
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.core.store.capacity()
    }

    /// History counters
    pub fn stats(&self) -> HistoryStats {
        self.core.store.stats()
    }

    /// Subscribe to every event recorded from now on
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: Arc<dyn ActivityListener>) -> Subscription {
        self.core.relay.subscribe(listener)
    }

    /// Subscribe a closure to every event recorded from now on
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, f: F) -> Subscription
    where
        F: Fn(&ActivityEvent) + Send + Sync + 'static,
    {
        self.core.relay.subscribe_fn(name, f)
    }

    /// Remove a listener kept with [`Subscription::keep`]
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.core.relay.unsubscribe(id)
    }

    /// Ids of connectors currently being recorded
    pub fn attached_connectors(&self) -> Vec<ConnectorId> {
        self.registry.attached()
    }

    /// Check whether a connector is being recorded
    pub fn is_attached(&self, id: &ConnectorId) -> bool {
        self.registry.is_attached(id)
    }

    /// Number of subscribed listeners
    pub fn listener_count(&self) -> usize {
        self.core.relay.len()
    }

    /// Number of listener failures caught so far
    pub fn listener_faults(&self) -> u64 {
        self.core.relay.listener_faults()
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("stats", &self.stats())
            .field("connectors", &self.registry.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Detaches a tracked connector from the log when dropped
pub struct ConnectorGuard {
    log: Weak<ActivityLog>,
    connector: Option<Arc<dyn Connector>>,
}

impl ConnectorGuard {
    /// The tracked connector
    pub fn connector(&self) -> Option<&Arc<dyn Connector>> {
        self.connector.as_ref()
    }

    /// Detach now
    ///
    /// Returns `false` if the connector was already detached or the log is gone.
    pub fn release(mut self) -> bool {
        self.detach()
    }

    fn detach(&mut self) -> bool {
        match (self.connector.take(), self.log.upgrade()) {
            (Some(connector), Some(log)) => log.record_connector_destroyed(&*connector),
            _ => false,
        }
    }
}

impl Drop for ConnectorGuard {
    fn drop(&mut self) {
        self.detach();
    }
}
