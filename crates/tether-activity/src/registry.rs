//! Registry of connectors feeding the activity log
//!
//! The [`SubscriptionRegistry`] remembers which handler it installed on each
//! connector so that it can remove exactly that handler later. A connector is
//! attached at most once; repeated attach and detach calls are no-ops.
//!
//! Connector code never runs while a map shard is locked. Attach reserves the
//! slot first, registers the handler unlocked, then fills in the handler id.
//! A handler that fires during registration may therefore call back into the
//! registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tether_core::{ActivityEvent, ActivityHandler, Connector, ConnectorId, HandlerId};
use tracing::debug;

/// Callback the registry installs on every attached connector
pub type IngestFn = Arc<dyn Fn(&ActivityEvent) + Send + Sync>;

/// Handler installed on one connector
struct Attachment {
    /// Handler id returned by the connector; `None` while registration runs
    handler: Option<HandlerId>,
    /// Cleared on detach so that late emissions are ignored
    live: Arc<AtomicBool>,
    /// Set for connectors handed over by `Arc`, so they can be detached on drop
    owner: Option<Weak<dyn Connector>>,
}

/// Tracks attached connectors and their installed handlers
pub struct SubscriptionRegistry {
    /// Attachments indexed by connector
    attached: DashMap<ConnectorId, Attachment>,
    /// Where attached connectors' events go
    ingest: IngestFn,
}

impl SubscriptionRegistry {
    /// Create a registry that forwards connector events to `ingest`
    pub fn new(ingest: IngestFn) -> Self {
        Self {
            attached: DashMap::new(),
            ingest,
        }
    }

    /// Install the ingestion handler on a connector
    ///
    /// Returns `false` without touching the connector if it is already
    /// attached.
    pub fn attach<C: Connector + ?Sized>(&self, connector: &C) -> bool {
        self.attach_with_owner(connector, None)
    }

    /// Install the ingestion handler on a shared connector
    ///
    /// Unlike [`attach`](Self::attach), the registry keeps a weak reference so
    /// that the handler is removed again when the registry is dropped.
    pub fn attach_shared(&self, connector: &Arc<dyn Connector>) -> bool {
        self.attach_with_owner(&**connector, Some(Arc::downgrade(connector)))
    }

    fn attach_with_owner<C: Connector + ?Sized>(
        &self,
        connector: &C,
        owner: Option<Weak<dyn Connector>>,
    ) -> bool {
        let id = connector.id();
        let live = Arc::new(AtomicBool::new(true));

        // Reserve the slot; the entry guard must be gone before the connector runs.
        match self.attached.entry(id) {
            Entry::Occupied(_) => {
                debug!(connector = %id, name = connector.name(), "Connector already attached");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(Attachment {
                    handler: None,
                    live: Arc::clone(&live),
                    owner,
                });
            }
        }

        let flag = Arc::clone(&live);
        let ingest = Arc::clone(&self.ingest);
        let handler: ActivityHandler = Arc::new(move |event: &ActivityEvent| {
            if flag.load(Ordering::Acquire) {
                ingest(event);
            }
        });
        let handler = connector.add_activity_handler(handler);

        let claimed = match self.attached.get_mut(&id) {
            Some(mut attachment) if Arc::ptr_eq(&attachment.live, &live) => {
                attachment.handler = Some(handler);
                true
            }
            _ => false,
        };

        if !claimed {
            // Detached while the handler was being registered
            connector.remove_activity_handler(handler);
            debug!(connector = %id, %handler, "Connector detached during attach");
            return true;
        }

        debug!(connector = %id, name = connector.name(), %handler, "Connector attached");
        true
    }

    /// Remove the ingestion handler from a connector
    ///
    /// Returns `false` if the connector was not attached.
    pub fn detach<C: Connector + ?Sized>(&self, connector: &C) -> bool {
        let id = connector.id();
        let Some((_, attachment)) = self.attached.remove(&id) else {
            debug!(connector = %id, name = connector.name(), "Connector not attached");
            return false;
        };

        attachment.live.store(false, Ordering::Release);
        // A pending attach removes its own handler once it sees the slot gone
        if let Some(handler) = attachment.handler
            && !connector.remove_activity_handler(handler)
        {
            debug!(
                connector = %id,
                %handler,
                "Connector had already dropped its handler"
            );
        }
        debug!(connector = %id, name = connector.name(), "Connector detached");
        true
    }

    /// Check whether a connector is attached
    pub fn is_attached(&self, id: &ConnectorId) -> bool {
        self.attached.contains_key(id)
    }

    /// Ids of all attached connectors
    pub fn attached(&self) -> Vec<ConnectorId> {
        self.attached.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of attached connectors
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    /// True if no connectors are attached
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl Drop for SubscriptionRegistry {
    /// Silence every installed handler and remove the ones it still can reach
    ///
    /// Connectors attached by reference keep an inert handler until they are
    /// dropped; the registry has no way back to them.
    fn drop(&mut self) {
        let mut stranded = 0usize;
        for (id, attachment) in std::mem::take(&mut self.attached) {
            attachment.live.store(false, Ordering::Release);
            let connector = attachment.owner.as_ref().and_then(Weak::upgrade);
            match (connector, attachment.handler) {
                (Some(connector), Some(handler)) => {
                    connector.remove_activity_handler(handler);
                    debug!(connector = %id, %handler, "Connector detached on shutdown");
                }
                (None, _) if attachment.owner.is_some() => {}
                _ => stranded += 1,
            }
        }
        if stranded > 0 {
            debug!(stranded, "Inert handlers left on borrowed connectors");
        }
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("attached", &self.attached.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    use tether_core::SimulatedConnector;

    use super::*;

    fn counting_registry() -> (SubscriptionRegistry, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let registry = SubscriptionRegistry::new(Arc::new(move |_event: &ActivityEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        (registry, count)
    }

    #[test]
    fn test_attach_forwards_events() {
        let (registry, count) = counting_registry();
        let connector = SimulatedConnector::new("feed");

        assert!(registry.attach(&connector));
        connector.record("one");
        connector.record("two");

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(registry.is_attached(&connector.id()));
    }

    #[test]
    fn test_double_attach_is_noop() {
        let (registry, count) = counting_registry();
        let connector = SimulatedConnector::new("feed");

        assert!(registry.attach(&connector));
        assert!(!registry.attach(&connector));
        assert_eq!(connector.handler_count(), 1);

        connector.record("once");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detach_unattached_is_noop() {
        let (registry, _count) = counting_registry();
        let connector = SimulatedConnector::new("stranger");

        assert!(!registry.detach(&connector));
        assert!(registry.is_empty());
        assert_eq!(connector.handler_count(), 0);
    }

    #[test]
    fn test_attach_then_detach_severs() {
        let (registry, count) = counting_registry();
        let connector = SimulatedConnector::new("feed");

        registry.attach(&connector);
        assert!(registry.detach(&connector));
        assert!(!registry.detach(&connector));

        connector.record("after detach");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(connector.handler_count(), 0);
    }

    #[test]
    fn test_reattach_after_detach() {
        let (registry, count) = counting_registry();
        let connector = SimulatedConnector::new("feed");

        registry.attach(&connector);
        registry.detach(&connector);
        assert!(registry.attach(&connector));

        connector.record("back");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_attach_installs_one_handler() {
        const THREADS: usize = 16;

        let (registry, count) = counting_registry();
        let registry = Arc::new(registry);
        let connector = Arc::new(SimulatedConnector::new("contended"));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let connector = Arc::clone(&connector);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.attach(&*connector)
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|attached| *attached)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(connector.handler_count(), 1);
        connector.record("single");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_removes_shared_handlers_and_silences_borrowed() {
        let (registry, count) = counting_registry();
        let shared = Arc::new(SimulatedConnector::new("shared"));
        let as_dyn: Arc<dyn Connector> = Arc::clone(&shared) as Arc<dyn Connector>;
        let borrowed = SimulatedConnector::new("borrowed");

        assert!(registry.attach_shared(&as_dyn));
        assert!(!registry.attach(&*shared));
        assert!(registry.attach(&borrowed));
        drop(registry);

        assert_eq!(shared.handler_count(), 0);

        borrowed.record("ignored");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(borrowed.handler_count(), 1);
    }

    #[test]
    fn test_attached_lists_ids() {
        let (registry, _count) = counting_registry();
        let fleet = SimulatedConnector::fleet("feed", 3);
        for connector in &fleet {
            registry.attach(&**connector);
        }

        let mut attached = registry.attached();
        attached.sort();
        let mut expected: Vec<_> = fleet.iter().map(|c| c.id()).collect();
        expected.sort();
        assert_eq!(attached, expected);
        assert_eq!(registry.len(), 3);
    }
}
