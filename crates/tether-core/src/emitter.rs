//! Reusable handler list for connector implementations

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::connector::ActivityHandler;
use crate::event::ActivityEvent;
use crate::identity::HandlerId;

/// Handler list a connector embeds to offer the [`Connector`](crate::Connector)
/// capability
///
/// Handlers are invoked outside the internal lock, so a handler may add or
/// remove handlers on the same emitter without deadlocking.
pub struct ActivityEmitter {
    handlers: RwLock<Vec<(HandlerId, ActivityHandler)>>,
    next_id: AtomicU64,
}

impl ActivityEmitter {
    /// Create an emitter with no handlers
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler
    pub fn add(&self, handler: ActivityHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        id
    }

    /// Remove a handler, returning `false` if it was not registered
    pub fn remove(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }

    /// Invoke every registered handler with the event
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &ActivityEvent) -> usize {
        let handlers: Vec<ActivityHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// True if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl Default for ActivityEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActivityEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityEmitter")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::identity::ConnectorId;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> ActivityHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_event: &ActivityEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_all_handlers() {
        let emitter = ActivityEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        emitter.add(counting_handler(&counter));
        emitter.add(counting_handler(&counter));

        let event = ActivityEvent::message(ConnectorId::new(), "c", "hi");
        assert_eq!(emitter.emit(&event), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_handler() {
        let emitter = ActivityEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = emitter.add(counting_handler(&counter));

        assert!(emitter.remove(id));
        assert!(!emitter.remove(id));
        assert!(emitter.is_empty());

        emitter.emit(&ActivityEvent::message(ConnectorId::new(), "c", "hi"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_can_remove_itself() {
        let emitter = Arc::new(ActivityEmitter::new());
        let slot: Arc<parking_lot::Mutex<Option<HandlerId>>> =
            Arc::new(parking_lot::Mutex::new(None));

        let weak = Arc::downgrade(&emitter);
        let slot_clone = Arc::clone(&slot);
        let id = emitter.add(Arc::new(move |_event: &ActivityEvent| {
            if let (Some(emitter), Some(id)) = (weak.upgrade(), *slot_clone.lock()) {
                emitter.remove(id);
            }
        }));
        *slot.lock() = Some(id);

        emitter.emit(&ActivityEvent::message(ConnectorId::new(), "c", "hi"));
        assert!(emitter.is_empty());
    }
}
