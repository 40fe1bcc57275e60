//! # EventRelay: synchronous fan-out to activity listeners
//!
//! [`EventRelay`] re-broadcasts each recorded event to every subscribed
//! [`ActivityListener`], on the thread that recorded it.
//!
//! ## What it guarantees
//! - The listener list lock is only held long enough to copy it; listeners
//!   run without any relay or store lock held, so they may read the log,
//!   subscribe, or unsubscribe from inside a callback.
//! - Failures are isolated: a listener returning an error or panicking is
//!   logged and counted, and delivery continues with the next listener.
//! - Once `unsubscribe` returns, deliveries that start afterwards skip the
//!   listener.
//!
//! ## What it does **not** guarantee
//! - Delivery already in flight when a listener is removed may still reach it
//!   once.
//! - No retries; a failed delivery is not repeated.
//!
//! ## Diagram
//! ```text
//!    notify(&event)
//!        │   (copy listener list, release lock)
//!        ├──► L1.on_activity() ── Err / panic ──► warn!, faults += 1
//!        ├──► L2.on_activity()
//!        └──► LN.on_activity()
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tether_core::{ActivityEvent, ListenerError, ListenerResult};
use tracing::{debug, warn};

/// Receiver of recorded activity
pub trait ActivityListener: Send + Sync {
    /// Called once for every recorded event
    fn on_activity(&self, event: &ActivityEvent) -> ListenerResult;

    /// Name used in fault logs
    fn name(&self) -> &str {
        "activity-listener"
    }
}

/// Adapter turning an infallible closure into an [`ActivityListener`]
struct FnListener<F> {
    name: String,
    f: F,
}

impl<F> ActivityListener for FnListener<F>
where
    F: Fn(&ActivityEvent) + Send + Sync,
{
    fn on_activity(&self, event: &ActivityEvent) -> ListenerResult {
        (self.f)(event);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Identity of one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct ListenerEntry {
    id: ListenerId,
    listener: Arc<dyn ActivityListener>,
    active: AtomicBool,
}

type ListenerList = RwLock<Vec<Arc<ListenerEntry>>>;

fn remove_entry(listeners: &ListenerList, id: ListenerId) -> bool {
    let mut list = listeners.write();
    match list.iter().position(|entry| entry.id == id) {
        Some(index) => {
            let entry = list.remove(index);
            entry.active.store(false, Ordering::Release);
            debug!(listener = entry.listener.name(), listener_id = %id, "Listener unsubscribed");
            true
        }
        None => false,
    }
}

/// Fan-out of recorded events to external listeners
pub struct EventRelay {
    listeners: Arc<ListenerList>,
    next_id: AtomicU64,
    faults: AtomicU64,
}

impl EventRelay {
    /// Create a relay with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
            faults: AtomicU64::new(0),
        }
    }

    /// Subscribe a listener
    ///
    /// The listener stays subscribed until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: Arc<dyn ActivityListener>) -> Subscription {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(listener = listener.name(), listener_id = %id, "Listener subscribed");

        self.listeners.write().push(Arc::new(ListenerEntry {
            id,
            listener,
            active: AtomicBool::new(true),
        }));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
            armed: true,
        }
    }

    /// Subscribe an infallible closure under a name
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, f: F) -> Subscription
    where
        F: Fn(&ActivityEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnListener {
            name: name.into(),
            f,
        }))
    }

    /// Remove a listener by id
    ///
    /// Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        remove_entry(&self.listeners, id)
    }

    /// Deliver an event to every active listener
    ///
    /// Returns the number of listeners that accepted the event.
    pub fn notify(&self, event: &ActivityEvent) -> usize {
        let entries: Vec<Arc<ListenerEntry>> = self.listeners.read().clone();

        let mut delivered = 0;
        for entry in &entries {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }

            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| entry.listener.on_activity(event)));
            let error = match outcome {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(payload) => ListenerError::from_panic(payload.as_ref()),
            };

            self.faults.fetch_add(1, Ordering::Relaxed);
            warn!(
                listener = entry.listener.name(),
                listener_id = %entry.id,
                connector = %event.connector(),
                error = %error,
                "Activity listener failed"
            );
        }
        delivered
    }

    /// Number of subscribed listeners
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// True if there are no listeners
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Number of listener failures caught so far
    pub fn listener_faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a listener registration; unsubscribes on drop
pub struct Subscription {
    id: ListenerId,
    listeners: Weak<ListenerList>,
    armed: bool,
}

impl Subscription {
    /// Id of the registration
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unsubscribe now
    ///
    /// Returns `false` if the listener was already removed or the relay is gone.
    pub fn unsubscribe(mut self) -> bool {
        self.armed = false;
        self.listeners
            .upgrade()
            .is_some_and(|listeners| remove_entry(&listeners, self.id))
    }

    /// Keep the listener subscribed after this handle is dropped
    ///
    /// The listener can still be removed with [`EventRelay::unsubscribe`].
    pub fn keep(mut self) -> ListenerId {
        self.armed = false;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(listeners) = self.listeners.upgrade() {
            remove_entry(&listeners, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .finish()
    }
}
