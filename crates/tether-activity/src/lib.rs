//! # Tether Activity
//!
//! Bounded, thread-safe log of connector activity.
//!
//! Connectors report what they are doing as [`ActivityEvent`]s. The
//! [`ActivityLog`] keeps the most recent events in a capped history and
//! re-broadcasts each one to any number of listeners.
//!
//! ## Core Components
//!
//! - [`HistoryStore`]: fixed-capacity history with FIFO eviction
//! - [`SubscriptionRegistry`]: which connectors feed the log, and the handler
//!   installed on each
//! - [`EventRelay`]: synchronous, failure-isolated fan-out to listeners
//! - [`ActivityLog`]: facade composing the three
//!
//! ## Recording Path
//!
//! ```text
//! connector ──► handler ──► HistoryStore::append ──► EventRelay::notify ──► listeners
//!                             (under store lock)       (no lock held)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_activity::{ActivityLog, ActivityLogConfig};
//! use tether_core::SimulatedConnector;
//!
//! let log = ActivityLog::new(ActivityLogConfig::default())?;
//!
//! let _sub = log.subscribe_fn("console", |event| println!("{}", event));
//!
//! let feed = Arc::new(SimulatedConnector::new("feed-1"));
//! let guard = log.track(Arc::clone(&feed));
//! feed.open_connection("10.0.0.5:30003");
//!
//! for event in log.activity_history() {
//!     println!("{}", event);
//! }
//! drop(guard);
//! ```

pub mod config;
pub mod error;
pub mod log;
pub mod registry;
pub mod relay;
pub mod store;

// Re-exports
pub use config::{ActivityLogConfig, DEFAULT_CAPACITY};
pub use error::{ActivityError, ActivityResult};
pub use log::{ActivityLog, ConnectorGuard};
pub use registry::{IngestFn, SubscriptionRegistry};
pub use relay::{ActivityListener, EventRelay, ListenerId, Subscription};
pub use store::{ActivityFilter, HistoryStats, HistoryStore};

// Re-export core types for convenience
pub use tether_core::{
    ActivityEvent, ActivityHandler, ActivityKind, Connector, ConnectorId, ListenerError,
    ListenerResult,
};
