//! Connector context for log scopes
//!
//! This module provides thread-local storage for the connector a thread is
//! working on behalf of, and enters a `connector` span so every log entry in
//! the scope carries the connector's identity.

use std::cell::RefCell;

use tether_core::{Connector, ConnectorId};
use tracing::span::EnteredSpan;

/// Connector context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorContextData {
    /// The connector's identity
    pub connector_id: ConnectorId,
    /// The connector's display name
    pub connector_name: String,
}

thread_local! {
    static CONNECTOR_CONTEXT: RefCell<Option<ConnectorContextData>> = const { RefCell::new(None) };
}

/// Build the span used for a connector's log scope
pub fn connector_span<C: Connector + ?Sized>(connector: &C) -> tracing::Span {
    tracing::info_span!(
        "connector",
        connector_id = %connector.id().short_id(),
        connector_name = connector.name()
    )
}

/// RAII guard for connector context
///
/// When this guard is created, it sets the connector context for the current
/// thread and enters the connector's span. When it's dropped, it restores the
/// previous context (if any) and exits the span.
///
/// # Example
///
/// ```ignore
/// use tether_core::SimulatedConnector;
/// use tether_logging::context::ConnectorContextGuard;
///
/// let feed = SimulatedConnector::new("feed-1");
/// let _guard = ConnectorContextGuard::new(&feed);
///
/// // All tracing events in this scope carry connector_name = "feed-1"
/// tracing::info!("Polling feed");
/// ```
pub struct ConnectorContextGuard {
    previous: Option<ConnectorContextData>,
    _span: EnteredSpan,
}

impl ConnectorContextGuard {
    /// Create a new connector context guard
    pub fn new<C: Connector + ?Sized>(connector: &C) -> Self {
        let previous = CONNECTOR_CONTEXT.with(|ctx| ctx.borrow().clone());

        let new_ctx = ConnectorContextData {
            connector_id: connector.id(),
            connector_name: connector.name().to_string(),
        };
        CONNECTOR_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(new_ctx));

        Self {
            previous,
            _span: connector_span(connector).entered(),
        }
    }

    /// Get the current connector context (if any)
    pub fn current() -> Option<ConnectorContextData> {
        CONNECTOR_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current connector ID (if set)
    pub fn current_connector_id() -> Option<ConnectorId> {
        Self::current().map(|ctx| ctx.connector_id)
    }
}

impl Drop for ConnectorContextGuard {
    fn drop(&mut self) {
        CONNECTOR_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to run a block inside a connector context
///
/// # Example
///
/// ```ignore
/// with_connector_context!(&feed, {
///     tracing::info!("Polling feed");
/// });
/// ```
#[macro_export]
macro_rules! with_connector_context {
    ($connector:expr, $body:block) => {{
        let _guard = $crate::context::ConnectorContextGuard::new($connector);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::SimulatedConnector;

    #[test]
    fn test_connector_context_guard() {
        assert!(ConnectorContextGuard::current().is_none());

        let feed = SimulatedConnector::new("feed-a");
        {
            let _guard = ConnectorContextGuard::new(&feed);

            let ctx = ConnectorContextGuard::current().unwrap();
            assert_eq!(ctx.connector_id, feed.id());
            assert_eq!(ctx.connector_name, "feed-a");
        }

        assert!(ConnectorContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        let feed_a = SimulatedConnector::new("a");
        let feed_b = SimulatedConnector::new("b");

        {
            let _guard_a = ConnectorContextGuard::new(&feed_a);
            assert_eq!(ConnectorContextGuard::current_connector_id(), Some(feed_a.id()));

            {
                let _guard_b = ConnectorContextGuard::new(&feed_b);
                assert_eq!(ConnectorContextGuard::current_connector_id(), Some(feed_b.id()));
            }

            assert_eq!(ConnectorContextGuard::current_connector_id(), Some(feed_a.id()));
        }

        assert!(ConnectorContextGuard::current_connector_id().is_none());
    }

    #[test]
    fn test_macro_scopes_context() {
        let feed = SimulatedConnector::new("macro");
        let seen = crate::with_connector_context!(&feed, {
            ConnectorContextGuard::current().map(|ctx| ctx.connector_name)
        });
        assert_eq!(seen.as_deref(), Some("macro"));
        assert!(ConnectorContextGuard::current().is_none());
    }
}
