//! Connector activity events

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::ConnectorId;

/// Coarse classification of an activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivityKind {
    /// Informational message
    #[default]
    Message,
    /// A connection or session was established
    Connected,
    /// A connection or session was closed
    Disconnected,
    /// Something went wrong; the event carries error detail
    Error,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "Message"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// One immutable diagnostic record describing something a connector did
///
/// Events are created by connectors and never mutated afterwards, so fields
/// are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    connector: ConnectorId,
    connector_name: String,
    timestamp: DateTime<Utc>,
    kind: ActivityKind,
    message: String,
    error: Option<String>,
    connection_id: Option<String>,
}

impl ActivityEvent {
    /// Create an informational event stamped with the current time
    pub fn message(
        connector: ConnectorId,
        connector_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            connector_name: connector_name.into(),
            timestamp: Utc::now(),
            kind: ActivityKind::Message,
            message: message.into(),
            error: None,
            connection_id: None,
        }
    }

    /// Create an error event carrying error detail
    pub fn error(
        connector: ConnectorId,
        connector_name: impl Into<String>,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            kind: ActivityKind::Error,
            error: Some(error.into()),
            ..Self::message(connector, connector_name, message)
        }
    }

    /// Create a connection-established event for a session
    pub fn connected(
        connector: ConnectorId,
        connector_name: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        let connection_id = connection_id.into();
        Self {
            kind: ActivityKind::Connected,
            message: format!("Connection {} established", connection_id),
            connection_id: Some(connection_id),
            ..Self::message(connector, connector_name, String::new())
        }
    }

    /// Create a connection-closed event for a session
    pub fn disconnected(
        connector: ConnectorId,
        connector_name: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        let connection_id = connection_id.into();
        Self {
            kind: ActivityKind::Disconnected,
            message: format!("Connection {} closed", connection_id),
            connection_id: Some(connection_id),
            ..Self::message(connector, connector_name, String::new())
        }
    }

    /// Attach a connection/session identifier
    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Identity of the connector that produced this event
    pub fn connector(&self) -> ConnectorId {
        self.connector
    }

    /// Display name of the connector that produced this event
    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    /// When the event occurred
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Event classification
    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    /// Human-readable message
    pub fn message_text(&self) -> &str {
        &self.message
    }

    /// Error detail, if any
    pub fn error_detail(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Connection or session identifier, if any
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// True if the event carries error detail
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp.to_rfc3339(),
            self.connector_name,
            self.kind,
            self.message
        )?;
        if let Some(ref error) = self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event() {
        let id = ConnectorId::new();
        let event = ActivityEvent::message(id, "feed-1", "Hello");
        assert_eq!(event.connector(), id);
        assert_eq!(event.connector_name(), "feed-1");
        assert_eq!(event.kind(), ActivityKind::Message);
        assert_eq!(event.message_text(), "Hello");
        assert!(!event.is_error());
        assert!(event.connection_id().is_none());
    }

    #[test]
    fn test_error_event() {
        let event =
            ActivityEvent::error(ConnectorId::new(), "feed-1", "Read failed", "reset by peer");
        assert_eq!(event.kind(), ActivityKind::Error);
        assert_eq!(event.error_detail(), Some("reset by peer"));
        assert!(event.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_connection_events() {
        let id = ConnectorId::new();
        let opened = ActivityEvent::connected(id, "listener", "10.0.0.5:30003");
        assert_eq!(opened.kind(), ActivityKind::Connected);
        assert_eq!(opened.connection_id(), Some("10.0.0.5:30003"));
        assert!(opened.message_text().contains("established"));

        let closed = ActivityEvent::disconnected(id, "listener", "10.0.0.5:30003");
        assert_eq!(closed.kind(), ActivityKind::Disconnected);
        assert!(closed.message_text().contains("closed"));
    }

    #[test]
    fn test_json_roundtrip_preserves_envelope() {
        let event =
            ActivityEvent::message(ConnectorId::new(), "feed", "x").with_connection_id("s1");
        let json = serde_json::to_string(&event).unwrap();
        let back: ActivityEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
