//! Error types for Tether

use thiserror::Error;

/// Errors related to connector identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid connector identity: {0}")]
    InvalidFormat(String),
}

/// Failure reported by an activity listener
///
/// Listeners either return this directly or panic; the relay converts a
/// caught panic into [`ListenerError::Panicked`] before logging it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    /// Build a [`ListenerError::Panicked`] from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(msg)
    }
}

impl From<String> for ListenerError {
    fn from(msg: String) -> Self {
        Self::Failed(msg)
    }
}

impl From<&str> for ListenerError {
    fn from(msg: &str) -> Self {
        Self::Failed(msg.to_string())
    }
}

/// Result type returned by activity listeners
pub type ListenerResult = Result<(), ListenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_display() {
        let err = IdentityError::InvalidFormat("bad data".to_string());
        assert!(format!("{}", err).contains("Invalid connector identity"));
        assert!(format!("{}", err).contains("bad data"));
    }

    #[test]
    fn test_listener_error_from_str() {
        let err: ListenerError = "boom".into();
        assert_eq!(err, ListenerError::Failed("boom".to_string()));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_listener_error_from_panic_payload() {
        let payload = std::panic::catch_unwind::<_, ()>(|| panic!("static message")).unwrap_err();
        let err = ListenerError::from_panic(payload.as_ref());
        assert_eq!(err, ListenerError::Panicked("static message".to_string()));

        let payload =
            std::panic::catch_unwind::<_, ()>(|| panic!("formatted {}", 42)).unwrap_err();
        let err = ListenerError::from_panic(payload.as_ref());
        assert_eq!(err, ListenerError::Panicked("formatted 42".to_string()));
    }
}
