//! Configuration for the activity log

use serde::{Deserialize, Serialize};

use crate::error::{ActivityError, ActivityResult};

/// Default number of events retained in the history
pub const DEFAULT_CAPACITY: usize = 250;

/// Activity log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLogConfig {
    /// Maximum number of events retained; older events are evicted first
    pub capacity: usize,
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ActivityLogConfig {
    /// Create a config with the default capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> ActivityResult<()> {
        if self.capacity == 0 {
            return Err(ActivityError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> ActivityResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ActivityLogConfig::default();
        assert_eq!(config.capacity, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ActivityLogConfig::new().with_capacity(0);
        assert!(matches!(config.validate(), Err(ActivityError::InvalidCapacity(0))));
    }

    #[test]
    fn test_from_json() {
        let config = ActivityLogConfig::from_json_str(r#"{"capacity": 16}"#).unwrap();
        assert_eq!(config.capacity, 16);

        let config = ActivityLogConfig::from_json_str("{}").unwrap();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            ActivityLogConfig::from_json_str(r#"{"capacity": 0}"#),
            Err(ActivityError::InvalidCapacity(0))
        ));
        assert!(matches!(
            ActivityLogConfig::from_json_str(r#"{"capacity": -3}"#),
            Err(ActivityError::Config(_))
        ));
        assert!(matches!(
            ActivityLogConfig::from_json_str("not json"),
            Err(ActivityError::Config(_))
        ));
    }
}
