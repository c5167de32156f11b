//! Real-time hub configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Tuning for the connection hub
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Seconds between keepalive pings sent to each connection
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    /// Capacity of the shared outgoing queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum chat message length, in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl HubConfig {
    /// Get keepalive interval as Duration
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// Validate hub configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keepalive_interval_secs == 0 {
            return Err(ValidationError::ZeroHubSetting("keepalive_interval_secs"));
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::ZeroHubSetting("queue_capacity"));
        }
        if self.max_message_length == 0 {
            return Err(ValidationError::ZeroHubSetting("max_message_length"));
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: default_keepalive_interval(),
            queue_capacity: default_queue_capacity(),
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_keepalive_interval() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_message_length() -> usize {
    4000
}
