//! Configuration types for the client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout configurations
    pub timeouts: TimeoutConfig,

    /// User agent string
    pub user_agent: Option<String>,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection timeout
    #[serde(with = "duration_serde")]
    pub connect: Duration,

    /// Whole-request timeout, from send to the last byte of the reply
    #[serde(with = "duration_serde")]
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub(crate) fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("postrpc-client/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timeouts_serialize_as_millis() {
        let config = ClientConfig::default().with_request_timeout(Duration::from_millis(1500));
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["timeouts"], json!({"connect": 10_000, "request": 1500}));
        assert_eq!(value["user_agent"], json!(null));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_value(json!({"timeouts": {"request": 250}})).unwrap();

        assert_eq!(config.timeouts.request, Duration::from_millis(250));
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert!(config.user_agent().starts_with("postrpc-client/"));
    }

    #[test]
    fn test_custom_user_agent() {
        let config = ClientConfig::default().with_user_agent("demo/1.0");
        assert_eq!(config.user_agent(), "demo/1.0");
    }
}
