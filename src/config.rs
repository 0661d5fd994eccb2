//! Configuration types for grab-dispatch

use crate::error::{Error, Result};
use crate::types::{ProviderId, Protocol};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Dispatch behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base backoff handed to the indexer tracker for retryable failures without a
    /// usable `Retry-After` hint (default: 60 seconds)
    #[serde(default = "default_indexer_backoff", with = "duration_serde")]
    pub default_indexer_backoff: Duration,

    /// Capacity of the grab event broadcast channel (default: 1000)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_indexer_backoff: default_indexer_backoff(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Escalation policy shared by the indexer and download client status stores
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Disable window per escalation level, in seconds. Level 0 is "healthy".
    #[serde(default = "default_escalation_periods")]
    pub escalation_periods: Vec<u64>,

    /// Failures inside this window after the first failure do not escalate (default: 0)
    #[serde(default, with = "duration_serde")]
    pub minimum_time_since_initial_failure: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            escalation_periods: default_escalation_periods(),
            minimum_time_since_initial_failure: Duration::ZERO,
        }
    }
}

impl StatusConfig {
    /// Disable window for an escalation level, clamped to the last table entry
    pub fn period(&self, level: usize) -> Duration {
        let secs = self
            .escalation_periods
            .get(level)
            .or_else(|| self.escalation_periods.last())
            .copied()
            .unwrap_or(0);
        Duration::from_secs(secs)
    }

    /// Highest escalation level the table describes
    pub fn max_level(&self) -> usize {
        self.escalation_periods.len().saturating_sub(1)
    }
}

/// Configured identity of a download client
///
/// Definitions come from configuration management; backends attach to them at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDefinition {
    /// Provider id used for status tracking
    pub id: ProviderId,
    /// Display name
    pub name: String,
    /// Protocol the client serves
    pub protocol: Protocol,
    /// Whether the user has the client enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dispatch behavior
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Status store escalation policy
    #[serde(default)]
    pub status: StatusConfig,

    /// Configured download clients, in registration order
    #[serde(default)]
    pub clients: Vec<ClientDefinition>,
}

impl Config {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.default_indexer_backoff.is_zero() {
            return Err(Error::Config {
                message: "default indexer backoff must be greater than zero".into(),
                key: Some("dispatch.default_indexer_backoff".into()),
            });
        }

        if self.dispatch.event_capacity == 0 {
            return Err(Error::Config {
                message: "event capacity must be greater than zero".into(),
                key: Some("dispatch.event_capacity".into()),
            });
        }

        if self.status.escalation_periods.len() < 2 {
            return Err(Error::Config {
                message: "escalation periods need level 0 and at least one backoff level".into(),
                key: Some("status.escalation_periods".into()),
            });
        }

        let mut seen = HashSet::new();
        for client in &self.clients {
            if !seen.insert(client.id) {
                return Err(Error::Config {
                    message: format!("duplicate download client id {}", client.id),
                    key: Some("clients".into()),
                });
            }
        }

        Ok(())
    }
}

fn default_indexer_backoff() -> Duration {
    Duration::from_secs(60)
}

fn default_event_capacity() -> usize {
    1000
}

fn default_escalation_periods() -> Vec<u64> {
    vec![
        0,
        60,
        5 * 60,
        15 * 60,
        30 * 60,
        60 * 60,
        3 * 60 * 60,
        6 * 60 * 60,
        12 * 60 * 60,
        24 * 60 * 60,
    ]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
