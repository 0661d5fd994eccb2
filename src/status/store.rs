//! Escalating per-key status store.

use crate::config::StatusConfig;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::time::Duration;

/// Availability record for one indexer or download client
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Current escalation level (0 = healthy)
    pub escalation_level: usize,
    /// First failure of the current failure streak
    pub initial_failure: Option<DateTime<Utc>>,
    /// Most recent failure
    pub most_recent_failure: Option<DateTime<Utc>>,
    /// Provider is considered unavailable until this instant
    pub disabled_till: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    /// Whether the provider is inside its disable window at `now`
    pub fn is_disabled_at(&self, now: DateTime<Utc>) -> bool {
        self.disabled_till.is_some_and(|till| till > now)
    }
}

/// Keyed status store with escalating backoff
///
/// Updates for one key are serialized by the map shard holding it; different keys
/// live in different shards and do not contend. There is no store-wide lock.
pub struct StatusStore<K> {
    statuses: DashMap<K, ProviderStatus>,
    policy: StatusConfig,
}

impl<K> StatusStore<K>
where
    K: Copy + Eq + Hash + Display,
{
    /// Create an empty store with the given escalation policy
    pub fn new(policy: StatusConfig) -> Self {
        Self {
            statuses: DashMap::new(),
            policy,
        }
    }

    /// Record a failure now
    pub fn record_failure(&self, key: K, minimum_backoff: Duration) {
        self.record_failure_at(key, minimum_backoff, Utc::now());
    }

    /// Record a failure observed at `now`
    ///
    /// The disable window is the larger of the escalation period and `minimum_backoff`.
    /// Inside the grace window after the first failure only `minimum_backoff` applies.
    pub fn record_failure_at(&self, key: K, minimum_backoff: Duration, now: DateTime<Utc>) {
        let mut entry = self.statuses.entry(key).or_default();
        let status = entry.value_mut();

        let first_failure = status.initial_failure.is_none();
        if first_failure {
            status.initial_failure = Some(now);
            status.escalation_level = 1_usize.min(self.policy.max_level());
        }

        let grace = to_chrono(self.policy.minimum_time_since_initial_failure);
        let in_grace_period = status
            .initial_failure
            .is_some_and(|initial| initial.checked_add_signed(grace).is_none_or(|end| end > now));

        if !first_failure && !in_grace_period {
            status.escalation_level = (status.escalation_level + 1).min(self.policy.max_level());
        }

        status.most_recent_failure = Some(now);

        let window = if in_grace_period {
            minimum_backoff
        } else {
            self.policy
                .period(status.escalation_level)
                .max(minimum_backoff)
        };

        if !window.is_zero() {
            let till = now
                .checked_add_signed(to_chrono(window))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            status.disabled_till = Some(status.disabled_till.map_or(till, |t| t.max(till)));
        }

        tracing::debug!(
            key = %key,
            escalation_level = status.escalation_level,
            window_secs = window.as_secs(),
            disabled_till = ?status.disabled_till,
            "Recorded provider failure"
        );
    }

    /// Record a success, stepping escalation down one level and clearing the window
    pub fn record_success(&self, key: K) {
        if let Some(mut entry) = self.statuses.get_mut(&key) {
            let status = entry.value_mut();
            if status.escalation_level == 0 && status.disabled_till.is_none() {
                return;
            }

            status.escalation_level = status.escalation_level.saturating_sub(1);
            status.disabled_till = None;
            if status.escalation_level == 0 {
                status.initial_failure = None;
            }

            tracing::debug!(
                key = %key,
                escalation_level = status.escalation_level,
                "Recorded provider success"
            );
        }
    }

    /// Keys inside their disable window right now
    pub fn blocked(&self) -> HashSet<K> {
        self.blocked_at(Utc::now())
    }

    /// Keys inside their disable window at `now`
    pub fn blocked_at(&self, now: DateTime<Utc>) -> HashSet<K> {
        self.statuses
            .iter()
            .filter(|entry| entry.value().is_disabled_at(now))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Snapshot of one key's status
    pub fn status(&self, key: K) -> Option<ProviderStatus> {
        self.statuses.get(&key).map(|entry| entry.value().clone())
    }

    /// Forget a key (e.g. the provider was deleted from configuration)
    pub fn remove(&self, key: K) {
        self.statuses.remove(&key);
    }
}

impl<K> Default for StatusStore<K>
where
    K: Copy + Eq + Hash + Display,
{
    fn default() -> Self {
        Self::new(StatusConfig::default())
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
