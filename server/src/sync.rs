use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::model::{UserId, UserList};
use crate::twitter::error::TwitterError;

/// The add/remove calls needed to bring the remote list in line with the
/// local membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_add: BTreeSet<UserId>,
    pub to_remove: BTreeSet<UserId>,
}

impl MembershipDiff {
    /// Compare a list's live membership against its snapshot.
    pub fn of(list: &UserList) -> Self {
        Self {
            to_add: list
                .member_ids
                .difference(list.snapshot())
                .copied()
                .collect(),
            to_remove: list
                .snapshot()
                .difference(&list.member_ids)
                .copied()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Retry policy for list membership writes. The default makes a single
/// attempt.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Whether a failed attempt (1-based) should be followed by another one.
    pub fn should_retry(&self, attempt: u32, error: &TwitterError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }

    /// Backoff before the attempt following `attempt`: doubles each time,
    /// capped at `max_delay_ms`. A server-provided delay wins.
    pub fn delay_after(&self, attempt: u32, error: &TwitterError) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after.min(Duration::from_millis(self.max_delay_ms));
        }
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}
