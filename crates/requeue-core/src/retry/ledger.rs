//! Per-request retry bookkeeping read from request meta.

use crate::request::meta::{DONT_RETRY, MAX_RETRY_TIMES, RETRY_TIMES};
use crate::request::Meta;

/// Snapshot of the retry-related state a request carries in its meta.
///
/// The ledger is never stored separately; it is rebuilt from meta on every
/// decision, and only [`RequestRescheduler`](super::RequestRescheduler)
/// writes the attempt count back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryLedger {
    /// Retries already performed.
    pub retry_times: u32,
    /// Per-request replacement for the policy maximum. Signed: any value
    /// below 1 means the request is never retried.
    pub max_retry_times: Option<i64>,
    pub dont_retry: bool,
}

impl RetryLedger {
    pub fn from_meta(meta: &Meta) -> Self {
        Self {
            retry_times: meta.get_count(RETRY_TIMES).unwrap_or(0),
            max_retry_times: meta.get_limit(MAX_RETRY_TIMES),
            dont_retry: meta.get_flag(DONT_RETRY),
        }
    }

    /// 1-based number of the retry being decided on now.
    pub fn next_attempt(&self) -> u32 {
        self.retry_times.saturating_add(1)
    }

    /// The request's own maximum if set, otherwise `policy_max`.
    pub fn effective_max(&self, policy_max: u32) -> i64 {
        self.max_retry_times.unwrap_or(i64::from(policy_max))
    }

    /// Whether the attempt from [`next_attempt`](Self::next_attempt) fits
    /// within the effective maximum.
    pub fn within_budget(&self, policy_max: u32) -> bool {
        i64::from(self.next_attempt()) <= self.effective_max(policy_max)
    }

    /// Record `attempts` as the retry count in `meta`.
    pub fn record_attempts(meta: &mut Meta, attempts: u32) {
        meta.insert(RETRY_TIMES, attempts);
    }
}
