use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::classify::{response_status_message, FailureClassifier};
use super::error::{FailureKind, FetchError};
use super::ledger::RetryLedger;
use super::reschedule::RequestRescheduler;
use crate::config::{ConfigError, RetryConfig};
use crate::request::{Request, Response};
use crate::stats::StatsSink;

/// Resolved retry configuration.
///
/// Built once from [`RetryConfig`] (or directly) and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    /// Maximum retries per request, not counting the first attempt.
    pub max_retry_times: u32,
    pub retryable_status_codes: HashSet<u16>,
    pub retryable_failures: HashSet<FailureKind>,
    /// Added to a request's priority on every retry.
    pub priority_adjust: i32,
    /// Prefix for the counters emitted to the stats sink.
    pub stats_base_key: String,
}

/// Status codes retried when configuration doesn't say otherwise.
pub const DEFAULT_RETRY_HTTP_CODES: [u16; 8] = [500, 502, 503, 504, 522, 524, 408, 429];

/// Failure kinds retried when configuration doesn't say otherwise.
pub const DEFAULT_RETRY_FAILURES: [FailureKind; 10] = [
    FailureKind::Timeout,
    FailureKind::Dns,
    FailureKind::ConnectionRefused,
    FailureKind::ConnectionDone,
    FailureKind::Connect,
    FailureKind::ConnectionLost,
    FailureKind::ConnectTimedOut,
    FailureKind::ResponseFailed,
    FailureKind::Io,
    FailureKind::Tunnel,
];

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retry_times: 2,
            retryable_status_codes: DEFAULT_RETRY_HTTP_CODES.into(),
            retryable_failures: DEFAULT_RETRY_FAILURES.into(),
            priority_adjust: -1,
            stats_base_key: "retry".to_string(),
        }
    }
}

/// Why a retry is being considered.
#[derive(Debug, Clone, Copy)]
pub enum RetryReason<'a> {
    /// Response came back with a retryable status code.
    Status(u16),
    /// Fetch failed at the transport layer.
    Failure(&'a FetchError),
    /// Caller-supplied reason, counted verbatim.
    Custom(&'a str),
}

impl RetryReason<'_> {
    /// Reason as used in counter names. Failures render as their type name
    /// so the number of distinct counters stays bounded.
    pub fn stats_key(&self) -> String {
        match self {
            RetryReason::Status(code) => response_status_message(*code),
            RetryReason::Failure(e) => e.kind().type_name(),
            RetryReason::Custom(s) => (*s).to_string(),
        }
    }
}

impl fmt::Display for RetryReason<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::Status(code) => f.write_str(&response_status_message(*code)),
            RetryReason::Failure(e) => write!(f, "{e}"),
            RetryReason::Custom(s) => f.write_str(s),
        }
    }
}

/// What the pipeline should do with a completed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseAction {
    /// Hand the response on unchanged.
    PassThrough(Response),
    /// Drop the response and schedule this request instead.
    Retry(Request),
}

impl ResponseAction {
    pub fn is_retry(&self) -> bool {
        matches!(self, ResponseAction::Retry(_))
    }
}

/// Decides whether failed fetches are requeued, and builds the retried request.
///
/// The pipeline calls [`process_response`](Self::process_response) for every
/// completed fetch and [`process_exception`](Self::process_exception) for
/// every transport failure. All retry state lives in the request's meta, so
/// one policy can serve any number of concurrent requests.
pub struct RetryPolicy {
    max_retry_times: u32,
    classifier: FailureClassifier,
    rescheduler: RequestRescheduler,
    count_key: String,
    max_reached_key: String,
    reason_key_prefix: String,
    stats: Arc<dyn StatsSink>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retry_times", &self.max_retry_times)
            .field("classifier", &self.classifier)
            .field("rescheduler", &self.rescheduler)
            .field("count_key", &self.count_key)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings, stats: Arc<dyn StatsSink>) -> Self {
        let base = settings.stats_base_key;
        Self {
            max_retry_times: settings.max_retry_times,
            classifier: FailureClassifier::new(
                settings.retryable_status_codes,
                settings.retryable_failures,
            ),
            rescheduler: RequestRescheduler::new(settings.priority_adjust),
            count_key: format!("{base}/count"),
            max_reached_key: format!("{base}/max_reached"),
            reason_key_prefix: format!("{base}/reason_count/"),
            stats,
        }
    }

    /// Build a policy from loaded configuration.
    ///
    /// Returns `Ok(None)` when retries are disabled: the policy is then simply
    /// not part of the pipeline.
    pub fn from_config(
        config: &RetryConfig,
        stats: Arc<dyn StatsSink>,
    ) -> Result<Option<Self>, ConfigError> {
        Ok(config.resolve()?.map(|settings| Self::new(settings, stats)))
    }

    /// Decide what to do with a completed response.
    ///
    /// `dont_retry` in the request meta wins over everything. A retryable
    /// status whose retry budget is spent falls back to passing the original
    /// response through.
    pub fn process_response(&self, request: &Request, response: Response) -> ResponseAction {
        if RetryLedger::from_meta(&request.meta).dont_retry {
            return ResponseAction::PassThrough(response);
        }
        if !self.classifier.classify_response(response.status) {
            return ResponseAction::PassThrough(response);
        }
        match self.retry_request(request, RetryReason::Status(response.status)) {
            Some(retry) => ResponseAction::Retry(retry),
            None => ResponseAction::PassThrough(response),
        }
    }

    /// Decide what to do with a transport failure.
    ///
    /// Returns `None` when the failure is not retryable, the request opted
    /// out, or the budget is spent; the caller then propagates the error.
    pub fn process_exception(&self, request: &Request, error: &FetchError) -> Option<Request> {
        if RetryLedger::from_meta(&request.meta).dont_retry {
            return None;
        }
        if !self.classifier.classify_exception(error) {
            return None;
        }
        self.retry_request(request, RetryReason::Failure(error))
    }

    /// Build the next retry of `request`, or `None` once its budget is spent.
    ///
    /// Does not look at `dont_retry` or classify anything, so pipeline
    /// stages can use it to force a retry for reasons of their own.
    pub fn retry_request(&self, request: &Request, reason: RetryReason<'_>) -> Option<Request> {
        let ledger = RetryLedger::from_meta(&request.meta);
        let retries = ledger.next_attempt();

        if ledger.within_budget(self.max_retry_times) {
            tracing::debug!(
                request = %request,
                retries,
                reason = %reason,
                "retrying (failed {retries} times)"
            );
            let retry = self.rescheduler.reschedule(request, retries);
            self.stats.increment(&self.count_key);
            self.stats
                .increment(&format!("{}{}", self.reason_key_prefix, reason.stats_key()));
            Some(retry)
        } else {
            self.stats.increment(&self.max_reached_key);
            tracing::debug!(
                request = %request,
                retries,
                reason = %reason,
                "gave up retrying (failed {retries} times)"
            );
            None
        }
    }
}
