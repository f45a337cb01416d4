//! Retry decisions for failed fetches.
//!
//! This module classifies failures (retryable status codes and transport
//! failure kinds), keeps per-request attempt bookkeeping in request meta, and
//! builds the requeued request, so that a request pipeline only has to call
//! [`RetryPolicy::process_response`] and [`RetryPolicy::process_exception`].

mod classify;
mod error;
mod ledger;
mod policy;
mod reschedule;

pub use classify::{response_status_message, status_reason_phrase, FailureClassifier};
pub use error::{
    classify_curl_error, classify_io_error, FailureKind, FetchError, UnknownFailureKind,
};
pub use ledger::RetryLedger;
pub use policy::{
    ResponseAction, RetryPolicy, RetryReason, RetrySettings, DEFAULT_RETRY_FAILURES,
    DEFAULT_RETRY_HTTP_CODES,
};
pub use reschedule::RequestRescheduler;
