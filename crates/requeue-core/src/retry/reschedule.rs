//! Build the requeued copy of a failed request.

use super::ledger::RetryLedger;
use crate::request::Request;

/// Produces retried requests: a structural copy with the attempt count
/// recorded, duplicate filtering bypassed and priority shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRescheduler {
    priority_adjust: i32,
}

impl RequestRescheduler {
    pub fn new(priority_adjust: i32) -> Self {
        Self { priority_adjust }
    }

    /// Copy `request` for its `attempts`-th retry. Priority saturates at
    /// the `i32` bounds.
    pub fn reschedule(&self, request: &Request, attempts: u32) -> Request {
        let mut retry = request.clone();
        RetryLedger::record_attempts(&mut retry.meta, attempts);
        retry.dont_filter = true;
        retry.priority = request.priority.saturating_add(self.priority_adjust);
        retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::meta::RETRY_TIMES;
    use serde_json::json;
    use url::Url;

    fn request() -> Request {
        Request::get(Url::parse("https://example.com/page").unwrap())
            .with_priority(10)
            .with_meta("depth", 3)
    }

    #[test]
    fn copy_keeps_everything_but_retry_fields() {
        let original = request();
        let retry = RequestRescheduler::new(-1).reschedule(&original, 1);

        assert_eq!(retry.url, original.url);
        assert_eq!(retry.method, original.method);
        assert_eq!(retry.body, original.body);
        assert_eq!(retry.meta.get("depth"), Some(&json!(3)));
        assert_eq!(retry.meta.get_count(RETRY_TIMES), Some(1));
        assert!(retry.dont_filter);
        assert_eq!(retry.priority, 9);
        // Original is untouched.
        assert!(!original.dont_filter);
        assert!(!original.meta.contains_key(RETRY_TIMES));
    }

    #[test]
    fn adjust_may_be_zero_or_positive() {
        let original = request();
        assert_eq!(RequestRescheduler::new(0).reschedule(&original, 1).priority, 10);
        assert_eq!(RequestRescheduler::new(5).reschedule(&original, 1).priority, 15);
    }

    #[test]
    fn meta_entries_do_not_change_the_adjustment() {
        let original = request().with_meta("priority_adjust", 100);
        let retry = RequestRescheduler::new(-1).reschedule(&original, 2);
        assert_eq!(retry.priority, 9);
        assert_eq!(retry.meta.get("priority_adjust"), Some(&json!(100)));
    }

    #[test]
    fn priority_saturates_instead_of_overflowing() {
        let original = request().with_priority(i32::MIN + 1);
        let retry = RequestRescheduler::new(-5).reschedule(&original, 1);
        assert_eq!(retry.priority, i32::MIN);
    }
}
