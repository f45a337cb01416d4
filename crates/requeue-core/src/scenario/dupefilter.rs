use std::collections::HashSet;

use crate::request::Request;

/// Drops requests whose fingerprint was already scheduled, unless the
/// request sets `dont_filter`.
#[derive(Debug, Default)]
pub struct SeenFilter {
    seen: HashSet<String>,
}

impl SeenFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `request` should be scheduled. Records its fingerprint either way.
    pub fn admit(&mut self, request: &Request) -> bool {
        let fresh = self.seen.insert(request.fingerprint());
        fresh || request.dont_filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(s: &str) -> Request {
        Request::get(Url::parse(s).unwrap())
    }

    #[test]
    fn second_identical_request_is_dropped() {
        let mut f = SeenFilter::new();
        assert!(f.admit(&get("https://example.com/a")));
        assert!(!f.admit(&get("https://example.com/a")));
        assert!(f.admit(&get("https://example.com/b")));
        assert!(!f.admit(&get("https://example.com/b")));
    }

    #[test]
    fn dont_filter_always_passes() {
        let mut f = SeenFilter::new();
        let mut req = get("https://example.com/a");
        assert!(f.admit(&req));
        req.dont_filter = true;
        assert!(f.admit(&req));
        assert!(f.admit(&req));
    }
}
