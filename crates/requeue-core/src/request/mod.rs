//! Requests and responses as seen by the retry engine.
//!
//! The surrounding pipeline owns these values; the retry engine only reads
//! them and produces modified copies of requests.

mod fingerprint;
pub mod meta;

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

pub use meta::Meta;

fn default_method() -> String {
    "GET".to_string()
}

/// A fetch to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub url: Url,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub body: Vec<u8>,
    /// Scheduling priority; higher values are fetched sooner.
    #[serde(default)]
    pub priority: i32,
    /// Skip downstream duplicate filtering for this request.
    #[serde(default)]
    pub dont_filter: bool,
    #[serde(default)]
    pub meta: Meta,
}

impl Request {
    /// A `GET` request with default priority and empty meta.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: default_method(),
            body: Vec::new(),
            priority: 0,
            dont_filter: false,
            meta: Meta::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key, value);
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.method, self.url)
    }
}

/// Result of a completed fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub url: Url,
    pub status: u16,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            body: Vec::new(),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.status, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn request_display_shows_method_and_url() {
        let req = Request::get(url("https://example.com/a"));
        assert_eq!(req.to_string(), "<GET https://example.com/a>");
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: Request = serde_json::from_str(r#"{"url": "https://example.com/"}"#).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.priority, 0);
        assert!(!req.dont_filter);
        assert!(req.meta.is_empty());
    }

    #[test]
    fn builder_sets_priority_and_meta() {
        let req = Request::get(url("https://example.com/"))
            .with_priority(5)
            .with_meta(meta::MAX_RETRY_TIMES, 1);
        assert_eq!(req.priority, 5);
        assert_eq!(req.meta.get_count(meta::MAX_RETRY_TIMES), Some(1));
    }
}
