//! Scripted fetch scenarios for exercising a retry policy end to end.
//!
//! A scenario lists requests together with the outcome each successive fetch
//! of that request produces. The [`Simulator`] plays the part of the request
//! pipeline: it schedules by priority, filters duplicates, "fetches" by
//! consuming the next scripted outcome and asks the policy what to do.

mod dupefilter;
mod simulate;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::request::{Meta, Request};
use crate::retry::{FailureKind, UnknownFailureKind};

pub use dupefilter::SeenFilter;
pub use simulate::{RequestOutcome, RequestReport, SimulationReport, Simulator};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("read scenario {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("request #{index}: {source}")]
    UnknownFailure {
        index: usize,
        #[source]
        source: UnknownFailureKind,
    },
}

/// What one fetch of a scripted request produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fetch completed with this status.
    Status(u16),
    /// Fetch failed at the transport layer.
    Failure { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRequest {
    pub request: Request,
    /// Outcomes of successive fetches; once exhausted, fetches return 200.
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    pub requests: Vec<ScriptedRequest>,
}

#[derive(Deserialize)]
struct RawScenario {
    #[serde(default, rename = "request")]
    requests: Vec<RawRequest>,
}

#[derive(Deserialize)]
struct RawRequest {
    url: Url,
    method: Option<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    dont_filter: bool,
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOutcome {
    Status {
        status: u16,
    },
    Failure {
        error: String,
        #[serde(default)]
        message: String,
    },
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> Result<Self, ScenarioError> {
        let raw: RawScenario = toml::from_str(s)?;
        let requests = raw
            .requests
            .into_iter()
            .enumerate()
            .map(|(index, r)| -> Result<ScriptedRequest, ScenarioError> {
                let outcomes = r
                    .outcomes
                    .into_iter()
                    .map(|o| match o {
                        RawOutcome::Status { status } => Ok(Outcome::Status(status)),
                        RawOutcome::Failure { error, message } => error
                            .parse::<FailureKind>()
                            .map(|kind| Outcome::Failure { kind, message })
                            .map_err(|source| ScenarioError::UnknownFailure { index, source }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let mut request = Request::get(r.url);
                if let Some(method) = r.method {
                    request.method = method;
                }
                request.priority = r.priority;
                request.dont_filter = r.dont_filter;
                request.meta = r.meta;
                Ok(ScriptedRequest { request, outcomes })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requests })
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let data = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::meta::MAX_RETRY_TIMES;

    #[test]
    fn parses_requests_and_outcomes() {
        let toml = r#"
            [[request]]
            url = "https://example.com/a"
            priority = 3
            meta = { max_retry_times = 1, tag = "x" }
            outcomes = [
                { status = 503 },
                { error = "ConnectionRefused", message = "refused" },
                { error = "requeue::net::Timeout" },
            ]

            [[request]]
            url = "https://example.com/b"
            method = "POST"
        "#;
        let scenario = Scenario::from_toml_str(toml).unwrap();
        assert_eq!(scenario.requests.len(), 2);

        let a = &scenario.requests[0];
        assert_eq!(a.request.priority, 3);
        assert_eq!(a.request.meta.get_count(MAX_RETRY_TIMES), Some(1));
        assert_eq!(
            a.outcomes,
            vec![
                Outcome::Status(503),
                Outcome::Failure {
                    kind: FailureKind::ConnectionRefused,
                    message: "refused".to_string()
                },
                Outcome::Failure {
                    kind: FailureKind::Timeout,
                    message: String::new()
                },
            ]
        );

        let b = &scenario.requests[1];
        assert_eq!(b.request.method, "POST");
        assert!(b.outcomes.is_empty());
    }

    #[test]
    fn unknown_failure_kind_names_the_request() {
        let toml = r#"
            [[request]]
            url = "https://example.com/"
            outcomes = [{ error = "Cosmic" }]
        "#;
        let err = Scenario::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownFailure { index: 0, .. }));
        assert!(err.to_string().contains("Cosmic"));
    }

    #[test]
    fn bad_url_is_a_parse_error() {
        let toml = r#"
            [[request]]
            url = "not a url"
        "#;
        assert!(matches!(
            Scenario::from_toml_str(toml),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn empty_file_is_empty_scenario() {
        assert_eq!(Scenario::from_toml_str("").unwrap(), Scenario::default());
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Scenario::load(&path).unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
