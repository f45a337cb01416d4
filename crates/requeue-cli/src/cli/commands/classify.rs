//! `requeue classify` – would this status or failure be retried?

use anyhow::{Context, Result};
use requeue_core::config::RequeueConfig;
use requeue_core::retry::{response_status_message, FailureClassifier, FailureKind};

pub fn run_classify(cfg: &RequeueConfig, status: Option<u16>, error: Option<&str>) -> Result<()> {
    let Some(settings) = cfg.retry.resolve()? else {
        println!("retries disabled: nothing is retried");
        return Ok(());
    };
    let classifier = FailureClassifier::new(
        settings.retryable_status_codes,
        settings.retryable_failures,
    );

    if let Some(code) = status {
        println!("{}", describe_status(&classifier, code));
    }
    if let Some(name) = error {
        let kind: FailureKind = name
            .parse()
            .with_context(|| format!("known kinds: {}", known_kinds()))?;
        println!("{}", describe_failure(&classifier, kind));
    }
    Ok(())
}

fn verdict(retryable: bool) -> &'static str {
    if retryable {
        "retryable"
    } else {
        "not retried"
    }
}

fn describe_status(classifier: &FailureClassifier, status: u16) -> String {
    format!(
        "{}: {}",
        response_status_message(status),
        verdict(classifier.classify_response(status))
    )
}

fn describe_failure(classifier: &FailureClassifier, kind: FailureKind) -> String {
    let chain: Vec<_> = kind.ancestors().map(FailureKind::short_name).collect();
    format!(
        "{} ({}): {}",
        kind,
        chain.join(" < "),
        verdict(classifier.classify_kind(kind))
    )
}

fn known_kinds() -> String {
    FailureKind::ALL
        .iter()
        .map(|k| k.short_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FailureClassifier {
        FailureClassifier::new([503], [FailureKind::Connect])
    }

    #[test]
    fn status_lines() {
        assert_eq!(
            describe_status(&classifier(), 503),
            "503 Service Unavailable: retryable"
        );
        assert_eq!(describe_status(&classifier(), 404), "404 Not Found: not retried");
    }

    #[test]
    fn failure_line_shows_ancestry() {
        assert_eq!(
            describe_failure(&classifier(), FailureKind::ConnectionRefused),
            "requeue::net::ConnectionRefused (ConnectionRefused < Connect): retryable"
        );
        assert_eq!(
            describe_failure(&classifier(), FailureKind::Tls),
            "requeue::net::Tls (Tls): not retried"
        );
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = run_classify(&RequeueConfig::default(), None, Some("Gremlins")).unwrap_err();
        assert!(format!("{err:#}").contains("Gremlins"));
    }
}
