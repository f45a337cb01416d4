//! Classify response statuses and transport failures as retryable or terminal.

use std::collections::HashSet;

use super::error::{FailureKind, FetchError};

/// Decides whether an observed failure is worth another attempt.
///
/// Holds only immutable sets, so a single classifier can be shared across
/// threads without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureClassifier {
    status_codes: HashSet<u16>,
    failure_kinds: HashSet<FailureKind>,
}

impl FailureClassifier {
    pub fn new(
        status_codes: impl IntoIterator<Item = u16>,
        failure_kinds: impl IntoIterator<Item = FailureKind>,
    ) -> Self {
        Self {
            status_codes: status_codes.into_iter().collect(),
            failure_kinds: failure_kinds.into_iter().collect(),
        }
    }

    /// True if `status` is one of the retryable status codes.
    pub fn classify_response(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// True if the failure's kind, or any kind it specialises, is retryable.
    pub fn classify_exception(&self, error: &FetchError) -> bool {
        self.classify_kind(error.kind())
    }

    pub fn classify_kind(&self, kind: FailureKind) -> bool {
        kind.ancestors().any(|k| self.failure_kinds.contains(&k))
    }

    pub fn status_codes(&self) -> &HashSet<u16> {
        &self.status_codes
    }

    pub fn failure_kinds(&self) -> &HashSet<FailureKind> {
        &self.failure_kinds
    }
}

/// Reason text for a status code, e.g. `"503 Service Unavailable"`.
pub fn response_status_message(status: u16) -> String {
    format!(
        "{} {}",
        status,
        status_reason_phrase(status).unwrap_or("Unknown Status")
    )
}

/// Registered reason phrase for an HTTP status code.
pub fn status_reason_phrase(status: u16) -> Option<&'static str> {
    let phrase = match status {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Content Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Content",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        // Cloudflare origin errors; common enough in crawling to name.
        520 => "Unknown Error",
        521 => "Web Server Is Down",
        522 => "Connection Timed Out",
        523 => "Origin Is Unreachable",
        524 => "A Timeout Occurred",
        _ => return None,
    };
    Some(phrase)
}
