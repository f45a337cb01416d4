//! Transport failure types for retry classification.

use std::fmt;
use std::str::FromStr;

const TYPE_PREFIX: &str = "requeue::net::";

/// Type of a transport-level fetch failure.
///
/// Kinds form a small hierarchy (see [`FailureKind::parent`]): a policy that
/// retries `Connect` also retries `ConnectionRefused` and `ConnectTimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// The fetch did not complete within its deadline.
    Timeout,
    /// Generic I/O failure below the protocol layer.
    Io,
    /// Host name could not be resolved.
    Dns,
    /// Connection could not be established.
    Connect,
    ConnectionRefused,
    /// TCP connect timed out (distinct from an overall fetch timeout).
    ConnectTimedOut,
    /// An established connection was closed.
    ConnectionClosed,
    /// Connection dropped uncleanly (reset, broken pipe).
    ConnectionLost,
    /// Peer closed the connection cleanly before a full response arrived.
    ConnectionDone,
    /// Response started but could not be read to completion.
    ResponseFailed,
    /// Proxy tunnel could not be set up.
    Tunnel,
    Tls,
    /// Request itself is malformed (bad URL, unsupported scheme).
    InvalidRequest,
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 14] = [
        FailureKind::Timeout,
        FailureKind::Io,
        FailureKind::Dns,
        FailureKind::Connect,
        FailureKind::ConnectionRefused,
        FailureKind::ConnectTimedOut,
        FailureKind::ConnectionClosed,
        FailureKind::ConnectionLost,
        FailureKind::ConnectionDone,
        FailureKind::ResponseFailed,
        FailureKind::Tunnel,
        FailureKind::Tls,
        FailureKind::InvalidRequest,
        FailureKind::Other,
    ];

    /// The more general kind this one specialises, if any.
    pub fn parent(self) -> Option<FailureKind> {
        match self {
            FailureKind::Dns => Some(FailureKind::Io),
            FailureKind::ConnectionRefused | FailureKind::ConnectTimedOut => {
                Some(FailureKind::Connect)
            }
            FailureKind::ConnectionLost | FailureKind::ConnectionDone => {
                Some(FailureKind::ConnectionClosed)
            }
            _ => None,
        }
    }

    /// This kind followed by each of its ancestors.
    pub fn ancestors(self) -> impl Iterator<Item = FailureKind> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// True if `self` is `other` or a specialisation of it.
    pub fn is_a(self, other: FailureKind) -> bool {
        self.ancestors().any(|k| k == other)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            FailureKind::Timeout => "Timeout",
            FailureKind::Io => "Io",
            FailureKind::Dns => "Dns",
            FailureKind::Connect => "Connect",
            FailureKind::ConnectionRefused => "ConnectionRefused",
            FailureKind::ConnectTimedOut => "ConnectTimedOut",
            FailureKind::ConnectionClosed => "ConnectionClosed",
            FailureKind::ConnectionLost => "ConnectionLost",
            FailureKind::ConnectionDone => "ConnectionDone",
            FailureKind::ResponseFailed => "ResponseFailed",
            FailureKind::Tunnel => "Tunnel",
            FailureKind::Tls => "Tls",
            FailureKind::InvalidRequest => "InvalidRequest",
            FailureKind::Other => "Other",
        }
    }

    /// Fully-qualified name, e.g. `requeue::net::ConnectionRefused`.
    ///
    /// Used as the reason in retry counters, so it must stay stable.
    pub fn type_name(self) -> String {
        format!("{TYPE_PREFIX}{}", self.short_name())
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TYPE_PREFIX}{}", self.short_name())
    }
}

/// A failure-kind name that matched nothing in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown failure kind {0:?}")]
pub struct UnknownFailureKind(pub String);

impl FromStr for FailureKind {
    type Err = UnknownFailureKind;

    /// Accepts the short name (`Dns`) or the fully-qualified one
    /// (`requeue::net::Dns`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let short = trimmed.strip_prefix(TYPE_PREFIX).unwrap_or(trimmed);
        FailureKind::ALL
            .into_iter()
            .find(|k| k.short_name() == short)
            .ok_or_else(|| UnknownFailureKind(s.to_string()))
    }
}

/// A transport-level failure raised while fetching a request.
#[derive(Debug)]
pub struct FetchError {
    kind: FailureKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(kind: FailureKind, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Map a curl transfer error onto the failure taxonomy.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return FailureKind::Dns;
    }
    if e.is_couldnt_connect() {
        return FailureKind::Connect;
    }
    if e.is_got_nothing() {
        return FailureKind::ConnectionDone;
    }
    if e.is_recv_error() || e.is_send_error() || e.is_read_error() {
        return FailureKind::ConnectionLost;
    }
    if e.is_partial_file() {
        return FailureKind::ResponseFailed;
    }
    if e.is_ssl_connect_error() || e.is_peer_failed_verification() || e.is_ssl_certproblem() {
        return FailureKind::Tls;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return FailureKind::InvalidRequest;
    }
    FailureKind::Other
}

/// Map a socket-level I/O error onto the failure taxonomy.
pub fn classify_io_error(e: &std::io::Error) -> FailureKind {
    use std::io::ErrorKind as Io;
    match e.kind() {
        Io::TimedOut => FailureKind::Timeout,
        Io::ConnectionRefused => FailureKind::ConnectionRefused,
        Io::ConnectionReset | Io::ConnectionAborted | Io::BrokenPipe => FailureKind::ConnectionLost,
        Io::UnexpectedEof => FailureKind::ConnectionDone,
        Io::NotConnected | Io::AddrNotAvailable => FailureKind::Connect,
        Io::InvalidInput => FailureKind::InvalidRequest,
        _ => FailureKind::Io,
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        let kind = classify_curl_error(&e);
        FetchError::with_source(kind, e)
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        let kind = classify_io_error(&e);
        FetchError::with_source(kind, e)
    }
}
