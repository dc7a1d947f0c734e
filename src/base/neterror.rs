use crate::dns::CandidateEndpoint;
use std::{fmt, io};
use thiserror::Error;

/// Why a single candidate endpoint did not yield a usable connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The local socket for the candidate's family/type/protocol could not be created.
    CannotCreateSocket,
    /// The socket was created but the connect call failed.
    CannotConnect,
    /// The connection was established but post-connect socket options failed.
    CannotConfigure,
}

impl FailureReason {
    /// Stable snake_case identifier, suitable for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::CannotCreateSocket => "cannot_create_socket",
            FailureReason::CannotConnect => "cannot_connect",
            FailureReason::CannotConfigure => "cannot_configure",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FailureReason::CannotCreateSocket => "Unable to open socket",
            FailureReason::CannotConnect => "Unable to connect",
            FailureReason::CannotConfigure => "Unable to configure socket",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one failed candidate: the endpoint, the step that failed and
/// the platform detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} to {}: {detail}", .reason.describe(), .endpoint.address())]
pub struct AttemptFailure {
    endpoint: CandidateEndpoint,
    reason: FailureReason,
    detail: String,
    kind: io::ErrorKind,
}

impl AttemptFailure {
    /// Builds a failure record from the IO error reported by the transport.
    pub fn new(endpoint: CandidateEndpoint, reason: FailureReason, error: &io::Error) -> Self {
        Self {
            endpoint,
            reason,
            detail: error.to_string(),
            kind: error.kind(),
        }
    }

    /// Failure recorded for a candidate that was skipped because the overall
    /// deadline had already passed.
    pub fn deadline_exceeded(endpoint: CandidateEndpoint) -> Self {
        Self {
            endpoint,
            reason: FailureReason::CannotConnect,
            detail: "deadline exceeded before attempt".to_string(),
            kind: io::ErrorKind::TimedOut,
        }
    }

    pub fn endpoint(&self) -> &CandidateEndpoint {
        &self.endpoint
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }

    /// Human-readable platform message (e.g. "Connection refused (os error 111)").
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.kind
    }
}

/// The host/service pair could not be turned into any candidate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Name not resolved for {host}:{service}: {detail}")]
pub struct ResolutionError {
    host: String,
    service: String,
    detail: String,
}

impl ResolutionError {
    pub fn new(host: impl Into<String>, service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            service: service.into(),
            detail: detail.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The resolver's own diagnostic message.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Every resolved candidate failed.
///
/// [`last`](ConnectionError::last) is the failure of the final attempted
/// candidate. The earlier failures are kept in attempt order and are
/// available through [`attempts`](ConnectionError::attempts).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Connection failed after {} attempt(s): {last}", .earlier.len() + 1)]
pub struct ConnectionError {
    last: AttemptFailure,
    earlier: Vec<AttemptFailure>,
}

impl ConnectionError {
    pub fn new(last: AttemptFailure, earlier: Vec<AttemptFailure>) -> Self {
        Self { last, earlier }
    }

    pub fn last(&self) -> &AttemptFailure {
        &self.last
    }

    pub fn reason(&self) -> FailureReason {
        self.last.reason
    }

    pub fn detail(&self) -> &str {
        &self.last.detail
    }

    /// All failures, oldest first. The final item is [`last`](Self::last).
    pub fn attempts(&self) -> impl Iterator<Item = &AttemptFailure> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }

    pub fn attempt_count(&self) -> usize {
        self.earlier.len() + 1
    }
}

/// Error returned by a connect call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ConnectError {
    pub fn is_resolution(&self) -> bool {
        matches!(self, ConnectError::Resolution(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ConnectError::Connection(_))
    }

    /// Last per-candidate failure, if any candidate was attempted.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            ConnectError::Resolution(_) => None,
            ConnectError::Connection(e) => Some(e.last()),
        }
    }

    /// Chromium `net_error_list.h` code closest to this error.
    pub fn as_i32(&self) -> i32 {
        match self {
            ConnectError::Resolution(_) => -105,
            ConnectError::Connection(e) => match e.last().kind() {
                io::ErrorKind::ConnectionRefused => -102,
                io::ErrorKind::TimedOut => -118,
                io::ErrorKind::AddrNotAvailable => -108,
                _ => -104,
            },
        }
    }
}
