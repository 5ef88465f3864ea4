use std::fmt;
use std::time::Duration;

use crate::policy::is_retryable_status;

// ---------------------------------------------------------------------------
// TransportFailure
// ---------------------------------------------------------------------------

/// Failure reported by an [`crate::HttpTransport`] before any HTTP status
/// was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connect/reset/DNS/body-read failure.
    Network(String),
    /// The transport itself gave up on time.
    Timeout,
    /// The request could not be built (bad URL, header, mime type).
    InvalidRequest(String),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Network(msg) => write!(f, "network failure: {msg}"),
            TransportFailure::Timeout => write!(f, "transport timeout"),
            TransportFailure::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for TransportFailure {}

// ---------------------------------------------------------------------------
// ClassifiedError
// ---------------------------------------------------------------------------

/// Terminal outcome of a failed [`crate::ResilientApiClient::send`].
///
/// Only `Timeout`, `Network` and `HttpServer` with a status in
/// [`crate::RETRYABLE_STATUSES`] are retryable; the client has already
/// exhausted its retries by the time one of those reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// An attempt exceeded the per-request timeout.
    Timeout { after: Duration },
    /// Connection-level failure; no HTTP status was received.
    Network { message: String },
    /// HTTP 401. Callers must force re-authentication.
    AuthExpired,
    /// Non-retryable 4xx (400, 403, 404, ...) or other unexpected status.
    HttpClient { status: u16, message: String },
    /// 5xx, 408 or 429.
    HttpServer { status: u16, message: String },
    /// Successful HTTP status but the backend reported an application failure.
    Rejected { message: String },
    /// Malformed input. Programmer error; never retried.
    InvalidRequest { message: String },
}

impl ClassifiedError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifiedError::Timeout { .. } | ClassifiedError::Network { .. } => true,
            ClassifiedError::HttpServer { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClassifiedError::AuthExpired)
    }

    /// HTTP status when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClassifiedError::AuthExpired => Some(401),
            ClassifiedError::HttpClient { status, .. }
            | ClassifiedError::HttpServer { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable machine-readable code, used in logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            ClassifiedError::Timeout { .. } => "TIMEOUT",
            ClassifiedError::Network { .. } => "NETWORK_FAILURE",
            ClassifiedError::AuthExpired => "AUTH_EXPIRED",
            ClassifiedError::HttpClient { .. } => "HTTP_CLIENT_ERROR",
            ClassifiedError::HttpServer { .. } => "HTTP_SERVER_ERROR",
            ClassifiedError::Rejected { .. } => "REJECTED",
            ClassifiedError::InvalidRequest { .. } => "INVALID_REQUEST",
        }
    }

    /// Classify a non-2xx status. `message` is a short excerpt of the body.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClassifiedError::AuthExpired,
            408 | 429 | 500..=599 => ClassifiedError::HttpServer { status, message },
            _ => ClassifiedError::HttpClient { status, message },
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedError::Timeout { after } => {
                write!(f, "{}: no response within {}ms", self.code(), after.as_millis())
            }
            ClassifiedError::Network { message } => write!(f, "{}: {message}", self.code()),
            ClassifiedError::AuthExpired => {
                write!(f, "{}: authentication expired, sign in again", self.code())
            }
            ClassifiedError::HttpClient { status, message }
            | ClassifiedError::HttpServer { status, message } => {
                if message.is_empty() {
                    write!(f, "{} status={status}", self.code())
                } else {
                    write!(f, "{} status={status}: {message}", self.code())
                }
            }
            ClassifiedError::Rejected { message } => write!(f, "{}: {message}", self.code()),
            ClassifiedError::InvalidRequest { message } => write!(f, "{}: {message}", self.code()),
        }
    }
}

impl std::error::Error for ClassifiedError {}

impl ClassifiedError {
    pub(crate) fn from_transport(failure: TransportFailure, timeout: Duration) -> Self {
        match failure {
            TransportFailure::Network(message) => ClassifiedError::Network { message },
            TransportFailure::Timeout => ClassifiedError::Timeout { after: timeout },
            TransportFailure::InvalidRequest(message) => ClassifiedError::InvalidRequest { message },
        }
    }
}
