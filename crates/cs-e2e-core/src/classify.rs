//! Error classification shared by the cloud and Kubernetes clients
//!
//! Watchers need to know whether a failed status query is worth repeating.
//! Errors from either API implement [`Classify`]; the helpers below and the
//! predicates in [`crate::watch`] build on it.

/// Coarse error classes used to decide retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Likely to resolve if the same request is retried shortly
    Transient,
    /// Credentials lack permission (401 / 403)
    Authorization,
    /// The resource does not exist (404)
    NotFound,
    /// Anything else: malformed responses, bad requests, unknown failures
    Permanent,
}

/// Errors that can report their class
pub trait Classify {
    /// The class of this error
    fn class(&self) -> ErrorClass;
}

impl<T: Classify + ?Sized> Classify for &T {
    fn class(&self) -> ErrorClass {
        (**self).class()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn class(&self) -> ErrorClass {
        (**self).class()
    }
}

/// Whether an error may be retried
pub fn is_retryable<E: Classify + ?Sized>(error: &E) -> bool {
    error.class() == ErrorClass::Transient
}

/// Whether an error is an authentication or authorization failure
pub fn is_auth_error<E: Classify + ?Sized>(error: &E) -> bool {
    error.class() == ErrorClass::Authorization
}

/// Whether an error reports a missing resource
pub fn is_not_found<E: Classify + ?Sized>(error: &E) -> bool {
    error.class() == ErrorClass::NotFound
}

/// HTTP status codes treated as transient
///
/// 408, 425, 429, 500, 502, 503, 504
pub const RETRYABLE_STATUS_CODES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

/// Classify an HTTP status code
///
/// A response carrying a `Retry-After` hint is an explicit request to come
/// back later and is always transient.
pub fn classify_status(code: u16, suggests_retry: bool) -> ErrorClass {
    if suggests_retry || RETRYABLE_STATUS_CODES.contains(&code) {
        return ErrorClass::Transient;
    }
    match code {
        401 | 403 => ErrorClass::Authorization,
        404 => ErrorClass::NotFound,
        _ => ErrorClass::Permanent,
    }
}

const TRANSIENT_TRANSPORT_PATTERNS: [&str; 11] = [
    "unexpected eof",
    "unexpected end of file",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "timed out",
    "timeout",
    "network unreachable",
    "temporary failure",
    "use of closed network connection",
];

/// Classify a transport-level failure from its message
///
/// Unexpected EOFs, connection resets and timeouts are transient; anything
/// else is permanent.
pub fn classify_transport_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if TRANSIENT_TRANSPORT_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
    {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}
