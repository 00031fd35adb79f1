//! Error taxonomy for the client core.
//!
//! Each layer converts what it receives into one of these kinds and handles it
//! locally: decode failures mean "no session", sign-in failures are shown on
//! the form, mutation failures roll back and raise a notice.

use std::time::Duration;

use thiserror::Error;

/// A credential that cannot be read. Always treated as "no session".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("credential must have 3 dot-separated segments, found {0}")]
    MalformedToken(usize),

    #[error("credential payload is not valid base64url")]
    InvalidBase64,

    #[error("credential payload is not a valid claims object: {0}")]
    InvalidPayload(String),

    #[error("credential carries an unknown role: {0}")]
    UnknownRole(String),

    #[error("credential expiry {0} is out of range")]
    InvalidExpiry(i64),
}

/// Why a sign-in did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server rejected the email/password pair. Session state is unchanged.
    #[error("{message}")]
    InvalidCredentials { message: String },

    /// Transport failure or server outage. Never turned into a local session.
    #[error("sign-in service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The server accepted the sign-in but returned an unreadable credential.
    #[error("server issued an unreadable credential: {0}")]
    MalformedCredential(#[from] DecodeError),

    /// A teardown happened while the sign-in was in flight; the result was discarded.
    #[error("sign-in superseded by logout")]
    Superseded,
}

/// Transport-level failure of a REST call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The server answered with `succeeded: false`.
    #[error("request rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("not signed in")]
    Unauthenticated,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl ApiError {
    /// True when the failure says nothing about the request itself: the
    /// service could not be reached or failed on its side.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::TimedOut(_) | ApiError::Decode(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Rejected(_) | ApiError::Unauthenticated => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Why an optimistic mutation was rolled back or never applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationFailure {
    #[error("server rejected the change: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("no response within {0:?}")]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("not signed in")]
    Unauthenticated,

    #[error("target is not in the local replica")]
    UnknownTarget,

    #[error("{0}")]
    InvalidInput(String),
}

impl From<ApiError> for MutationFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(message) => MutationFailure::Rejected(message),
            ApiError::Unauthenticated => MutationFailure::Unauthenticated,
            ApiError::TimedOut(after) => MutationFailure::TimedOut(after),
            other => MutationFailure::Transport(other.to_string()),
        }
    }
}
