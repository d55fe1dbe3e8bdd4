use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Failure categories shared by every upstream provider.
///
/// Callers branch on the kind only. The message is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    KeyMissing,
    KeyInvalid,
    RateLimited,
    BadParameters,
    ServiceUnavailable,
    NetworkError,
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeyMissing => "key_missing",
            Self::KeyInvalid => "key_invalid",
            Self::RateLimited => "rate_limited",
            Self::BadParameters => "bad_parameters",
            Self::ServiceUnavailable => "service_unavailable",
            Self::NetworkError => "network_error",
            Self::Unknown => "unknown",
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub const fn code(self) -> &'static str {
        match self {
            Self::KeyMissing => "UPSTREAM_KEY_MISSING",
            Self::KeyInvalid => "UPSTREAM_KEY_INVALID",
            Self::RateLimited => "UPSTREAM_RATE_LIMITED",
            Self::BadParameters => "UPSTREAM_BAD_PARAMETERS",
            Self::ServiceUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::NetworkError => "UPSTREAM_NETWORK_ERROR",
            Self::Unknown => "UPSTREAM_ERROR",
        }
    }

    /// Short, non-technical message shown to end users.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::KeyMissing | Self::KeyInvalid => {
                "This feature has a configuration issue. Please contact support."
            }
            Self::RateLimited => "The service is busy right now. Please try again later.",
            Self::ServiceUnavailable | Self::NetworkError => {
                "The service is temporarily unavailable. Please try again later."
            }
            Self::BadParameters | Self::Unknown => {
                "Something went wrong while fetching this data. Please try again."
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider failure reduced to a fixed [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn key_missing(provider: &str, env_var: &str) -> Self {
        Self::new(
            ErrorKind::KeyMissing,
            format!("{provider} API key is not configured (set {env_var})"),
        )
    }

    pub fn bad_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadParameters, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Maps an HTTP status to an error kind. Returns `None` for 2xx.
///
/// Provider overrides are consulted before the shared table.
pub fn classify_status(status: u16, overrides: &[(u16, ErrorKind)]) -> Option<ErrorKind> {
    if (200..300).contains(&status) {
        return None;
    }

    if let Some((_, kind)) = overrides.iter().find(|(code, _)| *code == status) {
        return Some(*kind);
    }

    let kind = match status {
        401 | 403 => ErrorKind::KeyInvalid,
        429 => ErrorKind::RateLimited,
        400 => ErrorKind::BadParameters,
        s if s >= 500 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Unknown,
    };
    Some(kind)
}
