//! Terminal/transient failure description handed to `on_fail`.

use std::fmt;

use super::classify::{classify_curl_error, classify_http_status};
use crate::request::{MappingError, RawResponse};

/// Label for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response received (timeout, DNS, refused, reset).
    Connection,
    /// Response with status >= 500.
    Server,
    /// Response with status 400..=499.
    Client,
    /// Success status, but the body did not map into the expected shape.
    Mapping,
    /// Anything else (e.g. 3xx without redirect, malformed URL at transfer time).
    Unknown,
}

impl FailureKind {
    /// Transient kinds are worth another attempt while budget remains.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Connection | FailureKind::Server)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Connection => "connection error",
            FailureKind::Server => "server error",
            FailureKind::Client => "client error",
            FailureKind::Mapping => "mapping error",
            FailureKind::Unknown => "unknown error",
        };
        f.write_str(s)
    }
}

/// What went wrong with an attempt: kind, HTTP status if a response arrived,
/// and a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub status: Option<u32>,
    pub cause: String,
}

impl FailureInfo {
    /// Transport-level failure; no response was received.
    pub fn from_curl(e: &curl::Error) -> Self {
        Self {
            kind: classify_curl_error(e),
            status: None,
            cause: e.to_string(),
        }
    }

    /// A response arrived with a non-success status.
    pub fn from_response(raw: &RawResponse) -> Self {
        let mut cause = format!("HTTP {}", raw.status);
        let body = raw.body_text();
        let body = body.trim();
        if !body.is_empty() {
            cause.push_str(": ");
            cause.extend(body.chars().take(200));
        }
        Self {
            kind: classify_http_status(raw.status),
            status: Some(raw.status),
            cause,
        }
    }

    /// A success response whose body could not be mapped.
    pub fn from_mapping(status: u32, e: &MappingError) -> Self {
        Self {
            kind: FailureKind::Mapping,
            status: Some(status),
            cause: e.to_string(),
        }
    }

    /// The request never reached its own outcome because `exec()` stopped early.
    pub fn aborted(cause: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unknown,
            status: None,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = self.status {
            write!(f, " (status {})", code)?;
        }
        write!(f, ": {}", self.cause)
    }
}

impl std::error::Error for FailureInfo {}
