//! Error types for the wallet-name directory client.
//!
//! # Design
//! Errors are split by layer. `EnvelopeError` covers one request/response
//! round-trip, `UriError` covers payment URI parsing, and `ApiError` wraps
//! both for the directory operations that reshape decoded payloads.
//! Every variant carries structured detail so callers can branch on kind
//! instead of matching message text.

use std::fmt;

use thiserror::Error;

/// Opaque failure reported by a `Transport` (connection refused, TLS, ...).
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl TransportError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            source: source.into(),
        }
    }
}

/// Logical failure reported by the remote service inside a JSON envelope.
///
/// `Display` renders `message`, followed by `[FAILURES: a, b]` when the
/// envelope carried sub-failures. The list keeps the order the service
/// sent it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: u16,
    pub message: String,
    pub failures: Vec<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.failures.is_empty() {
            write!(f, "[FAILURES: {}]", self.failures.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// Errors produced while sending a request and interpreting its envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The method is not one of GET, POST, PUT or DELETE.
    #[error("invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The response carried no body and was not a 204 answer to a DELETE.
    #[error("empty response received")]
    EmptyResponse,

    #[error("non-JSON content type: {}", content_type.as_deref().unwrap_or("<none>"))]
    WrongContentType { content_type: Option<String> },

    #[error("invalid JSON response received: {0}")]
    MalformedJson(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors produced by the payment URI parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("unknown URI prefix: {scheme}")]
    UnknownScheme { scheme: String },

    /// A query pair without `=`, or with an empty key or value.
    #[error("unbalanced parameter {pair}")]
    UnbalancedParameter { pair: String },

    #[error("duplicate parameter {key}")]
    DuplicateParameter { key: String },
}

/// Errors returned by `DirectoryClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Uri(#[from] UriError),

    /// The decoded payload lacked a field or held the wrong type.
    #[error("unexpected response shape at `{field}`: {reason}")]
    UnexpectedShape { field: String, reason: String },

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The wallet name has no id assigned by the service yet.
    #[error("wallet name has no id")]
    MissingId,

    /// The service reported success but did not echo the saved wallet name.
    #[error("success, but invalid response received")]
    UnmatchedResponse,

    #[error("no address found for {wallet_name} ({currency})")]
    NoAddressFound { wallet_name: String, currency: String },
}

impl ApiError {
    pub(crate) fn shape(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::UnexpectedShape {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
