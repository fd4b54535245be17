//! Request/response envelope shared by every directory endpoint.
//!
//! # Design
//! Work is split the same way as elsewhere in the crate: `build_request`
//! produces an `HttpRequest`, `interpret_response` consumes an
//! `HttpResponse`, and `send` chains the two through a `Transport`. The
//! pure halves carry all the rules and are tested without any I/O.
//!
//! Interpretation order matters and mirrors the wire contract:
//! 1. a 204 answer to a DELETE is an empty success, nothing else is checked;
//! 2. the body must be non-empty;
//! 3. the content type must be JSON;
//! 4. the body must decode to a JSON object;
//! 5. a status of 300 or more, or a falsy `success`, is a remote failure.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{EnvelopeError, RemoteError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Decoded response payload. Shapes vary per endpoint, so it stays generic.
pub type Document = Map<String, Value>;

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const PARTNER_ID_HEADER: &str = "X-Partner-Id";

const NO_CONTENT: u16 = 204;

/// Partner credentials attached to authenticated requests.
///
/// Either value may be absent. Empty strings are treated as absent so a
/// blank header is never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub partner_id: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, partner_id: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            partner_id: Some(partner_id.into()),
        }
    }

    /// Credentials that attach no authentication headers.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Build the request for one envelope call.
///
/// The JSON content type is always declared, even without a body.
pub fn build_request(
    credentials: &Credentials,
    method: HttpMethod,
    url: &str,
    body: Option<String>,
) -> HttpRequest {
    let mut headers = vec![(CONTENT_TYPE_HEADER.to_string(), JSON_MEDIA_TYPE.to_string())];
    if let Some(key) = non_empty(&credentials.api_key) {
        headers.push((AUTHORIZATION_HEADER.to_string(), key.to_string()));
    }
    if let Some(partner) = non_empty(&credentials.partner_id) {
        headers.push((PARTNER_ID_HEADER.to_string(), partner.to_string()));
    }
    HttpRequest {
        method,
        url: url.to_string(),
        headers,
        body,
    }
}

/// Interpret a raw response into a decoded document or a classified error.
pub fn interpret_response(
    method: HttpMethod,
    response: &HttpResponse,
) -> Result<Document, EnvelopeError> {
    if response.status == NO_CONTENT && method == HttpMethod::Delete {
        return Ok(Document::new());
    }

    let body = match response.body.as_deref() {
        Some(body) if !body.is_empty() => body,
        _ => return Err(EnvelopeError::EmptyResponse),
    };

    let content_type = response.header(CONTENT_TYPE_HEADER);
    if !content_type.is_some_and(is_json_media_type) {
        return Err(EnvelopeError::WrongContentType {
            content_type: content_type.map(str::to_string),
        });
    }

    let document = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(document)) => document,
        Ok(_) => {
            return Err(EnvelopeError::MalformedJson(
                "expected a JSON object".to_string(),
            ))
        }
        Err(e) => return Err(EnvelopeError::MalformedJson(e.to_string())),
    };

    if response.status >= 300 || !is_truthy(document.get("success")) {
        let err = remote_error(response.status, &document);
        warn!(status = err.status, error = %err, "directory service reported failure");
        return Err(err.into());
    }

    Ok(document)
}

/// Validate `method`, then perform one envelope round-trip.
///
/// An unsupported method fails before the transport is touched.
pub fn send<T: Transport + ?Sized>(
    transport: &T,
    credentials: &Credentials,
    method: &str,
    url: &str,
    body: Option<String>,
) -> Result<Document, EnvelopeError> {
    let method: HttpMethod = method.parse()?;
    let request = build_request(credentials, method, url, body);
    execute(transport, &request)
}

/// Dispatch an already-built request and interpret the response.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &HttpRequest,
) -> Result<Document, EnvelopeError> {
    debug!(method = %request.method, url = %request.url, "sending request");
    let response = transport.execute(request)?;
    debug!(status = response.status, "received response");
    interpret_response(request.method, &response)
}

fn remote_error(status: u16, document: &Document) -> RemoteError {
    let message = document
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let failures = document
        .get("failures")
        .and_then(Value::as_array)
        .map(|failures| {
            failures
                .iter()
                .filter_map(|f| f.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    RemoteError {
        status,
        message,
        failures,
    }
}

/// Only a missing field, `null` and `false` are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

/// Compares the media type only, so `application/json; charset=utf-8` passes.
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
