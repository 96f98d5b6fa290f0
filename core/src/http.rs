//! Protocol-level request and response envelopes.
//!
//! # Design
//! These types describe HTTP traffic as plain data. Everything above the
//! transport builds an `HttpRequest` and consumes a `RequestResponse`; only a
//! `Transport` implementation ever touches the network. Bodies are carried as
//! `serde_json::Value` because the endpoint transformers are the only layer
//! that knows the concrete shape of a payload.
//!
//! A `RequestResponse` encodes three mutually exclusive outcomes: a response
//! arrived, the request was cancelled, or the transport failed without a
//! response. Transports build it through `completed`, `cancelled` and
//! `failed`, which never pair a response with the cancelled flag; the fields
//! stay public for inspection, so hand-built values must keep that rule.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Header map. Ordered so that requests compare and print deterministically.
pub type Headers = BTreeMap<String, String>;

/// Query parameters appended to the request URL.
pub type QueryParameters = BTreeMap<String, String>;

/// Unique id of a single request, shared by the application request and the
/// transport request built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `HttpRequest::new` generates a fresh id; the request handler overrides it
/// with the id of the application request so that cancellation by id works
/// across layers.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub id: RequestId,
    pub url: String,
    pub method: HttpMethod,
    pub headers: Headers,
    pub query_parameters: Option<QueryParameters>,
    pub body: Value,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            url: url.into(),
            method,
            headers: Headers::new(),
            query_parameters: None,
            body: Value::Null,
        }
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query_parameters(mut self, query: QueryParameters) -> Self {
        self.query_parameters = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Header lookup ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Non-JSON bodies are kept as a JSON string; an empty body is `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body,
        }
    }

    /// Decode raw response text into a body value.
    pub fn body_from_text(text: &str) -> Value {
        if text.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }
}

/// Outcome of executing one `HttpRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResponse {
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
    pub has_request_been_cancelled: bool,
}

impl RequestResponse {
    pub fn completed(request: HttpRequest, response: HttpResponse) -> Self {
        Self {
            request,
            response: Some(response),
            has_request_been_cancelled: false,
        }
    }

    pub fn cancelled(request: HttpRequest) -> Self {
        Self {
            request,
            response: None,
            has_request_been_cancelled: true,
        }
    }

    /// The transport gave up without a response (connection refused, reset,
    /// timeout).
    pub fn failed(request: HttpRequest) -> Self {
        Self {
            request,
            response: None,
            has_request_been_cancelled: false,
        }
    }

    pub fn is_network_failure(&self) -> bool {
        self.response.is_none() && !self.has_request_been_cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_request_has_defaults() {
        let req = HttpRequest::new(HttpMethod::Get, "/things");
        assert_eq!(req.url, "/things");
        assert!(req.headers.is_empty());
        assert!(req.query_parameters.is_none());
        assert_eq!(req.body, Value::Null);
    }

    #[test]
    fn new_requests_get_distinct_ids() {
        let a = HttpRequest::new(HttpMethod::Get, "/a");
        let b = HttpRequest::new(HttpMethod::Get, "/a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest::new(HttpMethod::Get, "/").with_header("Authorization", "Bearer x");
        assert_eq!(req.header("authorization"), Some("Bearer x"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn body_from_text_handles_json_plain_and_empty() {
        assert_eq!(HttpResponse::body_from_text(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(
            HttpResponse::body_from_text("internal error"),
            Value::String("internal error".to_string())
        );
        assert_eq!(HttpResponse::body_from_text("  "), Value::Null);
    }

    #[test]
    fn outcomes_are_mutually_exclusive() {
        let req = HttpRequest::new(HttpMethod::Post, "/x");

        let done = RequestResponse::completed(req.clone(), HttpResponse::new(200, Value::Null));
        assert!(done.response.is_some() && !done.has_request_been_cancelled);
        assert!(!done.is_network_failure());

        let cancelled = RequestResponse::cancelled(req.clone());
        assert!(cancelled.response.is_none() && cancelled.has_request_been_cancelled);
        assert!(!cancelled.is_network_failure());

        let failed = RequestResponse::failed(req);
        assert!(failed.is_network_failure());
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(serde_json::to_value(HttpMethod::Patch).unwrap(), json!("patch"));
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
