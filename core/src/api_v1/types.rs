//! Typed application-level requests and responses.
//!
//! # Design
//! `ApiV1Response` is a tagged enum: a response is a `Success` or an `Error`
//! because the endpoint's transformer said so, never because of the shape of
//! its body. Both variants expose the normalized `ResponseBodyBase`, so code
//! that only cares about messages does not need to match.
//!
//! Middleware must observe every endpoint regardless of its payload and data
//! types, so settled requests are also available as the type-erased
//! `SettledRequest` view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api_v1::messages::{FieldMessage, Message};
use crate::http::{Headers, HttpMethod, RequestId};

/// Identifies a logical operation. `path` may contain `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    pub method: HttpMethod,
    pub path: String,
}

impl EndpointId {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// An endpoint together with its declared HTTP success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub id: EndpointId,
    pub success_status: u16,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>, success_status: u16) -> Self {
        Self {
            id: EndpointId::new(method, path),
            success_status,
        }
    }
}

/// One-shot application request. Consumed by dispatch.
#[derive(Debug, PartialEq)]
pub struct ApiV1Request<P> {
    pub id: RequestId,
    pub endpoint_id: EndpointId,
    pub payload: P,
}

impl<P> ApiV1Request<P> {
    pub fn new(endpoint_id: EndpointId, payload: P) -> Self {
        Self {
            id: RequestId::new(),
            endpoint_id,
            payload,
        }
    }

    pub fn info(&self) -> RequestInfo<'_> {
        RequestInfo {
            id: &self.id,
            endpoint_id: &self.endpoint_id,
        }
    }
}

/// Envelope fields present on every response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBodyBase {
    pub success: bool,
    pub field_messages: Vec<FieldMessage>,
    pub general_messages: Vec<Message>,
}

/// Body of a success response: the envelope plus endpoint-specific data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessBody<D> {
    #[serde(flatten)]
    pub base: ResponseBodyBase,
    #[serde(flatten)]
    pub data: D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Success,
    Error,
}

/// A classified response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiV1Response<D> {
    Success {
        status: u16,
        headers: Headers,
        body: SuccessBody<D>,
    },
    Error {
        status: u16,
        headers: Headers,
        body: ResponseBodyBase,
    },
}

impl<D> ApiV1Response<D> {
    pub fn response_type(&self) -> ResponseType {
        match self {
            ApiV1Response::Success { .. } => ResponseType::Success,
            ApiV1Response::Error { .. } => ResponseType::Error,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiV1Response::Success { status, .. } | ApiV1Response::Error { status, .. } => *status,
        }
    }

    pub fn headers(&self) -> &Headers {
        match self {
            ApiV1Response::Success { headers, .. } | ApiV1Response::Error { headers, .. } => headers,
        }
    }

    pub fn base(&self) -> &ResponseBodyBase {
        match self {
            ApiV1Response::Success { body, .. } => &body.base,
            ApiV1Response::Error { body, .. } => body,
        }
    }

    pub fn general_messages(&self) -> &[Message] {
        &self.base().general_messages
    }

    pub fn field_messages(&self) -> &[FieldMessage] {
        &self.base().field_messages
    }

    /// Endpoint data, only present on success.
    pub fn data(&self) -> Option<&D> {
        match self {
            ApiV1Response::Success { body, .. } => Some(&body.data),
            ApiV1Response::Error { .. } => None,
        }
    }
}

/// A dispatched application request and its outcome.
///
/// `response` is `None` when the request was cancelled or the transport
/// failed; `has_request_been_cancelled` tells the two apart.
#[derive(Debug, PartialEq)]
pub struct ApiV1RequestResponse<P, D> {
    pub request: ApiV1Request<P>,
    pub response: Option<ApiV1Response<D>>,
    pub has_request_been_cancelled: bool,
}

impl<P, D> ApiV1RequestResponse<P, D> {
    pub fn is_success(&self) -> bool {
        matches!(self.response, Some(ApiV1Response::Success { .. }))
    }

    pub fn data(&self) -> Option<&D> {
        self.response.as_ref().and_then(ApiV1Response::data)
    }

    pub fn field_messages(&self) -> &[FieldMessage] {
        self.response
            .as_ref()
            .map(ApiV1Response::field_messages)
            .unwrap_or_default()
    }

    pub fn view(&self) -> SettledRequest<'_> {
        SettledRequest {
            request: self.request.info(),
            response: self.response.as_ref().map(|response| SettledResponse {
                response_type: response.response_type(),
                status: response.status(),
                body: response.base(),
            }),
            has_request_been_cancelled: self.has_request_been_cancelled,
        }
    }
}

/// Borrowed identity of an application request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestInfo<'a> {
    pub id: &'a RequestId,
    pub endpoint_id: &'a EndpointId,
}

/// Type-erased view of a settled request, handed to middleware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledRequest<'a> {
    pub request: RequestInfo<'a>,
    pub response: Option<SettledResponse<'a>>,
    pub has_request_been_cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledResponse<'a> {
    pub response_type: ResponseType,
    pub status: u16,
    pub body: &'a ResponseBodyBase,
}
