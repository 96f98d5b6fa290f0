//! Builders shared by endpoint transformers.
//!
//! # Design
//! `create_basic_response_body` is total: whatever the server sent, the
//! result has all three envelope fields, with malformed entries dropped
//! rather than failing the whole response. Downstream code never checks for
//! missing message lists.
//!
//! `classify_request_response` is the one place that turns a raw status code
//! into `Success` or `Error`, driven by the endpoint's declared success
//! status.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api_v1::messages::{FieldMessage, Message};
use crate::api_v1::types::{
    ApiV1Request, ApiV1RequestResponse, ApiV1Response, Endpoint, ResponseBodyBase, SuccessBody,
};
use crate::http::{HttpRequest, QueryParameters, RequestResponse};

/// Normalize any response body into the envelope fields.
pub fn create_basic_response_body(body: &Value) -> ResponseBodyBase {
    ResponseBodyBase {
        success: body.get("success").and_then(Value::as_bool).unwrap_or(false),
        field_messages: parse_entries::<FieldMessage>(body.get("fieldMessages"), "fieldMessages"),
        general_messages: parse_entries::<Message>(body.get("generalMessages"), "generalMessages"),
    }
}

fn parse_entries<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(field, error = %err, "dropping malformed message entry");
                None
            }
        })
        .collect()
}

/// Replace every `{name}` placeholder in `path` with its percent-encoded
/// value, in a single left-to-right pass. Substituted text is never scanned
/// again; placeholders without a value are kept as written.
pub fn create_url(path: &str, path_params: &BTreeMap<String, String>) -> String {
    let mut url = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        let close = open + len;
        url.push_str(&rest[..open]);
        match path_params.get(&rest[open + 1..close]) {
            Some(value) => url.push_str(&urlencoding::encode(value)),
            None => url.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    url.push_str(rest);
    url
}

/// Optional parts of a transport request derived from an application request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestOptions {
    pub path_params: BTreeMap<String, String>,
    pub query_params: Option<QueryParameters>,
    pub body: Value,
}

impl HttpRequestOptions {
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query_params(mut self, query: QueryParameters) -> Self {
        self.query_params = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// Build the transport request for `request`. The url is the resolved
/// endpoint path; the handler adds the base URL.
pub fn create_http_request_from_request<P>(
    request: &ApiV1Request<P>,
    options: HttpRequestOptions,
) -> HttpRequest {
    let url = create_url(&request.endpoint_id.path, &options.path_params);
    let mut http_request = HttpRequest::new(request.endpoint_id.method, url)
        .with_id(request.id.clone())
        .with_body(options.body);
    http_request.query_parameters = options.query_params;
    http_request
}

/// Classify a transport outcome against `endpoint`'s success status.
///
/// A success-status body that does not decode into `D` is reported as an
/// error response carrying the normalized envelope.
pub fn classify_request_response<P, D: DeserializeOwned>(
    endpoint: &Endpoint,
    rr: RequestResponse,
    request: ApiV1Request<P>,
) -> ApiV1RequestResponse<P, D> {
    let has_request_been_cancelled = rr.has_request_been_cancelled;
    let Some(response) = rr.response else {
        return ApiV1RequestResponse {
            request,
            response: None,
            has_request_been_cancelled,
        };
    };

    let base = create_basic_response_body(&response.body);
    let classified = if response.status == endpoint.success_status {
        match serde_json::from_value::<D>(response.body) {
            Ok(data) => ApiV1Response::Success {
                status: response.status,
                headers: response.headers,
                body: SuccessBody { base, data },
            },
            Err(err) => {
                warn!(
                    request_id = %request.id,
                    endpoint = %endpoint.id,
                    error = %err,
                    "success response body does not match endpoint data"
                );
                ApiV1Response::Error {
                    status: response.status,
                    headers: response.headers,
                    body: base,
                }
            }
        }
    } else {
        ApiV1Response::Error {
            status: response.status,
            headers: response.headers,
            body: base,
        }
    };

    ApiV1RequestResponse {
        request,
        response: Some(classified),
        has_request_been_cancelled,
    }
}
