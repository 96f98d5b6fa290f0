//! Per-endpoint adapters between typed requests and the transport.

use serde::de::DeserializeOwned;

use crate::api_v1::factory::classify_request_response;
use crate::api_v1::types::{ApiV1Request, ApiV1RequestResponse, Endpoint};
use crate::error::ApiError;
use crate::http::{HttpRequest, RequestResponse};

/// Knows one endpoint's wire format and success contract.
///
/// Implementors usually only provide `endpoint` and `create_http_request`;
/// the default `create_request_response` classifies against the declared
/// success status.
pub trait EndpointTransformer: Send + Sync {
    type Payload: Send + Sync;
    type Data: DeserializeOwned + Send;

    fn endpoint(&self) -> &Endpoint;

    fn create_http_request(
        &self,
        request: &ApiV1Request<Self::Payload>,
    ) -> Result<HttpRequest, ApiError>;

    fn create_request_response(
        &self,
        rr: RequestResponse,
        request: ApiV1Request<Self::Payload>,
    ) -> ApiV1RequestResponse<Self::Payload, Self::Data> {
        classify_request_response(self.endpoint(), rr, request)
    }
}
