//! Base request handler: binds endpoint transformers to a transport.
//!
//! # Design
//! `HttpApiV1RequestHandler` is where cross-cutting transport concerns are
//! applied to every endpoint: the base URL prefix, the bearer credential and
//! running-request bookkeeping. The credential is looked up through a caller
//! supplied closure on every dispatch and never cached, so a sign-in or
//! sign-out between two requests takes effect immediately.
//!
//! 4xx and 5xx responses are ordinary outcomes classified by the transformer.
//! `Err` is reserved for requests that could not be built.
//!
//! Every dispatch carries a `CancellationToken` from `ExecutionSettings`.
//! The token is tracked with the request id before anything else happens, and
//! the transport call is raced against it, so a cancellation is honoured even
//! if it lands before the transport has registered the request.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api_v1::running::RunningRequests;
use crate::api_v1::transformer::EndpointTransformer;
use crate::api_v1::types::{ApiV1Request, ApiV1RequestResponse};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, RequestId, RequestResponse};
use crate::transport::{ProgressCallback, Transport};

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Returns the current bearer token, or `None` when signed out.
pub type AccessTokenFinder = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Everything needed to dispatch one application request.
pub struct ExecutionSettings<'a, E: EndpointTransformer> {
    pub request: ApiV1Request<E::Payload>,
    pub transformer: &'a E,
    pub on_progress: Option<ProgressCallback>,
    /// Shared by every layer the request passes through.
    pub cancellation: CancellationToken,
}

impl<'a, E: EndpointTransformer> ExecutionSettings<'a, E> {
    pub fn new(request: ApiV1Request<E::Payload>, transformer: &'a E) -> Self {
        Self {
            request,
            transformer,
            on_progress: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Dispatch under an existing token, e.g. one owned by the caller.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// Dispatches typed requests and cancels them.
#[async_trait]
pub trait ApiV1RequestHandler: Send + Sync {
    async fn execute_request<'a, E>(
        &self,
        settings: ExecutionSettings<'a, E>,
    ) -> Result<ApiV1RequestResponse<E::Payload, E::Data>, ApiError>
    where
        E: EndpointTransformer + 'a;

    /// Cancel every request this handler is tracking.
    fn cancel_all_requests(&self);

    fn cancel_request_by_id(&self, id: &RequestId);
}

#[async_trait]
impl<H: ApiV1RequestHandler> ApiV1RequestHandler for Arc<H> {
    async fn execute_request<'a, E>(
        &self,
        settings: ExecutionSettings<'a, E>,
    ) -> Result<ApiV1RequestResponse<E::Payload, E::Data>, ApiError>
    where
        E: EndpointTransformer + 'a,
    {
        (**self).execute_request(settings).await
    }

    fn cancel_all_requests(&self) {
        (**self).cancel_all_requests()
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        (**self).cancel_request_by_id(id)
    }
}

pub struct HttpApiV1RequestHandler<T> {
    base_url: String,
    transport: T,
    find_access_token: AccessTokenFinder,
    running: RunningRequests,
}

impl<T: Transport> HttpApiV1RequestHandler<T> {
    pub fn new(
        transport: T,
        find_access_token: impl Fn() -> Option<String> + Send + Sync + 'static,
        base_url: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            find_access_token: Arc::new(find_access_token),
            running: RunningRequests::new(),
        }
    }

    pub fn from_config(transport: T, find_access_token: AccessTokenFinder, config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            transport,
            find_access_token,
            running: RunningRequests::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_running(&self, id: &RequestId) -> bool {
        self.running.contains(id)
    }

    pub fn running_request_ids(&self) -> Vec<RequestId> {
        self.running.snapshot()
    }

    fn prepare(&self, built: HttpRequest, id: &RequestId) -> HttpRequest {
        let mut request = HttpRequest {
            url: format!("{}{}", self.base_url, built.url),
            id: id.clone(),
            ..built
        };
        if let Some(token) = (self.find_access_token)().filter(|token| !token.is_empty()) {
            request
                .headers
                .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
        }
        request
    }
}

impl<T> std::fmt::Debug for HttpApiV1RequestHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiV1RequestHandler")
            .field("base_url", &self.base_url)
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Transport> ApiV1RequestHandler for HttpApiV1RequestHandler<T> {
    async fn execute_request<'a, E>(
        &self,
        settings: ExecutionSettings<'a, E>,
    ) -> Result<ApiV1RequestResponse<E::Payload, E::Data>, ApiError>
    where
        E: EndpointTransformer + 'a,
    {
        let ExecutionSettings {
            request,
            transformer,
            on_progress,
            cancellation,
        } = settings;

        let running = self.running.track(request.id.clone(), cancellation.clone());
        let built = transformer.create_http_request(&request)?;
        let http_request = self.prepare(built, &request.id);

        debug!(
            request_id = %request.id,
            endpoint = %request.endpoint_id,
            url = %http_request.url,
            "dispatching request"
        );
        let rr = tokio::select! {
            biased;
            _ = cancellation.cancelled() => RequestResponse::cancelled(http_request.clone()),
            rr = self.transport.execute_request(http_request.clone(), on_progress) => rr,
        };
        drop(running);
        debug!(
            request_id = %request.id,
            status = ?rr.response.as_ref().map(|r| r.status),
            cancelled = rr.has_request_been_cancelled,
            "request settled"
        );

        Ok(transformer.create_request_response(rr, request))
    }

    fn cancel_all_requests(&self) {
        for id in self.running.snapshot() {
            self.cancel_request_by_id(&id);
        }
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        self.running.cancel(id);
        self.transport.cancel_request_by_id(id);
    }
}
