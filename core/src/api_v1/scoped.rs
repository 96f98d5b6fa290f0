//! Scoped request handler with middleware.
//!
//! # Design
//! A `ScopedApiV1RequestHandler` wraps a shared inner handler and adds its
//! own running-id set and middleware list. `create_separated` gives each UI
//! region an independent scope over the same inner handler: the region can
//! cancel everything it started on teardown, and only that. Cancellation
//! requests for ids the scope did not dispatch are dropped here instead of
//! being forwarded, so one scope can never cancel another scope's call.
//!
//! Middleware hooks run synchronously and in registration order. Every
//! `on_request` is matched by exactly one `on_request_response` or, when the
//! request could not be built, one `on_request_error`. `on_request_response`
//! also runs for cancelled requests; middleware decides from
//! `has_request_been_cancelled` whether to react.
//!
//! The scope tracks each id together with the request's cancellation token,
//! which the inner handler shares. Cancelling through the scope trips that
//! token, so it takes effect even while `on_request` hooks are still running.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::api_v1::handler::{ApiV1RequestHandler, ExecutionSettings};
use crate::api_v1::running::RunningRequests;
use crate::api_v1::transformer::EndpointTransformer;
use crate::api_v1::types::{ApiV1RequestResponse, RequestInfo, SettledRequest};
use crate::error::ApiError;
use crate::http::RequestId;

/// Hooks run around every request dispatched through a scope.
pub trait ApiV1Middleware: Send + Sync {
    fn on_request(&self, _request: RequestInfo<'_>) {}

    fn on_request_response(&self, _settled: &SettledRequest<'_>) {}

    /// The request was announced through `on_request` but never dispatched.
    fn on_request_error(&self, _request: RequestInfo<'_>, _error: &ApiError) {}
}

pub struct ScopedApiV1RequestHandler<H> {
    inner: Arc<H>,
    middlewares: Vec<Arc<dyn ApiV1Middleware>>,
    running: RunningRequests,
}

impl<H: ApiV1RequestHandler> ScopedApiV1RequestHandler<H> {
    pub fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            middlewares: Vec::new(),
            running: RunningRequests::new(),
        }
    }

    /// A fresh scope over the same inner handler, with no middleware and no
    /// running requests.
    pub fn create_separated(&self) -> Self {
        Self::new(Arc::clone(&self.inner))
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn ApiV1Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    pub fn inner(&self) -> &Arc<H> {
        &self.inner
    }

    pub fn is_running(&self, id: &RequestId) -> bool {
        self.running.contains(id)
    }

    pub fn running_request_ids(&self) -> Vec<RequestId> {
        self.running.snapshot()
    }
}

impl<H> std::fmt::Debug for ScopedApiV1RequestHandler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedApiV1RequestHandler")
            .field("middlewares", &self.middlewares.len())
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<H: ApiV1RequestHandler> ApiV1RequestHandler for ScopedApiV1RequestHandler<H> {
    async fn execute_request<'a, E>(
        &self,
        settings: ExecutionSettings<'a, E>,
    ) -> Result<ApiV1RequestResponse<E::Payload, E::Data>, ApiError>
    where
        E: EndpointTransformer + 'a,
    {
        let id = settings.request.id.clone();
        let endpoint_id = settings.request.endpoint_id.clone();
        let info = RequestInfo {
            id: &id,
            endpoint_id: &endpoint_id,
        };

        let running = self.running.track(id.clone(), settings.cancellation.clone());
        for middleware in &self.middlewares {
            middleware.on_request(info);
        }
        let outcome = self.inner.execute_request(settings).await;
        drop(running);

        let rr = match outcome {
            Ok(rr) => rr,
            Err(err) => {
                for middleware in &self.middlewares {
                    middleware.on_request_error(info, &err);
                }
                return Err(err);
            }
        };

        let settled = rr.view();
        for middleware in &self.middlewares {
            middleware.on_request_response(&settled);
        }
        Ok(rr)
    }

    fn cancel_all_requests(&self) {
        for id in self.running.snapshot() {
            self.cancel_request_by_id(&id);
        }
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        if !self.running.cancel(id) {
            debug!(request_id = %id, "ignoring cancellation for request outside this scope");
            return;
        }
        self.inner.cancel_request_by_id(id);
    }
}
