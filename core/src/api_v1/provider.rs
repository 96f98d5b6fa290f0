//! Wiring of the request pipeline for an application.
//!
//! # Design
//! `ApiV1Provider` is built once with explicit dependencies (configuration,
//! transport, session, optional toaster) and hands out `RequestScope`s. A
//! scope owns a separated `ScopedApiV1RequestHandler`; tasks dispatch through
//! shared handles obtained from `RequestScope::handler`. Dropping the scope
//! cancels whatever those tasks still have in flight, which is how a UI
//! region releases its requests on teardown.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api_v1::handler::{ApiV1RequestHandler, ExecutionSettings, HttpApiV1RequestHandler};
use crate::api_v1::scoped::ScopedApiV1RequestHandler;
use crate::api_v1::toaster::{Toaster, ToasterMiddleware, Translator};
use crate::api_v1::transformer::EndpointTransformer;
use crate::api_v1::types::ApiV1RequestResponse;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::RequestId;
use crate::session::SessionStore;
use crate::transport::{ReqwestTransport, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Attach the toaster middleware, if the provider has one.
    pub show_toasts: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self { show_toasts: true }
    }
}

pub struct ApiV1Provider<T> {
    root: ScopedApiV1RequestHandler<HttpApiV1RequestHandler<T>>,
    toaster_middleware: Option<Arc<ToasterMiddleware>>,
    toast_auto_hide: Duration,
}

impl ApiV1Provider<ReqwestTransport> {
    /// Provider talking to the network. Fails if the HTTP client cannot be
    /// built.
    pub fn connect(config: &ClientConfig, session: &SessionStore) -> Result<Self, ApiError> {
        Ok(Self::new(config, ReqwestTransport::new(config)?, session))
    }
}

impl<T: Transport> ApiV1Provider<T> {
    pub fn new(config: &ClientConfig, transport: T, session: &SessionStore) -> Self {
        let base = HttpApiV1RequestHandler::from_config(transport, session.access_token_finder(), config);
        Self {
            root: ScopedApiV1RequestHandler::new(Arc::new(base)),
            toaster_middleware: None,
            toast_auto_hide: config.toast_auto_hide,
        }
    }

    pub fn with_toaster(mut self, toaster: Arc<dyn Toaster>, translator: Arc<dyn Translator>) -> Self {
        let middleware = ToasterMiddleware::new(toaster, translator).with_auto_hide(self.toast_auto_hide);
        self.toaster_middleware = Some(Arc::new(middleware));
        self
    }

    pub fn base_handler(&self) -> &Arc<HttpApiV1RequestHandler<T>> {
        self.root.inner()
    }

    /// A new independent scope for one UI region.
    pub fn scope(&self, options: ScopeOptions) -> RequestScope<HttpApiV1RequestHandler<T>> {
        let mut handler = self.root.create_separated();
        if options.show_toasts {
            if let Some(middleware) = &self.toaster_middleware {
                handler.add_middleware(middleware.clone());
            }
        }
        RequestScope {
            handler: Arc::new(handler),
        }
    }
}

/// Owner of a scoped handler. Cancels the scope's in-flight requests on drop.
pub struct RequestScope<H: ApiV1RequestHandler> {
    handler: Arc<ScopedApiV1RequestHandler<H>>,
}

impl<H: ApiV1RequestHandler> RequestScope<H> {
    /// Shared handle for tasks dispatching on behalf of this scope.
    pub fn handler(&self) -> Arc<ScopedApiV1RequestHandler<H>> {
        Arc::clone(&self.handler)
    }
}

impl<H: ApiV1RequestHandler> Deref for RequestScope<H> {
    type Target = ScopedApiV1RequestHandler<H>;

    fn deref(&self) -> &Self::Target {
        &self.handler
    }
}

impl<H: ApiV1RequestHandler> Drop for RequestScope<H> {
    fn drop(&mut self) {
        self.handler.cancel_all_requests();
    }
}

#[async_trait]
impl<H: ApiV1RequestHandler> ApiV1RequestHandler for RequestScope<H> {
    async fn execute_request<'a, E>(
        &self,
        settings: ExecutionSettings<'a, E>,
    ) -> Result<ApiV1RequestResponse<E::Payload, E::Data>, ApiError>
    where
        E: EndpointTransformer + 'a,
    {
        self.handler.execute_request(settings).await
    }

    fn cancel_all_requests(&self) {
        self.handler.cancel_all_requests()
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        self.handler.cancel_request_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_v1::auth::{register_user, Gender, RegisterUserPayload};
    use crate::api_v1::toaster::RecordingToaster;
    use crate::http::HttpResponse;
    use crate::transport::{StubReply, StubTransport};
    use serde_json::json;

    fn provider(stub: &StubTransport, toaster: &Arc<RecordingToaster>) -> ApiV1Provider<StubTransport> {
        let translator: Arc<dyn Translator> = Arc::new(|key: &str| key.to_string());
        ApiV1Provider::new(&ClientConfig::new("http://api.test/api/v1").unwrap(), stub.clone(), &SessionStore::new())
            .with_toaster(toaster.clone(), translator)
    }

    fn payload() -> RegisterUserPayload {
        RegisterUserPayload::new(Gender::Female, "bea", "b@c.de", "pw")
    }

    #[tokio::test]
    async fn show_toasts_controls_the_middleware() {
        let stub = StubTransport::new(|_| StubReply::Fail);
        let toaster = Arc::new(RecordingToaster::new());
        let provider = provider(&stub, &toaster);

        let loud = provider.scope(ScopeOptions::default());
        let quiet = provider.scope(ScopeOptions { show_toasts: false });
        assert_eq!(loud.middleware_count(), 1);
        assert_eq!(quiet.middleware_count(), 0);

        register_user(&quiet, payload()).await.unwrap();
        assert!(toaster.shown().is_empty());

        register_user(&loud, payload()).await.unwrap();
        assert_eq!(toaster.shown().len(), 1);
    }

    #[tokio::test]
    async fn dropping_a_scope_cancels_its_requests() {
        let stub = StubTransport::new(|_| StubReply::Hang);
        let toaster = Arc::new(RecordingToaster::new());
        let provider = provider(&stub, &toaster);
        let scope = provider.scope(ScopeOptions::default());
        let handler = scope.handler();

        let task = tokio::spawn(async move { register_user(&handler, payload()).await });
        stub.wait_for_in_flight(1).await;
        let ids = scope.running_request_ids();
        assert_eq!(ids.len(), 1);

        drop(scope);
        let rr = task.await.unwrap().unwrap();
        assert!(rr.has_request_been_cancelled);
        assert!(rr.response.is_none());
        assert!(toaster.shown().is_empty());
        assert_eq!(stub.cancel_calls(), ids);
    }

    #[tokio::test]
    async fn drop_without_running_requests_cancels_nothing() {
        let stub = StubTransport::responding(HttpResponse::new(201, json!({"success": true})));
        let toaster = Arc::new(RecordingToaster::new());
        let provider = provider(&stub, &toaster);
        {
            let scope = provider.scope(ScopeOptions::default());
            register_user(&scope, payload()).await.unwrap();
        }
        assert!(stub.cancel_calls().is_empty());
    }
}
