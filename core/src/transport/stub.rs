//! Scripted in-process `Transport`.
//!
//! # Design
//! `StubTransport` answers each request through a responder closure instead
//! of the network, which makes request lifecycles (in flight, cancelled,
//! failed) reproducible without a server. It shares `CancellationRegistry`
//! with the real transport, so cancellation behaves the same way.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::http::{HttpRequest, HttpResponse, RequestId, RequestResponse};
use crate::sync::lock;
use crate::transport::{report_progress, CancellationRegistry, ProgressCallback, Transport};

/// What the stub does with one request.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Settle immediately with this response.
    Respond(HttpResponse),
    /// Settle with this response after a delay, unless cancelled first.
    RespondAfter(Duration, HttpResponse),
    /// Settle without a response, as if the connection failed.
    Fail,
    /// Stay in flight until cancelled.
    Hang,
}

type Responder = Arc<dyn Fn(&HttpRequest) -> StubReply + Send + Sync>;

#[derive(Clone)]
pub struct StubTransport {
    responder: Responder,
    registry: CancellationRegistry,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
    cancel_calls: Arc<Mutex<Vec<RequestId>>>,
}

impl StubTransport {
    pub fn new(responder: impl Fn(&HttpRequest) -> StubReply + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            registry: CancellationRegistry::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            cancel_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every request with a clone of `response`.
    pub fn responding(response: HttpResponse) -> Self {
        Self::new(move |_| StubReply::Respond(response.clone()))
    }

    /// Requests received so far, in arrival order.
    pub fn sent_requests(&self) -> Vec<HttpRequest> {
        lock(&self.sent).clone()
    }

    /// Every id passed to `cancel_request_by_id`, known or not.
    pub fn cancel_calls(&self) -> Vec<RequestId> {
        lock(&self.cancel_calls).clone()
    }

    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_in_flight(&self, id: &RequestId) -> bool {
        self.registry.is_registered(id)
    }

    /// Wait until at least `count` requests are in flight.
    pub async fn wait_for_in_flight(&self, count: usize) {
        while self.in_flight() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl std::fmt::Debug for StubTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubTransport")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute_request(
        &self,
        request: HttpRequest,
        on_progress: Option<ProgressCallback>,
    ) -> RequestResponse {
        let registration = self.registry.register(request.id.clone());
        lock(&self.sent).push(request.clone());
        report_progress(&on_progress, 0);

        let reply = (self.responder)(&request);
        let token = registration.token();
        let response = match reply {
            StubReply::Respond(response) if !token.is_cancelled() => Some(response),
            StubReply::Respond(_) => None,
            StubReply::RespondAfter(delay, response) => tokio::select! {
                _ = token.cancelled() => None,
                _ = tokio::time::sleep(delay) => Some(response),
            },
            StubReply::Fail => return RequestResponse::failed(request),
            StubReply::Hang => {
                token.cancelled().await;
                None
            }
        };

        match response {
            Some(response) => {
                report_progress(&on_progress, 100);
                RequestResponse::completed(request, response)
            }
            None => RequestResponse::cancelled(request),
        }
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        lock(&self.cancel_calls).push(id.clone());
        self.registry.cancel(id);
    }
}
