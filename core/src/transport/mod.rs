//! Transport seam: executes protocol-level requests.
//!
//! # Design
//! `Transport` is the only async boundary of the pipeline. It must never
//! fail: a cancelled call resolves to `RequestResponse::cancelled`, a call
//! that produced no response resolves to `RequestResponse::failed`. This lets
//! every layer above treat settlement as a plain value.
//!
//! Cancellation is cooperative. Each in-flight request registers a
//! `CancellationToken` under its id in a `CancellationRegistry`; cancelling an
//! id trips the token, and the executing future races its I/O against it.
//! Registrations are removed by a drop guard, so a request that settles (or
//! whose future is dropped) leaves nothing behind.

mod reqwest_transport;
mod stub;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::http::{HttpRequest, RequestId, RequestResponse};
use crate::sync::lock;

pub use reqwest_transport::ReqwestTransport;
pub use stub::{StubReply, StubTransport};

/// Receives upload/download progress in percent (0..=100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Executes HTTP requests and cancels them by id.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request`. Always settles; never panics on network errors.
    async fn execute_request(
        &self,
        request: HttpRequest,
        on_progress: Option<ProgressCallback>,
    ) -> RequestResponse;

    /// Cancel the in-flight request with `id`. Unknown ids are ignored.
    fn cancel_request_by_id(&self, id: &RequestId);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute_request(
        &self,
        request: HttpRequest,
        on_progress: Option<ProgressCallback>,
    ) -> RequestResponse {
        (**self).execute_request(request, on_progress).await
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        (**self).cancel_request_by_id(id)
    }
}

pub(crate) fn report_progress(on_progress: &Option<ProgressCallback>, percent: u8) {
    if let Some(callback) = on_progress {
        callback(percent.min(100));
    }
}

/// Cancellation tokens of the requests a transport currently executes.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    tokens: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as in flight. The registration is released on drop.
    pub fn register(&self, id: RequestId) -> Registration {
        let token = CancellationToken::new();
        lock(&self.tokens).insert(id.clone(), token.clone());
        Registration {
            registry: self.clone(),
            id,
            token,
        }
    }

    /// Trip the token of `id`. Returns `false` if `id` is not in flight.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match lock(&self.tokens).get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, id: &RequestId) -> bool {
        lock(&self.tokens).contains_key(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.tokens).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live registration of one in-flight request.
#[derive(Debug)]
pub struct Registration {
    registry: CancellationRegistry,
    id: RequestId,
    token: CancellationToken,
}

impl Registration {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.registry.tokens).remove(&self.id);
    }
}
