//! `Transport` backed by `reqwest`.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestId, RequestResponse};
use crate::transport::{report_progress, CancellationRegistry, ProgressCallback, Transport};

/// Executes requests over the network with a shared `reqwest::Client`.
///
/// Progress is coarse: 0 when the request is dispatched, 100 once the full
/// response body has been read.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    registry: CancellationRegistry,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            registry: CancellationRegistry::new(),
        }
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(query) = &request.query_parameters {
            builder = builder.query(query);
        }
        if !request.body.is_null() {
            builder = builder.json(&request.body);
        }
        builder
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body: HttpResponse::body_from_text(&text),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute_request(
        &self,
        request: HttpRequest,
        on_progress: Option<ProgressCallback>,
    ) -> RequestResponse {
        let registration = self.registry.register(request.id.clone());
        report_progress(&on_progress, 0);

        let outcome = tokio::select! {
            _ = registration.token().cancelled() => None,
            result = self.send(&request) => Some(result),
        };

        match outcome {
            None => {
                debug!(request_id = %request.id, url = %request.url, "request cancelled");
                RequestResponse::cancelled(request)
            }
            Some(Ok(response)) => {
                report_progress(&on_progress, 100);
                RequestResponse::completed(request, response)
            }
            Some(Err(err)) => {
                warn!(request_id = %request.id, url = %request.url, error = %err, "request failed without response");
                RequestResponse::failed(request)
            }
        }
    }

    fn cancel_request_by_id(&self, id: &RequestId) {
        if self.registry.cancel(id) {
            debug!(request_id = %id, "cancellation requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::with_client(reqwest::Client::new())
    }

    #[test]
    fn build_maps_method_headers_query_and_body() {
        let mut query = BTreeMap::new();
        query.insert("offset".to_string(), "10".to_string());
        let request = HttpRequest::new(HttpMethod::Patch, "http://localhost:9000/api/v1/things")
            .with_header("Authorization", "Bearer t")
            .with_query_parameters(query)
            .with_body(serde_json::json!({"a": 1}));

        let built = transport().build(&request).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::PATCH);
        assert_eq!(built.url().as_str(), "http://localhost:9000/api/v1/things?offset=10");
        assert_eq!(built.headers()["authorization"], "Bearer t");
        assert_eq!(built.headers()["content-type"], "application/json");
        assert_eq!(built.body().unwrap().as_bytes().unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn build_omits_null_body() {
        let request = HttpRequest::new(HttpMethod::Get, "http://localhost:9000/x");
        let built = transport().build(&request).build().unwrap();
        assert!(built.body().is_none());
        assert!(built.headers().get("content-type").is_none());
    }

    #[tokio::test]
    async fn unreachable_host_settles_as_network_failure() {
        // Port 9 (discard) on loopback is not expected to accept connections.
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/unreachable");
        let rr = transport().execute_request(request, None).await;
        assert!(rr.is_network_failure());
    }

    #[tokio::test]
    async fn cancel_unknown_id_does_nothing() {
        let transport = transport();
        transport.cancel_request_by_id(&RequestId::new());
        assert_eq!(transport.in_flight(), 0);
    }
}
