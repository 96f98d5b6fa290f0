//! Toast notifications for failed requests.
//!
//! `Toaster` and `Translator` are the seams to the UI: the middleware decides
//! what to show, the UI decides how. Cancelled requests never toast.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api_v1::messages::Severity;
use crate::api_v1::scoped::ApiV1Middleware;
use crate::api_v1::types::{ResponseType, SettledRequest};
use crate::config::DEFAULT_TOAST_AUTO_HIDE;
use crate::sync::lock;

/// Translation key shown when a request settled without any response.
pub const CONNECTION_FAILED_KEY: &str = "core.util.connectionToServerFailed";

/// Opaque handle of a displayed toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastConfig {
    pub severity: Severity,
    pub auto_hide_duration: Duration,
    pub transition_duration: Duration,
    pub expandable_content: Option<String>,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            severity: Severity::Success,
            auto_hide_duration: Duration::from_millis(1000),
            transition_duration: Duration::from_millis(300),
            expandable_content: None,
        }
    }
}

pub trait Toaster: Send + Sync {
    fn show_message(&self, content: &str, config: ToastConfig) -> ToastHandle;
}

pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// Shows the general messages of error responses and a connection-failure
/// notice for requests that got no response.
pub struct ToasterMiddleware {
    toaster: Arc<dyn Toaster>,
    translator: Arc<dyn Translator>,
    auto_hide: Duration,
}

impl ToasterMiddleware {
    pub fn new(toaster: Arc<dyn Toaster>, translator: Arc<dyn Translator>) -> Self {
        Self {
            toaster,
            translator,
            auto_hide: DEFAULT_TOAST_AUTO_HIDE,
        }
    }

    pub fn with_auto_hide(mut self, auto_hide: Duration) -> Self {
        self.auto_hide = auto_hide;
        self
    }

    fn show(&self, content: &str, severity: Severity) {
        self.toaster.show_message(
            content,
            ToastConfig {
                severity,
                auto_hide_duration: self.auto_hide,
                ..ToastConfig::default()
            },
        );
    }
}

impl ApiV1Middleware for ToasterMiddleware {
    fn on_request_response(&self, settled: &SettledRequest<'_>) {
        if settled.has_request_been_cancelled {
            return;
        }
        let Some(response) = settled.response else {
            self.show(&self.translator.translate(CONNECTION_FAILED_KEY), Severity::Error);
            return;
        };
        if response.response_type != ResponseType::Error {
            return;
        }
        for message in &response.body.general_messages {
            let text = self.translator.translate(message.key().as_str());
            self.show(&format!("Error: {text}"), message.severity);
        }
    }
}

/// A toast recorded by `RecordingToaster`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownToast {
    pub handle: ToastHandle,
    pub content: String,
    pub config: ToastConfig,
}

/// `Toaster` that keeps every toast in memory, for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingToaster {
    next: AtomicU64,
    shown: Mutex<Vec<ShownToast>>,
}

impl RecordingToaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<ShownToast> {
        lock(&self.shown).clone()
    }
}

impl Toaster for RecordingToaster {
    fn show_message(&self, content: &str, config: ToastConfig) -> ToastHandle {
        let handle = ToastHandle(self.next.fetch_add(1, Ordering::Relaxed));
        lock(&self.shown).push(ShownToast {
            handle,
            content: content.to_string(),
            config,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_v1::messages::{ErrorMessageKey, Message};
    use crate::api_v1::types::{EndpointId, RequestInfo, ResponseBodyBase, SettledResponse};
    use crate::http::{HttpMethod, RequestId};

    fn middleware(toaster: &Arc<RecordingToaster>) -> ToasterMiddleware {
        let translator: Arc<dyn Translator> = Arc::new(|key: &str| format!("t({key})"));
        ToasterMiddleware::new(toaster.clone(), translator)
    }

    fn settle(
        mw: &ToasterMiddleware,
        response: Option<(ResponseType, &ResponseBodyBase)>,
        cancelled: bool,
    ) {
        let id = RequestId::new();
        let endpoint = EndpointId::new(HttpMethod::Post, "/auth/register");
        mw.on_request_response(&SettledRequest {
            request: RequestInfo {
                id: &id,
                endpoint_id: &endpoint,
            },
            response: response.map(|(response_type, body)| SettledResponse {
                response_type,
                status: 400,
                body,
            }),
            has_request_been_cancelled: cancelled,
        });
    }

    fn body() -> ResponseBodyBase {
        ResponseBodyBase {
            success: false,
            field_messages: Vec::new(),
            general_messages: vec![
                Message::new("g1", Severity::Error, ErrorMessageKey::FormErrors),
                Message::new("g2", Severity::Warning, ErrorMessageKey::InvalidValue),
            ],
        }
    }

    #[test]
    fn error_response_toasts_each_general_message() {
        let toaster = Arc::new(RecordingToaster::new());
        let body = body();
        settle(&middleware(&toaster), Some((ResponseType::Error, &body)), false);

        let shown = toaster.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].content, "Error: t(api.v1.formErrors)");
        assert_eq!(shown[0].config.severity, Severity::Error);
        assert_eq!(shown[0].config.auto_hide_duration, Duration::from_millis(5000));
        assert_eq!(shown[1].config.severity, Severity::Warning);
        assert_ne!(shown[0].handle, shown[1].handle);
    }

    #[test]
    fn missing_response_toasts_connection_failure() {
        let toaster = Arc::new(RecordingToaster::new());
        settle(&middleware(&toaster), None, false);

        let shown = toaster.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].content, "t(core.util.connectionToServerFailed)");
        assert_eq!(shown[0].config.severity, Severity::Error);
    }

    #[test]
    fn cancelled_and_successful_requests_stay_silent() {
        let toaster = Arc::new(RecordingToaster::new());
        let mw = middleware(&toaster);
        let body = body();
        settle(&mw, None, true);
        settle(&mw, Some((ResponseType::Success, &body)), false);
        assert!(toaster.shown().is_empty());
    }

    #[test]
    fn default_config_matches_plain_toasts() {
        let config = ToastConfig::default();
        assert_eq!(config.severity, Severity::Success);
        assert_eq!(config.auto_hide_duration, Duration::from_millis(1000));
        assert_eq!(config.transition_duration, Duration::from_millis(300));
    }
}
