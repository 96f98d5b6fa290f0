//! Typed request pipeline for the v1 API.
//!
//! Endpoints are described by an `EndpointTransformer`, executed by an
//! `ApiV1RequestHandler` and observed by `ApiV1Middleware`s attached to a
//! `ScopedApiV1RequestHandler`.

pub mod auth;
pub mod factory;
pub mod handler;
pub mod messages;
pub mod provider;
pub mod running;
pub mod scoped;
pub mod toaster;
pub mod transformer;
pub mod types;

pub use handler::{AccessTokenFinder, ApiV1RequestHandler, ExecutionSettings, HttpApiV1RequestHandler};
pub use messages::{sanitize_message, ErrorMessageKey, FieldMessage, Message, PathSegment, Severity};
pub use provider::{ApiV1Provider, RequestScope, ScopeOptions};
pub use scoped::{ApiV1Middleware, ScopedApiV1RequestHandler};
pub use toaster::{RecordingToaster, ToastConfig, Toaster, ToasterMiddleware, Translator};
pub use transformer::EndpointTransformer;
pub use types::{
    ApiV1Request, ApiV1RequestResponse, ApiV1Response, Endpoint, EndpointId, ResponseBodyBase,
    ResponseType,
};
