//! Client core for the v1 API.
//!
//! # Overview
//! Turns typed endpoint requests into HTTP requests, executes them through a
//! cancellable `Transport` and classifies the replies into success or error
//! envelopes carrying sanitized, translatable messages.
//!
//! # Design
//! - `Transport` is the only I/O boundary. `ReqwestTransport` talks to the
//!   network, `StubTransport` answers in memory for tests.
//! - `HttpApiV1RequestHandler` injects the bearer token of the current
//!   session and tracks running requests.
//! - `ScopedApiV1RequestHandler` adds middlewares and keeps its own set of
//!   running ids, so cancelling one scope never touches another.
//! - `ApiV1Provider` wires everything from a `ClientConfig` and hands out
//!   `RequestScope`s that cancel their requests when dropped.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api_v1;
pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
mod sync;
pub mod transport;

pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestId, RequestResponse};
pub use session::{AuthenticatedUser, Session, SessionStore, UserData};
pub use transport::{ReqwestTransport, StubTransport, Transport};
