//! `POST /auth/register`.
//!
//! Creates a user account. The server answers 201 with an API key and the
//! new user on success, 400 with field messages on validation failure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api_v1::factory::{create_http_request_from_request, HttpRequestOptions};
use crate::api_v1::handler::{ApiV1RequestHandler, ExecutionSettings};
use crate::api_v1::transformer::EndpointTransformer;
use crate::api_v1::types::{ApiV1Request, ApiV1RequestResponse, Endpoint};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::session::AuthenticatedUser;

pub const REGISTER_USER_PATH: &str = "/auth/register";
pub const REGISTER_USER_SUCCESS_STATUS: u16 = 201;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Female, Gender::Male, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form input for registration.
///
/// `gender` is the raw form value; the server is the one validating it
/// against `Gender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserPayload {
    pub gender: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterUserPayload {
    pub fn new(gender: Gender, username: &str, email: &str, password: &str) -> Self {
        Self {
            gender: gender.as_str().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

/// Endpoint data of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserData {
    pub data: AuthenticatedUser,
}

pub type RegisterUserRequestResponse = ApiV1RequestResponse<RegisterUserPayload, RegisterUserData>;

#[derive(Debug, Clone)]
pub struct RegisterUserTransformer {
    endpoint: Endpoint,
}

impl Default for RegisterUserTransformer {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new(HttpMethod::Post, REGISTER_USER_PATH, REGISTER_USER_SUCCESS_STATUS),
        }
    }
}

impl RegisterUserTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_request(&self, payload: RegisterUserPayload) -> ApiV1Request<RegisterUserPayload> {
        ApiV1Request::new(self.endpoint.id.clone(), payload)
    }
}

impl EndpointTransformer for RegisterUserTransformer {
    type Payload = RegisterUserPayload;
    type Data = RegisterUserData;

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn create_http_request(
        &self,
        request: &ApiV1Request<RegisterUserPayload>,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_value(&request.payload)?;
        Ok(create_http_request_from_request(
            request,
            HttpRequestOptions::default().with_body(body),
        ))
    }
}

/// Register a new user through `handler`.
pub async fn register_user<H: ApiV1RequestHandler>(
    handler: &H,
    payload: RegisterUserPayload,
) -> Result<RegisterUserRequestResponse, ApiError> {
    let transformer = RegisterUserTransformer::new();
    let request = transformer.create_request(payload);
    handler
        .execute_request(ExecutionSettings::new(request, &transformer))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_v1::handler::HttpApiV1RequestHandler;
    use crate::api_v1::messages::ErrorMessageKey;
    use crate::api_v1::types::ResponseType;
    use crate::http::{HttpResponse, RequestResponse};
    use crate::transport::StubTransport;
    use serde_json::json;

    fn alice() -> RegisterUserPayload {
        RegisterUserPayload::new(Gender::Other, "alice", "a@b.com", "secret")
    }

    #[test]
    fn http_request_carries_payload_as_body() {
        let transformer = RegisterUserTransformer::new();
        let request = transformer.create_request(alice());
        let http_request = transformer.create_http_request(&request).unwrap();

        assert_eq!(http_request.method, HttpMethod::Post);
        assert_eq!(http_request.url, "/auth/register");
        assert_eq!(http_request.id, request.id);
        assert_eq!(
            http_request.body,
            json!({"gender": "other", "username": "alice", "email": "a@b.com", "password": "secret"})
        );
    }

    #[test]
    fn created_response_decodes_user() {
        let transformer = RegisterUserTransformer::new();
        let request = transformer.create_request(alice());
        let http_request = transformer.create_http_request(&request).unwrap();
        let rr = transformer.create_request_response(
            RequestResponse::completed(
                http_request,
                HttpResponse::new(
                    201,
                    json!({
                        "success": true,
                        "generalMessages": [{"id": "g", "severity": "error", "translation": {"id": "api.v1.userWasCreated"}}],
                        "fieldMessages": [],
                        "data": {"apiKey": "foo", "user": {"id": "u1", "username": "alice"}}
                    }),
                ),
            ),
            request,
        );

        let response = rr.response.as_ref().unwrap();
        assert_eq!(response.response_type(), ResponseType::Success);
        assert_eq!(response.general_messages()[0].key(), ErrorMessageKey::UserWasCreated);
        let data = rr.data().unwrap();
        assert_eq!(data.data.api_key, "foo");
        assert_eq!(data.data.user.username, "alice");
    }

    #[tokio::test]
    async fn bad_request_is_an_error_envelope() {
        let stub = StubTransport::responding(HttpResponse::new(
            400,
            json!({
                "success": false,
                "generalMessages": [],
                "fieldMessages": [{
                    "path": ["username"],
                    "message": {"id": "message-id-1", "severity": "error", "translation": {"id": "api.v1.required"}}
                }]
            }),
        ));
        let handler = HttpApiV1RequestHandler::new(stub.clone(), || None, "http://api.test/api/v1");

        let rr = register_user(&handler, RegisterUserPayload::new(Gender::Male, "", "a@b.com", "pw"))
            .await
            .unwrap();

        assert_eq!(stub.sent_requests()[0].url, "http://api.test/api/v1/auth/register");
        assert!(!rr.is_success());
        assert!(rr.data().is_none());
        let field_messages = rr.field_messages();
        assert_eq!(field_messages.len(), 1);
        assert!(field_messages[0].is_for_field("username"));
        assert_eq!(field_messages[0].message.key(), ErrorMessageKey::Required);
    }

    #[test]
    fn gender_round_trips_as_lowercase() {
        for gender in Gender::ALL {
            assert_eq!(serde_json::to_value(gender).unwrap(), json!(gender.as_str()));
        }
    }
}
