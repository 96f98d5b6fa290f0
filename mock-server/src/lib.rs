use std::sync::LazyLock;

use axum::{body::Bytes, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const REQUIRED: &str = "api.v1.required";
pub const INVALID_VALUE: &str = "api.v1.invalidValue";
pub const INVALID_EMAIL: &str = "api.v1.invalidEmail";
pub const FORM_ERRORS: &str = "api.v1.formErrors";
pub const USER_WAS_CREATED: &str = "api.v1.userWasCreated";

pub const API_KEY: &str = "foo";
pub const USER_ID: &str = "fbfe874c-ea8f-4cc1-bd4e-f07bedc30487";

const GENDERS: [&str; 3] = ["female", "male", "other"];

static EMAIL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}$",
    )
    .expect("EMAIL_REGEX is a valid regex pattern")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub severity: String,
    pub translation: Translation,
}

impl Message {
    fn error(id: String, key: &str) -> Self {
        Self {
            id,
            severity: "error".to_string(),
            translation: Translation { id: key.to_string() },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub path: Vec<String>,
    pub message: Message,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub api_key: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub general_messages: Vec<Message>,
    pub field_messages: Vec<FieldMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RegisteredUser>,
}

/// A failed check: the offending field (empty for the whole body) and its key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub path: Vec<String>,
    pub key: &'static str,
}

impl Violation {
    fn field(name: &str, key: &'static str) -> Self {
        Self {
            path: vec![name.to_string()],
            key,
        }
    }
}

pub fn app() -> Router {
    Router::new().route("/api/v1/auth/register", post(register))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Checks a registration body and returns the accepted username.
///
/// Fields are checked in the order `gender`, `username`, `email`,
/// `password`, with at most one violation per field.
pub fn validate(body: &Value) -> Result<String, Vec<Violation>> {
    let Some(fields) = body.as_object() else {
        return Err(vec![Violation {
            path: Vec::new(),
            key: INVALID_VALUE,
        }]);
    };
    let text = |name: &str| fields.get(name).and_then(Value::as_str);

    let mut violations = Vec::new();
    match text("gender") {
        Some(gender) if GENDERS.contains(&gender) => {}
        _ => violations.push(Violation::field("gender", INVALID_VALUE)),
    }
    for name in ["username", "email", "password"] {
        let key = match text(name) {
            None => Some(INVALID_VALUE),
            Some(value) if name == "email" && !EMAIL_REGEX.is_match(value) => Some(INVALID_EMAIL),
            Some(value) if value.trim().is_empty() => Some(REQUIRED),
            Some(_) => None,
        };
        if let Some(key) = key {
            violations.push(Violation::field(name, key));
        }
    }

    match (violations.is_empty(), text("username")) {
        (true, Some(username)) => Ok(username.to_string()),
        _ => Err(violations),
    }
}

async fn register(body: Bytes) -> (StatusCode, Json<RegisterResponse>) {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    tracing::info!(%body, "POST /api/v1/auth/register");

    match validate(&body) {
        Ok(username) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                success: true,
                general_messages: vec![Message::error(Uuid::new_v4().to_string(), USER_WAS_CREATED)],
                field_messages: Vec::new(),
                data: Some(RegisteredUser {
                    api_key: API_KEY.to_string(),
                    user: User {
                        id: USER_ID.to_string(),
                        username,
                    },
                }),
            }),
        ),
        Err(violations) => (
            StatusCode::BAD_REQUEST,
            Json(RegisterResponse {
                success: false,
                general_messages: vec![Message::error(Uuid::new_v4().to_string(), FORM_ERRORS)],
                field_messages: violations
                    .into_iter()
                    .enumerate()
                    .map(|(i, violation)| FieldMessage {
                        path: violation.path,
                        message: Message::error(format!("message-id-{}", i + 1), violation.key),
                    })
                    .collect(),
                data: None,
            }),
        ),
    }
}
