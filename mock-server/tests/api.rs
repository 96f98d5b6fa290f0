use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, RegisterResponse, API_KEY, FORM_ERRORS, USER_ID, USER_WAS_CREATED};
use tower::ServiceExt;

const REGISTER: &str = "/api/v1/auth/register";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- success ---

#[tokio::test]
async fn register_returns_201_with_api_key() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            REGISTER,
            r#"{"gender":"other","username":"alice","email":"a@b.com","password":"secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: RegisterResponse = body_json(resp).await;
    assert!(body.success);
    assert!(body.field_messages.is_empty());
    assert_eq!(body.general_messages.len(), 1);
    assert_eq!(body.general_messages[0].translation.id, USER_WAS_CREATED);
    assert_eq!(body.general_messages[0].severity, "error");
    let data = body.data.unwrap();
    assert_eq!(data.api_key, API_KEY);
    assert_eq!(data.user.id, USER_ID);
    assert_eq!(data.user.username, "alice");
}

#[tokio::test]
async fn general_message_ids_are_fresh_uuids() {
    let request = || {
        json_request(
            "POST",
            REGISTER,
            r#"{"gender":"female","username":"bea","email":"b@c.de","password":"pw"}"#,
        )
    };
    let first: RegisterResponse = body_json(app().oneshot(request()).await.unwrap()).await;
    let second: RegisterResponse = body_json(app().oneshot(request()).await.unwrap()).await;

    let first_id = &first.general_messages[0].id;
    assert!(uuid::Uuid::parse_str(first_id).is_ok());
    assert_ne!(first_id, &second.general_messages[0].id);
}

// --- validation ---

#[tokio::test]
async fn invalid_form_returns_400_with_field_messages() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            REGISTER,
            r#"{"gender":"bogus","username":"","email":"not-an-email","password":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
    assert_eq!(body["generalMessages"][0]["translation"]["id"], FORM_ERRORS);

    let fields: Vec<(String, String, String)> = body["fieldMessages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["path"][0].as_str().unwrap().to_string(),
                m["message"]["id"].as_str().unwrap().to_string(),
                m["message"]["translation"]["id"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let expected = [
        ("gender", "message-id-1", "api.v1.invalidValue"),
        ("username", "message-id-2", "api.v1.required"),
        ("email", "message-id-3", "api.v1.invalidEmail"),
        ("password", "message-id-4", "api.v1.required"),
    ];
    assert_eq!(fields.len(), expected.len());
    for (got, want) in fields.iter().zip(expected) {
        assert_eq!((got.0.as_str(), got.1.as_str(), got.2.as_str()), want);
    }
}

#[tokio::test]
async fn malformed_json_is_a_whole_body_violation() {
    let resp = app()
        .oneshot(json_request("POST", REGISTER, "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: RegisterResponse = body_json(resp).await;
    assert_eq!(body.field_messages.len(), 1);
    assert!(body.field_messages[0].path.is_empty());
    assert_eq!(body.field_messages[0].message.translation.id, "api.v1.invalidValue");
}

// --- routing ---

#[tokio::test]
async fn register_rejects_get() {
    let resp = app()
        .oneshot(Request::builder().uri(REGISTER).body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/auth/login", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
