#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use polyglot_tutor::config::Config;
use polyglot_tutor::content::Catalog;
use polyglot_tutor::routes;
use polyglot_tutor::state::AppState;

/// Config with every upstream switched off; tests opt in per service.
pub fn test_config() -> Config {
    Config {
        openai_api_key: None,
        openai_model: "gpt-3.5-turbo".to_string(),
        openai_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        google_translate_api_key: None,
        google_translate_api_url: "http://127.0.0.1:9/language/translate/v2".to_string(),
        libretranslate_url: None,
        libretranslate_api_key: None,
        translate_timeout: Duration::from_secs(2),
        session_ttl: Duration::from_secs(3600),
        max_sessions: 100,
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

pub fn create_test_app(config: Config) -> Router {
    let catalog = Catalog::load_embedded().expect("Embedded catalog should load");
    routes::router(AppState::new(config, catalog))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body should be JSON")
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json_auth(uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Log in and return the bearer token.
pub async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(app, post_json("/api/session", serde_json::json!({"email": email}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().expect("token in response").to_string()
}
