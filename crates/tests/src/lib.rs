//! Shared fixtures for the end-to-end call flow tests.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ivr_api::config::{ApiConfig, RecordSource};
use ivr_api::telephony::{CallOriginator, PlacedCall};
use ivr_api::{build_app, build_app_with};
use ivr_core::DemoIdentifiers;
use ivr_storage::Store;
use tower::ServiceExt;

pub fn records_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/records.json")
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        bind: "127.0.0.1:0".to_string(),
        record_source: RecordSource::JsonFile(records_path()),
        demo_ids: DemoIdentifiers::default(),
        api_key: None,
        telephony: None,
    }
}

pub async fn app() -> Router {
    build_app(test_config()).await.expect("app should build")
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

/// Sends one request and returns status, content type and body text.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

/// Stands in for the provider's call origination API.
pub struct FakeOriginator {
    pub fail: bool,
}

#[async_trait]
impl CallOriginator for FakeOriginator {
    async fn originate(&self) -> Result<PlacedCall> {
        if self.fail {
            return Err(anyhow!("provider returned 401"));
        }
        Ok(PlacedCall {
            call_sid: format!("CA{}", uuid::Uuid::new_v4().simple()),
            status: "queued".to_string(),
        })
    }
}

pub async fn app_with_originator(api_key: Option<&str>, fail: bool) -> Router {
    let mut config = test_config();
    config.api_key = api_key.map(ToString::to_string);
    let store = Store::json_file(records_path())
        .await
        .expect("fixture records should load");
    build_app_with(&config, store, Some(Arc::new(FakeOriginator { fail })))
}
