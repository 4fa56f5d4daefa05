//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock index API injected, enabling E2E testing of the view models
//! without a real upstream.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mirrorview_core::{
    config::{ApiConfig, CacheConfig, ListConfig, ServerConfig},
    testing::MockIndexApi,
    Config, IndexApi, MirrorType,
};
use mirrorview_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use mirrorview_core::testing::fixtures;

/// Test fixture for E2E testing with a mock index API.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_mirror_list() {
///     let fixture = TestFixture::new().await;
///     fixture.api.set_mirror_list("nyaa", fixtures::mirror_items(3)).await;
///
///     let response = fixture.get("/m/nyaa").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock index API - configure responses and failures
    pub api: Arc<MockIndexApi>,
    /// Shared state, for inspecting the cache
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// `Location` header of redirects
    pub location: Option<String>,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Retries after the first failed attempt
    pub retry: u32,
    pub retry_delay_ms: u64,
    /// Register the default "nyaa" and "sukebei" mirrors
    pub with_mirrors: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            retry: 1,
            retry_delay_ms: 5,
            with_mirrors: true,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let api = Arc::new(MockIndexApi::new());
        if test_config.with_mirrors {
            api.set_mirrors(vec![
                fixtures::mirror("nyaa", MirrorType::Normal, false),
                fixtures::mirror("sukebei", MirrorType::Adult, false),
                fixtures::mirror("backup", MirrorType::Normal, true),
            ])
            .await;
        }

        let config = Config {
            api: ApiConfig {
                url: "http://index.invalid".to_string(),
                timeout_secs: 5,
                user_agent: "mirrorview-test".to_string(),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                cors_allow_everyone: false,
            },
            cache: CacheConfig {
                retry: test_config.retry,
                retry_delay_ms: test_config.retry_delay_ms,
                ..CacheConfig::default()
            },
            list: ListConfig::default(),
        };

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&api) as Arc<dyn IndexApi>,
        ));
        let router = create_router(Arc::clone(&state));

        Self { router, api, state }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// GET returning the raw body text (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            body,
            location,
        }
    }
}
