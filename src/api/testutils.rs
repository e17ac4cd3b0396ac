//! In-process HTTP test harness

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    config::{AppConfig, RunMode},
    repository::{sqlite::SqliteStore, Repository},
    services::Services,
    AppState,
};

use super::create_router;

pub(crate) const TEST_PEER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50000);

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Value::Null` for an empty body
    pub body: Value,
}

pub(crate) struct TestContext {
    store: SqliteStore,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub(crate) async fn production() -> Self {
        let config = AppConfig {
            environment: RunMode::Production,
            ..AppConfig::default()
        };
        Self::with_config(config).await
    }

    pub(crate) async fn with_config(config: AppConfig) -> Self {
        let store = SqliteStore::connect().await;
        let repository = Repository::from_store(Arc::new(store.clone()));
        let state = AppState {
            config: Arc::new(config),
            services: Arc::new(Services::new(repository)),
        };
        Self {
            store,
            app: create_router(state),
        }
    }

    pub(crate) async fn close_store(&self) {
        self.store.pool.close().await;
    }

    pub(crate) async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        match body {
            Some(body) => {
                self.send_raw(method, uri, "application/json", serde_json::to_vec(&body).unwrap())
                    .await
            }
            None => self.dispatch(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await,
        }
    }

    pub(crate) async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        self.dispatch(request).await
    }

    /// Send `request` as if it came from `TEST_PEER` unless it names its own peer
    pub(crate) async fn dispatch(&self, mut request: Request<Body>) -> TestResponse {
        if request.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
            request.extensions_mut().insert(ConnectInfo(TEST_PEER));
        }
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, headers, body }
    }

    /// Create a user through the API and return its id
    pub(crate) async fn create_user(&self, name: &str) -> i64 {
        let response = self
            .send(Method::POST, "/users", Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(StatusCode::CREATED, response.status);
        response.body["id"].as_i64().unwrap()
    }

    /// Create a book through the API and return its id
    pub(crate) async fn create_book(&self, name: &str) -> i64 {
        let response = self
            .send(Method::POST, "/books", Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(StatusCode::CREATED, response.status);
        response.body["id"].as_i64().unwrap()
    }

    pub(crate) async fn borrow(&self, user_id: i64, book_id: i64) -> TestResponse {
        self.send(Method::POST, &format!("/users/{}/borrow/{}", user_id, book_id), None)
            .await
    }

    pub(crate) async fn return_book(&self, user_id: i64, book_id: i64, body: Value) -> TestResponse {
        self.send(
            Method::POST,
            &format!("/users/{}/return/{}", user_id, book_id),
            Some(body),
        )
        .await
    }
}
