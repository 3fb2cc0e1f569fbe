//! HTTP service for a single todo list backed by a document store.
//!
//! # Overview
//! `app` builds the axum router over an [`AppState`] that carries the store
//! gateway. `TodoServer` in [`lifecycle`] binds it and runs it until a
//! shutdown signal, then drains within a bounded grace window.
//!
//! # Design
//! - The store is injected: `main` picks MongoDB or the in-memory store,
//!   wraps it in a [`TodoGateway`] and hands it to the router state. Tests do
//!   the same with fakes.
//! - Every request gets an `x-request-id` (generated unless supplied), a
//!   tracing span, and an overall timeout.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod lifecycle;
pub mod mongo;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::{get, put};
use axum::Router;
use todo_core::DocumentStore;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::{ConfigError, ServerConfig, StoreBackend};
pub use error::ApiError;
pub use gateway::TodoGateway;
pub use lifecycle::{DrainOutcome, LifecycleState, ServerError, TodoServer};
pub use mongo::MongoStore;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Default bound on a whole request, matching a 60 s read/write window.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: TodoGateway,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, store_timeout: Duration) -> Self {
        Self {
            gateway: TodoGateway::new(store, store_timeout),
        }
    }
}

pub fn app(state: AppState) -> Router {
    app_with_timeout(state, DEFAULT_REQUEST_TIMEOUT)
}

/// Builds the router with an overall bound on each request. Keep
/// `request_timeout` longer than the store timeout, otherwise a slow store is
/// cut off with a bare 408 before the gateway can answer with a 504 envelope.
pub fn app_with_timeout(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::home_redirect))
        .route("/home", get(handlers::home))
        .route("/todo", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todo/", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todo/{id}", put(handlers::update_todo).delete(handlers::delete_todo))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id
            )
        }))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, UuidRequestId))
}

/// Stamps requests that arrive without an id with a random UUID.
#[derive(Debug, Clone, Copy, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
