//! # notex-api
//!
//! HTTP surface for notex: note CRUD, live change events over SSE, and a
//! health probe. The binary in `main.rs` wires configuration, logging, and
//! storage around [`build_router`]; integration tests call it directly.

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use notex_core::{BroadcastRegistry, ChangeNotifier, NoteRepository, NoteService};

pub use config::{parse_allowed_origins, ServerConfig, SseConfig, StorageBackend};
pub use error::ApiError;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shortest accepted SSE keep-alive period.
const MIN_KEEPALIVE: Duration = Duration::from_millis(10);

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: NoteService,
    pub registry: BroadcastRegistry,
    /// Interval between SSE keep-alive comments.
    pub keepalive: Duration,
}

impl AppState {
    /// Wire a repository to a fresh registry sized by `sse`.
    pub fn new(repo: Arc<dyn NoteRepository>, sse: SseConfig) -> Self {
        let registry = BroadcastRegistry::new(sse.buffer, sse.stall_timeout);
        let service = NoteService::new(repo, ChangeNotifier::new(registry.clone()));
        Self {
            service,
            registry,
            keepalive: sse.keepalive.max(MIN_KEEPALIVE),
        }
    }
}

/// Build the application router with middleware.
pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let allowed_origins = parse_allowed_origins(allowed_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        // Must precede `/notes/:id`.
        .route("/notes/events", get(handlers::events::note_events))
        .route(
            "/notes/:id",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::CACHE_CONTROL])
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
