//! HTTP handlers for notex-api.

pub mod events;
pub mod notes;

/// Liveness probe. Never touches persistence.
pub async fn health() -> &'static str {
    "OK"
}
