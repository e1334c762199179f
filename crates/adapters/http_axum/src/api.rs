//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod boxes;
pub mod sse;
pub mod status;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/boxes", get(boxes::list))
        .route("/boxes/{name}", get(boxes::get))
        .route("/status", get(status::get))
        .route("/events/stream", get(sse::stream))
}
