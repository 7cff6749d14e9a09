//! Route configuration.

use axum::Router;
use axum::middleware;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;

/// Create the transfer API router.
///
/// Every route sits behind the credential middleware; unauthenticated
/// callers are rejected before any handler logic runs.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dirs/list", get(handlers::get_list))
        .route("/api/dirs/tree", get(handlers::get_tree))
        .route("/api/files", get(handlers::get_file))
        .route("/api/files/new", put(handlers::put_new_file))
        .route("/api/files/matches", get(handlers::get_matches))
        .route("/api/files/stat", get(handlers::get_stat))
        .route("/api/spaces", get(handlers::get_spaces))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
