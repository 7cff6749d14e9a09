//! Transfer API server for ssync spaces.
//!
//! A space is a named, sandboxed directory root. Every request names a
//! virtual path (`<space>/<subpath>`) which is resolved against the space
//! map, checked for containment and authorization, and only then touches
//! the filesystem.

use anyhow::Context;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod spaces;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

/// Bind `addr` and serve the transfer API until ctrl-c, letting in-flight
/// requests drain.
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received, draining connections");
        })
        .await?;
    Ok(())
}
