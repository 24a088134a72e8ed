//! Minimal liveness endpoint for external health checks.

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tracing::{error, info};

/// Serve `GET /` → `200 "alive"` on a background task.
pub fn spawn(addr: SocketAddr) {
    tokio::spawn(async move {
        let app = Router::new().route("/", get(|| async { "alive" }));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                info!("Liveness endpoint listening on {}", addr);
                if let Err(e) = axum::serve(listener, app).await {
                    error!("Liveness endpoint error: {}", e);
                }
            }
            Err(e) => error!("Failed to bind liveness endpoint on {}: {}", addr, e),
        }
    });
}
