//! Customer status page routes
//!
//! Scoped by the entry's personal token. A customer sees their own status,
//! position and estimate, can cancel while still active, and can subscribe
//! to their own refresh stream. Nothing about other entries leaks here.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/status", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{token}", get(handler::status))
        .route("/{token}/cancel", post(handler::cancel))
        .route("/{token}/events", get(handler::events))
}
