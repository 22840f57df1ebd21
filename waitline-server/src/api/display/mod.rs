//! Public display board routes
//!
//! Scoped by the list's opaque display token; no authentication. Returns
//! only what the list's display options allow. Unknown token and disabled
//! display both answer 404 so the token reveals nothing.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/display", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{token}", get(handler::board))
        .route("/{token}/events", get(handler::events))
}
