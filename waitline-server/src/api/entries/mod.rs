//! Entry API module
//!
//! Operator transitions on individual entries (call, seat, no-show,
//! archive), edits, and manual notification retry.

mod handler;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/entries", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", put(handler::update))
        .route("/{id}/call", post(handler::call))
        .route("/{id}/seat", post(handler::seat))
        .route("/{id}/no-show", post(handler::no_show))
        .route("/{id}/archive", post(handler::archive))
        .route(
            "/{id}/notifications/{channel}/retry",
            post(handler::retry_notification),
        )
}
