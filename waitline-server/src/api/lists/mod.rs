//! Waitlist API module
//!
//! Operator-facing list management: configuration, the live entries table,
//! derived stats, clear, and the list-topic SSE stream. Every route requires
//! a bearer JWT; the extracted `business_id` scopes all storage access.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/lists", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_all).post(handler::create))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/clear", post(handler::clear))
        .route("/{id}/entries", get(handler::entries).post(handler::check_in))
        .route("/{id}/stats", get(handler::stats))
        .route("/{id}/events", get(handler::events))
}
