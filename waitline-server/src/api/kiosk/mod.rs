//! Kiosk self check-in route
//!
//! Write path behind the display token. 404 unless the list has its kiosk
//! enabled; validation follows the list's configuration exactly like an
//! operator check-in.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/kiosk", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/{token}/check-in", post(handler::check_in))
}
