//! Provider webhook routes
//!
//! Delivery callbacks from the messaging gateway. Unknown message ids and
//! repeated callbacks are acknowledged without effect, so the provider
//! never retries forever over our state.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/webhooks", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/delivery", post(handler::delivery))
}
