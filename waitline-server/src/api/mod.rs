//! API routes
//!
//! # Structure
//!
//! - [`lists`] - operator list management, entries table, stats, events
//! - [`entries`] - operator entry transitions and notification retry
//! - [`display`] - public display board (display-token-scoped)
//! - [`kiosk`] - self check-in (display-token-scoped)
//! - [`status`] - customer status page (entry-token-scoped)
//! - [`webhooks`] - provider delivery callbacks
//! - [`health`] - health check
//!
//! Three authentication regimes, one per surface: operator routes require a
//! bearer JWT; display/kiosk routes are scoped by the list's display token;
//! status routes by the entry's personal token. Tokens never mix.

pub mod display;
pub mod entries;
pub mod health;
pub mod kiosk;
pub mod lists;
pub mod sse;
pub mod status;
pub mod webhooks;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(lists::router())
        .merge(entries::router())
        .merge(display::router())
        .merge(kiosk::router())
        .merge(status::router())
        .merge(webhooks::router())
}
