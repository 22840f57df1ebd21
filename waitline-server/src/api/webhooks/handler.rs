//! Webhook handlers

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct DeliveryCallback {
    pub provider_message_id: String,
    pub status: String,
}

/// Gateway delivery callback. Only `delivered` advances state; any other
/// status is acknowledged and ignored.
pub async fn delivery(
    State(state): State<ServerState>,
    Json(payload): Json<DeliveryCallback>,
) -> AppResult<Json<AppResponse<()>>> {
    if payload.status == "delivered" {
        state.manager.mark_delivered(&payload.provider_message_id)?;
    } else {
        tracing::debug!(
            provider_message_id = %payload.provider_message_id,
            status = %payload.status,
            "Ignoring delivery callback status"
        );
    }
    Ok(ok(()))
}
