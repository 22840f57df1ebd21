//! Kiosk handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::CheckInInput;

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// What the kiosk screen shows after a successful check-in. The entry token
/// goes into the confirmation link/QR for the customer's status page.
#[derive(Serialize)]
pub struct KioskCheckInResponse {
    pub ticket_number: u64,
    pub entry_token: String,
    pub queue_position: Option<usize>,
    pub estimated_wait_minutes: u32,
}

pub async fn check_in(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(input): Json<CheckInInput>,
) -> AppResult<Json<AppResponse<KioskCheckInResponse>>> {
    let list = state
        .manager
        .kiosk_list(&token)?
        .ok_or_else(|| AppError::not_found("Kiosk not found"))?;

    let entry = state.manager.check_in(&list, input)?;
    let view = state
        .manager
        .personal_view(&entry.token)?
        .ok_or_else(|| AppError::internal("Entry vanished after check-in"))?;

    Ok(ok(KioskCheckInResponse {
        ticket_number: entry.ticket_number,
        entry_token: entry.token,
        queue_position: view.queue_position,
        estimated_wait_minutes: view.estimated_wait_minutes,
    }))
}
