//! Display board handlers

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use shared::message::Topic;

use crate::api::sse;
use crate::core::ServerState;
use crate::queue::DisplayView;
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub async fn board(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<AppResponse<DisplayView>>> {
    let view = state
        .manager
        .display_view(&token)?
        .ok_or_else(|| AppError::not_found("Display not found"))?;
    Ok(ok(view))
}

pub async fn events(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    // Same visibility rule as the board itself
    state
        .manager
        .display_view(&token)?
        .ok_or_else(|| AppError::not_found("Display not found"))?;
    let listener = state.manager.bus().listen(Topic::Display(token));
    Ok(sse::refresh_stream(listener))
}
