//! Customer status handlers

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use shared::message::Topic;

use crate::api::sse;
use crate::core::ServerState;
use crate::queue::PersonalView;
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub async fn status(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<AppResponse<PersonalView>>> {
    let view = state
        .manager
        .personal_view(&token)?
        .ok_or_else(|| AppError::not_found("Entry not found"))?;
    Ok(ok(view))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<AppResponse<PersonalView>>> {
    state.manager.cancel_by_token(&token)?;
    let view = state
        .manager
        .personal_view(&token)?
        .ok_or_else(|| AppError::not_found("Entry not found"))?;
    Ok(ok(view))
}

pub async fn events(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .manager
        .personal_view(&token)?
        .ok_or_else(|| AppError::not_found("Entry not found"))?;
    let listener = state.manager.bus().listen(Topic::Entry(token));
    Ok(sse::refresh_stream(listener))
}
