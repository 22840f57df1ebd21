//! Waitlist API handlers

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use shared::message::Topic;
use shared::models::{CheckInInput, Waitlist, WaitlistCreate, WaitlistEntry, WaitlistUpdate};

use crate::api::sse;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::queue::{EntryView, StatsView};
use crate::utils::{AppResponse, AppResult, ok};

pub async fn list_all(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Waitlist>>>> {
    let lists = state.manager.lists(&user.business_id)?;
    Ok(ok(lists))
}

pub async fn create(
    user: CurrentUser,
    State(state): State<ServerState>,
    Json(input): Json<WaitlistCreate>,
) -> AppResult<Json<AppResponse<Waitlist>>> {
    let list = state.manager.create_list(&user.business_id, input)?;
    Ok(ok(list))
}

pub async fn get_by_id(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Waitlist>>> {
    let list = state.manager.get_list(&user.business_id, &id)?;
    Ok(ok(list))
}

pub async fn update(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<WaitlistUpdate>,
) -> AppResult<Json<AppResponse<Waitlist>>> {
    let list = state.manager.update_list(&user.business_id, &id, input)?;
    Ok(ok(list))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub archived: usize,
}

pub async fn clear(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<ClearResponse>>> {
    let archived = state.manager.clear_list(&user.business_id, &id)?;
    Ok(ok(ClearResponse { archived }))
}

/// Active entries with derived queue positions
pub async fn entries(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<EntryView>>>> {
    let entries = state.manager.active_entries(&user.business_id, &id)?;
    Ok(ok(entries))
}

/// Operator walk-up check-in
pub async fn check_in(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<CheckInInput>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let list = state.manager.get_list(&user.business_id, &id)?;
    let entry = state.manager.check_in(&list, input)?;
    Ok(ok(entry))
}

pub async fn stats(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<StatsView>>> {
    let stats = state.manager.stats(&user.business_id, &id)?;
    Ok(ok(stats))
}

/// List-topic SSE refresh stream for the operator table
pub async fn events(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    // Scope check before subscribing
    state.manager.get_list(&user.business_id, &id)?;
    let listener = state.manager.bus().listen(Topic::List(id));
    Ok(sse::refresh_stream(listener))
}
