//! Entry API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{Channel, EntryUpdate, WaitlistEntry};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    /// Channels to notify on; empty means call without sending anything
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Call a waiting customer. The transition commits first; dispatch runs in
/// the background and reports per channel on the entry.
pub async fn call(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CallRequest>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.manager.call(&user.business_id, &id, &payload.channels)?;

    if !payload.channels.is_empty() {
        let list = state.manager.get_list(&user.business_id, &entry.list_id)?;
        let notifier = state.notifier.clone();
        let entry_id = entry.id.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch_pending(&list, &entry_id).await {
                tracing::error!(entry_id = %entry_id, error = %e, "Notification dispatch failed");
            }
        });
    }

    Ok(ok(entry))
}

pub async fn seat(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.manager.seat(&user.business_id, &id)?;
    Ok(ok(entry))
}

pub async fn no_show(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.manager.no_show(&user.business_id, &id)?;
    Ok(ok(entry))
}

pub async fn archive(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.manager.archive(&user.business_id, &id)?;
    Ok(ok(entry))
}

pub async fn update(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<EntryUpdate>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.manager.update_entry(&user.business_id, &id, input)?;
    Ok(ok(entry))
}

/// Retry one failed channel. Awaited so the operator sees the outcome in
/// the returned entry.
pub async fn retry_notification(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path((id, channel)): Path<(String, Channel)>,
) -> AppResult<Json<AppResponse<WaitlistEntry>>> {
    let entry = state.notifier.retry(&user.business_id, &id, channel).await?;
    Ok(ok(entry))
}
