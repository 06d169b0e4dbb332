//! Invite and account housekeeping endpoints under `/admin`

use api_types::{
    Message,
    auth::{AccountStatusUpdate, AccountView},
    invite::{InviteIssued, InviteNew, InviteView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountStatus, Principal, Role};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{account_view, invite_view, issued_view},
};

/// Handle requests for inviting a new account
pub async fn issue(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<InviteNew>,
) -> Result<(StatusCode, Json<InviteIssued>), ServerError> {
    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::User,
        Some(role) => Role::try_from(role)?,
    };
    let issued = state
        .engine
        .issue_invite(&principal, &payload.email, role)
        .await?;
    Ok((StatusCode::CREATED, Json(issued_view(issued))))
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<InviteView>>, ServerError> {
    let invites = state.engine.invites(&principal).await?;
    Ok(Json(invites.into_iter().map(invite_view).collect()))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_invite(&principal, &token).await?;
    Ok(Json(Message {
        message: "invite deleted".to_string(),
    }))
}

/// Activate or deactivate an account
pub async fn set_status(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountStatusUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let status = if payload.active {
        AccountStatus::Active
    } else {
        AccountStatus::Inactive
    };
    let account = state
        .engine
        .set_account_status(&principal, id, status)
        .await?;
    Ok(Json(account_view(account)))
}
