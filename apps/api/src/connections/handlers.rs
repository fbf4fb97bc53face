//! Axum route handlers for the Connections API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::connections::workflow::ConnectionAction;
use crate::errors::AppError;
use crate::models::connection::ConnectionRequest;
use crate::models::profile::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConnectionRequest {
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub match_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionRequest>,
}

/// POST /api/v1/connections
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<ConnectionRequest>), AppError> {
    let created = state
        .connections
        .create_connection(req.from_user_id, req.to_user_id, req.match_id, req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/connections
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ConnectionListResponse>, AppError> {
    let connections = state.connections.list_for_user(params.user_id).await?;
    Ok(Json(ConnectionListResponse { connections }))
}

/// POST /api/v1/connections/:id/accept
pub async fn handle_accept(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ConnectionRequest>, AppError> {
    let resolved = state
        .connections
        .resolve_connection(id, req.actor_id, ConnectionAction::Accept)
        .await?;
    Ok(Json(resolved))
}

/// POST /api/v1/connections/:id/decline
pub async fn handle_decline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ConnectionRequest>, AppError> {
    let resolved = state
        .connections
        .resolve_connection(id, req.actor_id, ConnectionAction::Decline)
        .await?;
    Ok(Json(resolved))
}
