//! Axum route handlers for the Matches API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::matching::MatchResult;
use crate::models::profile::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchResult>,
}

/// POST /api/v1/matches/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<MatchListResponse>, AppError> {
    let matches = state.engine.refresh(req.user_id).await?;
    Ok(Json(MatchListResponse { matches }))
}

/// GET /api/v1/matches
pub async fn handle_get_matches(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    let matches = state.engine.get_matches(params.user_id).await?;
    Ok(Json(MatchListResponse { matches }))
}
