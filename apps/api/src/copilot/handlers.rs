use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::copilot::{PitchFeedback, TeamGapReport};
use crate::errors::AppError;
use crate::models::profile::{Profile, UserId};
use crate::state::AppState;

const MAX_PITCH_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct PitchFeedbackRequest {
    pub pitch_text: String,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: UserId,
}

/// POST /api/v1/copilot/pitch-feedback
pub async fn handle_pitch_feedback(
    State(state): State<AppState>,
    Json(req): Json<PitchFeedbackRequest>,
) -> Result<Json<PitchFeedback>, AppError> {
    let pitch = req.pitch_text.trim();
    if pitch.is_empty() {
        return Err(AppError::Validation("pitch_text must not be empty".to_string()));
    }
    if pitch.chars().count() > MAX_PITCH_CHARS {
        return Err(AppError::Validation(format!(
            "pitch_text exceeds {MAX_PITCH_CHARS} characters"
        )));
    }
    Ok(Json(state.feedback.analyze_pitch(pitch).await?))
}

/// GET /api/v1/copilot/team-gaps
pub async fn handle_team_gaps(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TeamGapReport>, AppError> {
    let startup = match state.profiles.get_profile(params.user_id).await? {
        Some(Profile::Founder { startup, .. }) => startup,
        Some(_) => {
            return Err(AppError::Validation(format!(
                "user {} is not a founder",
                params.user_id
            )))
        }
        None => {
            return Err(AppError::NotFound(format!(
                "No startup for user {}",
                params.user_id
            )))
        }
    };
    let open_roles = state.profiles.list_requirements(startup.id).await?;
    Ok(Json(
        state.feedback.analyze_team_gaps(&startup, &open_roles).await?,
    ))
}
