//! Connection Workflow: pending → accepted | declined, driven only by the recipient.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::connection::{ConnectionRequest, ConnectionStatus, NewConnection};
use crate::models::profile::UserId;
use crate::store::ConnectionStore;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionAction {
    Accept,
    Decline,
}

impl ConnectionAction {
    pub fn target(&self) -> ConnectionStatus {
        match self {
            ConnectionAction::Accept => ConnectionStatus::Accepted,
            ConnectionAction::Decline => ConnectionStatus::Declined,
        }
    }
}

/// The status `action` by `actor` moves `request` to, or why it may not.
pub fn transition(
    request: &ConnectionRequest,
    actor: UserId,
    action: ConnectionAction,
) -> Result<ConnectionStatus, AppError> {
    if actor != request.to_user_id {
        return Err(AppError::Forbidden(format!(
            "only user {} may respond to connection request {}",
            request.to_user_id, request.id
        )));
    }
    if request.status.is_terminal() {
        return Err(AppError::InvalidTransition {
            id: request.id,
            status: request.status,
        });
    }
    Ok(action.target())
}

fn validate_new(
    from_user_id: UserId,
    to_user_id: UserId,
    match_id: Option<i64>,
    message: Option<String>,
) -> Result<NewConnection, AppError> {
    if from_user_id == to_user_id {
        return Err(AppError::Validation(
            "cannot send a connection request to yourself".to_string(),
        ));
    }
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    if let Some(m) = &message {
        if m.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }
    }
    Ok(NewConnection {
        from_user_id,
        to_user_id,
        match_id,
        message,
    })
}

#[derive(Clone)]
pub struct ConnectionService {
    store: Arc<dyn ConnectionStore>,
}

impl ConnectionService {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    pub async fn create_connection(
        &self,
        from_user_id: UserId,
        to_user_id: UserId,
        match_id: Option<i64>,
        message: Option<String>,
    ) -> Result<ConnectionRequest, AppError> {
        let new = validate_new(from_user_id, to_user_id, match_id, message)?;
        let request = self.store.insert_pending(new).await?;
        info!(
            id = request.id,
            from_user_id, to_user_id, "Connection request created"
        );
        Ok(request)
    }

    pub async fn resolve_connection(
        &self,
        id: i64,
        actor: UserId,
        action: ConnectionAction,
    ) -> Result<ConnectionRequest, AppError> {
        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Connection request {id} not found")))?;
        let status = transition(&current, actor, action)?;

        match self.store.resolve_pending(id, status).await? {
            Some(resolved) => {
                info!(id, actor, status = %resolved.status, "Connection request resolved");
                Ok(resolved)
            }
            // Lost the race to another resolve; report what won.
            None => {
                let status = self
                    .store
                    .get(id)
                    .await?
                    .map(|r| r.status)
                    .unwrap_or(current.status);
                Err(AppError::InvalidTransition { id, status })
            }
        }
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConnectionRequest>, AppError> {
        self.store.list_for_user(user_id).await
    }
}
