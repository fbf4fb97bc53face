use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::profile::UserId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConnectionStatus::Pending),
            "accepted" => Some(ConnectionStatus::Accepted),
            "declined" => Some(ConnectionStatus::Declined),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConnectionStatus::Pending)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionRequest {
    pub id: i64,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    /// Provenance only; the referenced match may since have been replaced.
    pub match_id: Option<i64>,
    pub message: Option<String>,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// Whether this request connects `a` and `b`, in either direction.
    #[cfg(test)]
    pub fn involves_pair(&self, a: UserId, b: UserId) -> bool {
        (self.from_user_id == a && self.to_user_id == b)
            || (self.from_user_id == b && self.to_user_id == a)
    }
}

/// Validated input for a new request.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub match_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConnectionRow {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub match_id: Option<i64>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ConnectionRow> for ConnectionRequest {
    type Error = anyhow::Error;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        let status = ConnectionStatus::parse(&row.status).ok_or_else(|| {
            anyhow::anyhow!("unknown status '{}' on connection {}", row.status, row.id)
        })?;
        Ok(ConnectionRequest {
            id: row.id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            match_id: row.match_id,
            message: row.message,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_open() {
        assert!(!ConnectionStatus::Pending.is_terminal());
        assert!(ConnectionStatus::Accepted.is_terminal());
        assert!(ConnectionStatus::Declined.is_terminal());
    }

    #[test]
    fn test_pair_check_ignores_direction() {
        let now = Utc::now();
        let req = ConnectionRequest {
            id: 1,
            from_user_id: 3,
            to_user_id: 8,
            match_id: None,
            message: None,
            status: ConnectionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert!(req.involves_pair(3, 8));
        assert!(req.involves_pair(8, 3));
        assert!(!req.involves_pair(3, 9));
    }
}
