//! Storage seams. Postgres implementations live in `postgres`; in-memory fakes
//! for unit tests live in `memory`.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::connection::{ConnectionRequest, ConnectionStatus, NewConnection};
use crate::models::matching::{Generation, MatchResult};
use crate::models::profile::{
    InvestorProfile, OpenRole, Profile, Requirement, Startup, TalentProfile, UserId,
};

/// Read-only view of participant profiles, already normalized.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// The user's role-specific profile, or `None` if the user or profile is missing.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, AppError>;

    /// Requirements owned by one startup, active or not.
    async fn list_requirements(&self, startup_id: i64) -> Result<Vec<Requirement>, AppError>;

    /// Active requirements across all startups, each with its owning startup.
    async fn list_open_roles(&self) -> Result<Vec<OpenRole>, AppError>;

    async fn list_talent(&self) -> Result<Vec<TalentProfile>, AppError>;

    async fn list_investors(&self) -> Result<Vec<InvestorProfile>, AppError>;

    async fn list_startups(&self) -> Result<Vec<Startup>, AppError>;
}

/// Persisted match generations.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Replaces the current generation of every given match type for `source_user_id`
    /// in one transaction. Either all generations are swapped in or none are.
    async fn replace_generations(
        &self,
        source_user_id: UserId,
        generations: Vec<Generation>,
    ) -> Result<Vec<MatchResult>, AppError>;

    #[cfg(test)]
    async fn replace_generation(
        &self,
        source_user_id: UserId,
        generation: Generation,
    ) -> Result<Vec<MatchResult>, AppError> {
        self.replace_generations(source_user_id, vec![generation])
            .await
    }

    /// Current generation across all match types, best score first.
    async fn get(&self, source_user_id: UserId) -> Result<Vec<MatchResult>, AppError>;
}

/// Connection request persistence. Implementations make the pending-pair
/// check and the write atomic.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Inserts a pending request, failing with `DuplicatePending` if one is
    /// already open for the unordered pair.
    async fn insert_pending(&self, new: NewConnection) -> Result<ConnectionRequest, AppError>;

    async fn get(&self, id: i64) -> Result<Option<ConnectionRequest>, AppError>;

    /// Moves `id` from `pending` to `status`. Returns `None` if the request was
    /// no longer pending when the write happened.
    async fn resolve_pending(
        &self,
        id: i64,
        status: ConnectionStatus,
    ) -> Result<Option<ConnectionRequest>, AppError>;

    /// Requests the user sent or received, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConnectionRequest>, AppError>;
}
