//! Refresh Orchestrator: regenerates every match direction for one user and
//! swaps the result into the store in a single write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::embedding_client::EmbeddingProvider;
use crate::errors::AppError;
use crate::matching::profile_text::{
    investor_input, requirement_input, startup_input, talent_input,
};
use crate::matching::ranker::{
    cofounder_eligible, startup_eligible_for, talent_eligible_for, Ranker,
};
use crate::matching::semantic::{EmbeddingInput, EmbeddingResolver};
use crate::models::matching::{Generation, MatchResult, MatchType, NewMatch};
use crate::models::profile::{InvestorProfile, Profile, Requirement, Startup, TalentProfile, UserId};
use crate::store::{MatchStore, ProfileSource};

/// One async mutex per user id. Entries nobody holds are pruned on the next acquire.
#[derive(Default)]
pub struct RefreshLocks {
    inner: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RefreshLocks {
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

pub struct MatchEngine {
    profiles: Arc<dyn ProfileSource>,
    store: Arc<dyn MatchStore>,
    resolver: EmbeddingResolver,
    ranker: Ranker,
    locks: RefreshLocks,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        store: Arc<dyn MatchStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: &MatchingConfig,
    ) -> Self {
        Self {
            profiles,
            store,
            resolver: EmbeddingResolver::new(
                embeddings,
                config.embedding_timeout,
                config.embedding_concurrency,
            ),
            ranker: Ranker::new(config),
            locks: RefreshLocks::default(),
        }
    }

    /// Recomputes every applicable direction for `user_id` and replaces the
    /// stored generations. Nothing is written until all scoring has finished.
    pub async fn refresh(&self, user_id: UserId) -> Result<Vec<MatchResult>, AppError> {
        let _guard = self.locks.acquire(user_id).await;

        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No profile for user {user_id}")))?;
        let role = profile.role();
        info!(user_id, %role, "Refreshing matches");

        let mut generations = Vec::new();
        for &match_type in role.match_types() {
            let scored = self.score_direction(user_id, &profile, match_type).await?;
            let candidates = scored.len();
            let rows = self.ranker.rank(scored);
            info!(
                user_id,
                %match_type,
                candidates,
                kept = rows.len(),
                "Scored match direction"
            );
            generations.push(Generation { match_type, rows });
        }

        let written = self.store.replace_generations(user_id, generations).await?;
        info!(user_id, rows = written.len(), "Match refresh complete");
        Ok(written)
    }

    pub async fn get_matches(&self, user_id: UserId) -> Result<Vec<MatchResult>, AppError> {
        self.store.get(user_id).await
    }

    async fn score_direction(
        &self,
        user_id: UserId,
        profile: &Profile,
        match_type: MatchType,
    ) -> Result<Vec<NewMatch>, AppError> {
        match (match_type, profile) {
            (MatchType::TalentToStartup, Profile::Founder { startup, requirements }) => {
                self.talent_for_startup(startup, requirements).await
            }
            (MatchType::StartupToInvestor, Profile::Founder { startup, .. }) => {
                self.investors_for_startup(startup).await
            }
            (MatchType::TalentToStartup, Profile::Talent(talent)) => {
                self.roles_for_talent(talent).await
            }
            (MatchType::TalentToTalent, Profile::Talent(talent)) => {
                self.cofounders_for_talent(talent).await
            }
            (MatchType::StartupToInvestor, Profile::Investor(investor)) => {
                self.startups_for_investor(investor).await
            }
            (match_type, profile) => {
                warn!(user_id, %match_type, role = %profile.role(), "Direction does not apply to role");
                Ok(Vec::new())
            }
        }
    }

    /// Resolves two batches of embeddings in one fan-out, preserving each batch's order.
    async fn resolve_pair(
        &self,
        sources: Vec<EmbeddingInput>,
        candidates: Vec<EmbeddingInput>,
    ) -> (Vec<Option<Vec<f32>>>, Vec<Option<Vec<f32>>>) {
        let split = sources.len();
        let mut all = self
            .resolver
            .resolve_all(sources.into_iter().chain(candidates).collect())
            .await;
        let rest = all.split_off(split);
        (all, rest)
    }

    /// Founder side of talent_to_startup: every talent against each of the startup's open roles.
    async fn talent_for_startup(
        &self,
        startup: &Startup,
        requirements: &[Requirement],
    ) -> Result<Vec<NewMatch>, AppError> {
        let roles: Vec<&Requirement> = requirements
            .iter()
            .filter(|r| r.is_active && usable(r))
            .collect();
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let talent: Vec<TalentProfile> = self
            .profiles
            .list_talent()
            .await?
            .into_iter()
            .filter(|t| t.user_id != startup.founder_id)
            .filter(|t| roles.iter().any(|r| talent_eligible_for(r, t)))
            .collect();
        debug!(startup_id = startup.id, roles = roles.len(), talent = talent.len(), "Eligible talent");
        if talent.is_empty() {
            return Ok(Vec::new());
        }

        let (role_vectors, talent_vectors) = self
            .resolve_pair(
                roles.iter().map(|r| requirement_input(r)).collect(),
                talent.iter().map(talent_input).collect(),
            )
            .await;

        let mut scored = Vec::new();
        for (role, role_vector) in roles.iter().zip(&role_vectors) {
            for (candidate, candidate_vector) in talent.iter().zip(&talent_vectors) {
                if !talent_eligible_for(role, candidate) {
                    continue;
                }
                scored.extend(self.ranker.score_requirement_pair(
                    role,
                    candidate,
                    candidate.user_id,
                    candidate.id,
                    role_vector.as_deref(),
                    candidate_vector.as_deref(),
                ));
            }
        }
        Ok(scored)
    }

    /// Talent side of talent_to_startup: open roles at other people's startups.
    async fn roles_for_talent(&self, talent: &TalentProfile) -> Result<Vec<NewMatch>, AppError> {
        let roles: Vec<_> = self
            .profiles
            .list_open_roles()
            .await?
            .into_iter()
            .filter(|role| role.startup.founder_id != talent.user_id)
            .filter(|role| usable(&role.requirement))
            .filter(|role| talent_eligible_for(&role.requirement, talent))
            .collect();
        debug!(user_id = talent.user_id, roles = roles.len(), "Eligible open roles");
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let (own, role_vectors) = self
            .resolve_pair(
                vec![talent_input(talent)],
                roles.iter().map(|r| requirement_input(&r.requirement)).collect(),
            )
            .await;
        let own = own.into_iter().next().flatten();

        Ok(roles
            .iter()
            .zip(&role_vectors)
            .filter_map(|(role, role_vector)| {
                self.ranker.score_requirement_pair(
                    &role.requirement,
                    talent,
                    role.startup.founder_id,
                    role.startup.id,
                    role_vector.as_deref(),
                    own.as_deref(),
                )
            })
            .collect())
    }

    async fn cofounders_for_talent(&self, talent: &TalentProfile) -> Result<Vec<NewMatch>, AppError> {
        if !talent.looking_for_cofounder {
            return Ok(Vec::new());
        }
        let candidates: Vec<TalentProfile> = self
            .profiles
            .list_talent()
            .await?
            .into_iter()
            .filter(|c| cofounder_eligible(talent, c))
            .collect();
        debug!(user_id = talent.user_id, candidates = candidates.len(), "Eligible co-founders");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let (own, vectors) = self
            .resolve_pair(
                vec![talent_input(talent)],
                candidates.iter().map(talent_input).collect(),
            )
            .await;
        let own = own.into_iter().next().flatten();

        Ok(candidates
            .iter()
            .zip(&vectors)
            .map(|(candidate, vector)| {
                self.ranker
                    .score_cofounder_pair(talent, candidate, own.as_deref(), vector.as_deref())
            })
            .collect())
    }

    async fn investors_for_startup(&self, startup: &Startup) -> Result<Vec<NewMatch>, AppError> {
        let investors: Vec<InvestorProfile> = self
            .profiles
            .list_investors()
            .await?
            .into_iter()
            .filter(|i| i.user_id != startup.founder_id)
            .filter(|i| startup_eligible_for(i, startup))
            .collect();
        debug!(startup_id = startup.id, investors = investors.len(), "Eligible investors");
        if investors.is_empty() {
            return Ok(Vec::new());
        }

        let (own, vectors) = self
            .resolve_pair(
                vec![startup_input(startup)],
                investors.iter().map(investor_input).collect(),
            )
            .await;
        let own = own.into_iter().next().flatten();

        Ok(investors
            .iter()
            .zip(&vectors)
            .map(|(investor, vector)| {
                self.ranker.score_investor_pair(
                    startup,
                    investor,
                    investor.user_id,
                    investor.id,
                    own.as_deref(),
                    vector.as_deref(),
                )
            })
            .collect())
    }

    async fn startups_for_investor(
        &self,
        investor: &InvestorProfile,
    ) -> Result<Vec<NewMatch>, AppError> {
        let startups: Vec<Startup> = self
            .profiles
            .list_startups()
            .await?
            .into_iter()
            .filter(|s| s.founder_id != investor.user_id)
            .filter(|s| startup_eligible_for(investor, s))
            .collect();
        debug!(user_id = investor.user_id, startups = startups.len(), "Eligible startups");
        if startups.is_empty() {
            return Ok(Vec::new());
        }

        let (own, vectors) = self
            .resolve_pair(
                vec![investor_input(investor)],
                startups.iter().map(startup_input).collect(),
            )
            .await;
        let own = own.into_iter().next().flatten();

        Ok(startups
            .iter()
            .zip(&vectors)
            .map(|(startup, vector)| {
                self.ranker.score_investor_pair(
                    startup,
                    investor,
                    startup.founder_id,
                    startup.id,
                    vector.as_deref(),
                    own.as_deref(),
                )
            })
            .collect())
    }
}

/// Malformed requirements are skipped, not fatal.
fn usable(requirement: &Requirement) -> bool {
    match requirement.validate() {
        Ok(()) => true,
        Err(e) => {
            warn!(requirement_id = requirement.id, "Skipping requirement: {e}");
            false
        }
    }
}
