//! In-memory stores for unit tests. A single mutex per store stands in for
//! the database transaction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::connection::{ConnectionRequest, ConnectionStatus, NewConnection};
use crate::models::matching::{Generation, MatchResult, MatchType};
use crate::models::profile::{
    InvestorProfile, OpenRole, Profile, Requirement, Startup, TalentProfile, UserId,
};
use crate::store::{ConnectionStore, MatchStore, ProfileSource};

#[derive(Default)]
pub struct MemoryProfiles {
    startups: Mutex<Vec<Startup>>,
    requirements: Mutex<Vec<Requirement>>,
    talent: Mutex<Vec<TalentProfile>>,
    investors: Mutex<Vec<InvestorProfile>>,
}

impl MemoryProfiles {
    pub fn add_startup(&self, startup: Startup) {
        self.startups.lock().unwrap().push(startup);
    }

    pub fn add_requirement(&self, requirement: Requirement) {
        self.requirements.lock().unwrap().push(requirement);
    }

    pub fn add_talent(&self, profile: TalentProfile) {
        self.talent.lock().unwrap().push(profile);
    }

    pub fn add_investor(&self, profile: InvestorProfile) {
        self.investors.lock().unwrap().push(profile);
    }
}

#[async_trait]
impl ProfileSource for MemoryProfiles {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, AppError> {
        let founded = self
            .startups
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.founder_id == user_id)
            .cloned();
        if let Some(startup) = founded {
            let requirements = self.list_requirements(startup.id).await?;
            return Ok(Some(Profile::Founder {
                startup,
                requirements,
            }));
        }
        if let Some(t) = self.talent.lock().unwrap().iter().find(|t| t.user_id == user_id) {
            return Ok(Some(Profile::Talent(t.clone())));
        }
        let investor = self
            .investors
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id)
            .cloned();
        Ok(investor.map(Profile::Investor))
    }

    async fn list_requirements(&self, startup_id: i64) -> Result<Vec<Requirement>, AppError> {
        Ok(self
            .requirements
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.startup_id == startup_id)
            .cloned()
            .collect())
    }

    async fn list_open_roles(&self) -> Result<Vec<OpenRole>, AppError> {
        let startups = self.startups.lock().unwrap().clone();
        Ok(self
            .requirements
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active)
            .filter_map(|r| {
                let startup = startups.iter().find(|s| s.id == r.startup_id)?;
                Some(OpenRole {
                    startup: startup.clone(),
                    requirement: r.clone(),
                })
            })
            .collect())
    }

    async fn list_talent(&self) -> Result<Vec<TalentProfile>, AppError> {
        Ok(self.talent.lock().unwrap().clone())
    }

    async fn list_investors(&self) -> Result<Vec<InvestorProfile>, AppError> {
        Ok(self.investors.lock().unwrap().clone())
    }

    async fn list_startups(&self) -> Result<Vec<Startup>, AppError> {
        Ok(self.startups.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryMatches {
    rows: Mutex<HashMap<(UserId, MatchType), Vec<MatchResult>>>,
    next_id: Mutex<i64>,
    fail_writes: AtomicBool,
}

impl MemoryMatches {
    /// Makes every following write fail, as a broken transaction would.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MatchStore for MemoryMatches {
    async fn replace_generations(
        &self,
        source_user_id: UserId,
        generations: Vec<Generation>,
    ) -> Result<Vec<MatchResult>, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("write rejected")));
        }
        let mut rows = self.rows.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();
        let now = Utc::now();
        let mut written = Vec::new();
        for generation in generations {
            let generation_id = Uuid::new_v4();
            let fresh: Vec<MatchResult> = generation
                .rows
                .into_iter()
                .map(|row| {
                    *next_id += 1;
                    MatchResult::from_new(
                        *next_id,
                        generation_id,
                        source_user_id,
                        generation.match_type,
                        row,
                        now,
                    )
                })
                .collect();
            written.extend(fresh.iter().cloned());
            rows.insert((source_user_id, generation.match_type), fresh);
        }
        written.sort_by(MatchResult::read_order);
        Ok(written)
    }

    async fn get(&self, source_user_id: UserId) -> Result<Vec<MatchResult>, AppError> {
        let mut out: Vec<MatchResult> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|((source, _), _)| *source == source_user_id)
            .flat_map(|(_, rows)| rows.iter().cloned())
            .collect();
        out.sort_by(MatchResult::read_order);
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemoryConnections {
    rows: Mutex<Vec<ConnectionRequest>>,
}

#[async_trait]
impl ConnectionStore for MemoryConnections {
    async fn insert_pending(&self, new: NewConnection) -> Result<ConnectionRequest, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let open = rows.iter().any(|r| {
            r.status == ConnectionStatus::Pending
                && r.involves_pair(new.from_user_id, new.to_user_id)
        });
        if open {
            return Err(AppError::DuplicatePending(new.from_user_id, new.to_user_id));
        }
        let now = Utc::now();
        let request = ConnectionRequest {
            id: rows.len() as i64 + 1,
            from_user_id: new.from_user_id,
            to_user_id: new.to_user_id,
            match_id: new.match_id,
            message: new.message,
            status: ConnectionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        rows.push(request.clone());
        Ok(request)
    }

    async fn get(&self, id: i64) -> Result<Option<ConnectionRequest>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn resolve_pending(
        &self,
        id: i64,
        status: ConnectionStatus,
    ) -> Result<Option<ConnectionRequest>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.status == ConnectionStatus::Pending)
        else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConnectionRequest>, AppError> {
        let mut out: Vec<ConnectionRequest> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.from_user_id == user_id || r.to_user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::NewMatch;

    fn row(target: UserId, score: f64) -> NewMatch {
        NewMatch {
            target_user_id: target,
            candidate_id: target * 100,
            requirement_id: None,
            overall_score: score,
            skill_overlap_score: None,
            semantic_score: Some(score),
            matched_skills: vec![],
            missing_skills: vec![],
            matched_nice_to_have: vec![],
            reasons: vec![],
        }
    }

    #[tokio::test]
    async fn test_replacing_one_type_keeps_the_others() {
        let store = MemoryMatches::default();
        store
            .replace_generations(
                1,
                vec![
                    Generation {
                        match_type: MatchType::TalentToStartup,
                        rows: vec![row(2, 0.4), row(3, 0.9)],
                    },
                    Generation {
                        match_type: MatchType::TalentToTalent,
                        rows: vec![row(4, 0.5)],
                    },
                ],
            )
            .await
            .unwrap();

        store
            .replace_generation(
                1,
                Generation {
                    match_type: MatchType::TalentToStartup,
                    rows: vec![row(5, 0.7)],
                },
            )
            .await
            .unwrap();

        let targets: Vec<_> = store
            .get(1)
            .await
            .unwrap()
            .iter()
            .map(|r| r.target_user_id)
            .collect();
        assert_eq!(targets, vec![5, 4]);
    }
}
