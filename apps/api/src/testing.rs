//! Shared fixtures and fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding_client::{EmbeddingError, EmbeddingProvider};
use crate::matching::normalize::{normalize_sector, normalize_skill, token_set};
use crate::models::profile::{
    EngagementType, InvestorProfile, Proficiency, Requirement, Skill, Startup, StartupStage,
    TalentProfile, UserId,
};

pub fn talent(
    user_id: UserId,
    skills: &[&str],
    engagement: EngagementType,
    looking_for_cofounder: bool,
) -> TalentProfile {
    TalentProfile {
        id: user_id * 100,
        user_id,
        skills: token_set(skills, normalize_skill)
            .into_iter()
            .map(|name| Skill {
                name,
                proficiency: Proficiency::Intermediate,
                years_experience: 2.0,
            })
            .collect(),
        engagement_preference: engagement,
        looking_for_cofounder,
        bio: None,
        institution: None,
        degree: None,
        embedding: None,
    }
}

pub fn requirement(
    id: i64,
    startup_id: i64,
    required: &[&str],
    nice_to_have: &[&str],
    engagement: EngagementType,
) -> Requirement {
    Requirement {
        id,
        startup_id,
        title: format!("Role {id}"),
        description: None,
        required_skills: token_set(required, normalize_skill),
        nice_to_have_skills: token_set(nice_to_have, normalize_skill),
        engagement_type: engagement,
        is_active: true,
        raw_required_count: required.len(),
        embedding: None,
    }
}

pub fn startup(id: i64, founder_id: UserId, industry: &str, stage: StartupStage) -> Startup {
    Startup {
        id,
        founder_id,
        name: format!("Startup {id}"),
        industry: normalize_sector(industry),
        stage,
        funding_ask: None,
        description: None,
        traction_summary: None,
        team_size: 2,
        embedding: None,
    }
}

pub fn investor(user_id: UserId, sectors: &[&str], stages: &[StartupStage]) -> InvestorProfile {
    InvestorProfile {
        id: user_id * 100,
        user_id,
        investor_type: "angel".to_string(),
        thesis: None,
        preferred_sectors: token_set(sectors, normalize_sector),
        preferred_stages: stages.iter().copied().collect(),
        raw_stage_count: stages.len(),
        check_size_min: None,
        check_size_max: None,
        embedding: None,
    }
}

/// Embedding provider answering from a fixed table. Unknown text yields `Ok(None)`.
#[derive(Default)]
pub struct ScriptedEmbeddings {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedEmbeddings {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        self.vectors
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "scripted outage".to_string(),
            });
        }
        Ok(self.vectors.lock().unwrap().get(text).cloned())
    }
}
