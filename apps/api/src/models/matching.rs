use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::UserId;

/// Direction of a computed match. Each variant carries its own eligibility
/// predicate and scoring formula in `matching::ranker`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TalentToStartup,
    StartupToInvestor,
    /// Co-founder matching between two talent profiles.
    TalentToTalent,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::TalentToStartup => "talent_to_startup",
            MatchType::StartupToInvestor => "startup_to_investor",
            MatchType::TalentToTalent => "talent_to_talent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "talent_to_startup" => Some(MatchType::TalentToStartup),
            "startup_to_investor" => Some(MatchType::StartupToInvestor),
            "talent_to_talent" | "cofounder" => Some(MatchType::TalentToTalent),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored candidate ready to be written as part of a generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMatch {
    pub target_user_id: UserId,
    /// Id of the ranked entity: talent profile, startup or investor profile.
    pub candidate_id: i64,
    pub requirement_id: Option<i64>,
    pub overall_score: f64,
    /// `None` when the direction has no skill dimension.
    pub skill_overlap_score: Option<f64>,
    /// `None` when either embedding was unavailable.
    pub semantic_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_nice_to_have: Vec<String>,
    pub reasons: Vec<String>,
}

/// One generation of rows for a single (source, match_type).
#[derive(Debug, Clone)]
pub struct Generation {
    pub match_type: MatchType,
    pub rows: Vec<NewMatch>,
}

/// A persisted match row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: i64,
    pub generation_id: Uuid,
    pub source_user_id: UserId,
    pub target_user_id: UserId,
    pub candidate_id: i64,
    pub match_type: MatchType,
    pub requirement_id: Option<i64>,
    pub overall_score: f64,
    pub skill_overlap_score: Option<f64>,
    pub semantic_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_nice_to_have: Vec<String>,
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchResult {
    #[cfg(test)]
    pub fn from_new(
        id: i64,
        generation_id: Uuid,
        source_user_id: UserId,
        match_type: MatchType,
        row: NewMatch,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            generation_id,
            source_user_id,
            target_user_id: row.target_user_id,
            candidate_id: row.candidate_id,
            match_type,
            requirement_id: row.requirement_id,
            overall_score: row.overall_score,
            skill_overlap_score: row.skill_overlap_score,
            semantic_score: row.semantic_score,
            matched_skills: row.matched_skills,
            missing_skills: row.missing_skills,
            matched_nice_to_have: row.matched_nice_to_have,
            reasons: row.reasons,
            created_at,
        }
    }

    /// Read order for a user's matches: best score first, then a stable key.
    pub fn read_order(a: &MatchResult, b: &MatchResult) -> Ordering {
        b.overall_score
            .total_cmp(&a.overall_score)
            .then_with(|| a.match_type.cmp(&b.match_type))
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
            .then_with(|| a.requirement_id.cmp(&b.requirement_id))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub generation_id: Uuid,
    pub source_user_id: i64,
    pub target_user_id: i64,
    pub candidate_id: i64,
    pub match_type: String,
    pub requirement_id: Option<i64>,
    pub overall_score: f64,
    pub skill_overlap_score: Option<f64>,
    pub semantic_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_nice_to_have: Vec<String>,
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for MatchResult {
    type Error = anyhow::Error;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let match_type = MatchType::parse(&row.match_type)
            .ok_or_else(|| anyhow::anyhow!("unknown match_type '{}' on match {}", row.match_type, row.id))?;
        Ok(MatchResult {
            id: row.id,
            generation_id: row.generation_id,
            source_user_id: row.source_user_id,
            target_user_id: row.target_user_id,
            candidate_id: row.candidate_id,
            match_type,
            requirement_id: row.requirement_id,
            overall_score: row.overall_score,
            skill_overlap_score: row.skill_overlap_score,
            semantic_score: row.semantic_score,
            matched_skills: row.matched_skills,
            missing_skills: row.missing_skills,
            matched_nice_to_have: row.matched_nice_to_have,
            reasons: row.reasons,
            created_at: row.created_at,
        })
    }
}
