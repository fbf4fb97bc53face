//! Score Fusion & Ranker.
//!
//! Eligibility predicates decide whether a pair is scored at all; ineligible pairs
//! never reach the ranked list. Fusion combines the skill-overlap and semantic
//! signals, leaving out whichever one is undefined for the pair. Directions with
//! no skill dimension fall back to a structured score when the semantic signal
//! is missing, so an eligible pair is never dropped for lack of embeddings.

use std::cmp::Ordering;

use crate::config::MatchingConfig;
use crate::matching::semantic::semantic_score;
use crate::matching::skill_overlap::{score_overlap, SkillWeights};
use crate::models::matching::NewMatch;
use crate::models::profile::{InvestorProfile, Requirement, Startup, TalentProfile, UserId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub skill: f64,
    pub semantic: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            skill: 0.6,
            semantic: 0.4,
        }
    }
}

/// Weighted combination of the defined signals.
///
/// Both defined: weighted average. One defined: that signal alone, so an
/// inapplicable dimension never drags the score down. Neither: `None`.
pub fn fuse(skill: Option<f64>, semantic: Option<f64>, weights: &FusionWeights) -> Option<f64> {
    let score = match (skill, semantic) {
        (Some(s), Some(m)) => {
            let total = weights.skill + weights.semantic;
            (weights.skill * s + weights.semantic * m) / total
        }
        (Some(s), None) => s,
        (None, Some(m)) => m,
        (None, None) => return None,
    };
    Some(score.clamp(0.0, 1.0))
}

// ────────────────────────────────────────────────────────────────────────────
// Eligibility predicates, one per direction
// ────────────────────────────────────────────────────────────────────────────

/// talent_to_startup: the requirement is open and the talent's engagement fits it.
pub fn talent_eligible_for(req: &Requirement, talent: &TalentProfile) -> bool {
    req.is_active && talent.engagement_preference.accepts(req.engagement_type)
}

/// startup_to_investor: stage and sector must be in the investor's preferences;
/// a preference the investor never stated matches everything.
pub fn startup_eligible_for(investor: &InvestorProfile, startup: &Startup) -> bool {
    let stage_ok = investor.accepts_stage(startup.stage);
    let sector_ok = investor.preferred_sectors.is_empty()
        || investor.preferred_sectors.contains(&startup.industry);
    stage_ok && sector_ok
}

/// talent_to_talent: both sides are looking for a co-founder.
pub fn cofounder_eligible(source: &TalentProfile, candidate: &TalentProfile) -> bool {
    source.user_id != candidate.user_id
        && source.looking_for_cofounder
        && candidate.looking_for_cofounder
}

fn check_size_fits(investor: &InvestorProfile, startup: &Startup) -> bool {
    let Some(ask) = startup.funding_ask else {
        return false;
    };
    if investor.check_size_min.is_none() && investor.check_size_max.is_none() {
        return false;
    }
    let min = investor.check_size_min.unwrap_or(0.0);
    let max = investor.check_size_max.unwrap_or(f64::INFINITY);
    (min..=max).contains(&ask)
}

const ALIGNMENT_FLOOR: f64 = 0.4;
const SECTOR_HIT: f64 = 0.3;
const STAGE_HIT: f64 = 0.2;
const CHECK_SIZE_HIT: f64 = 0.1;

/// Co-founder score when the semantic signal is missing.
pub const NEUTRAL_COFOUNDER_SCORE: f64 = 0.5;

/// Thesis alignment for an eligible startup/investor pair: a floor for passing
/// eligibility plus a bonus for each explicit sector, stage and check-size hit.
fn thesis_alignment(sector: bool, stage: bool, check_size: bool) -> f64 {
    let mut score = ALIGNMENT_FLOOR;
    if sector {
        score += SECTOR_HIT;
    }
    if stage {
        score += STAGE_HIT;
    }
    if check_size {
        score += CHECK_SIZE_HIT;
    }
    score.min(1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Ranker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Ranker {
    fusion: FusionWeights,
    skills: SkillWeights,
    min_score: f64,
    max_results: usize,
}

impl Ranker {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            fusion: FusionWeights {
                skill: config.skill_weight,
                semantic: config.semantic_weight,
            },
            skills: SkillWeights::from(config),
            min_score: config.min_score,
            max_results: config.max_results,
        }
    }

    /// Scores a talent against a requirement. The caller picks the target side.
    pub fn score_requirement_pair(
        &self,
        req: &Requirement,
        talent: &TalentProfile,
        target_user_id: UserId,
        candidate_id: i64,
        req_vector: Option<&[f32]>,
        talent_vector: Option<&[f32]>,
    ) -> Option<NewMatch> {
        let overlap = score_overlap(
            &req.required_skills,
            &req.nice_to_have_skills,
            &talent.skill_tokens(),
            &self.skills,
        );
        let semantic = semantic_score(req_vector, talent_vector);
        let overall = fuse(Some(overlap.score), semantic, &self.fusion)?;

        let mut reasons = vec![format!(
            "required_skills:{}/{}",
            overlap.matched.len(),
            req.required_skills.len()
        )];
        if !req.nice_to_have_skills.is_empty() {
            reasons.push(format!(
                "nice_to_have:{}/{}",
                overlap.nice_matched.len(),
                req.nice_to_have_skills.len()
            ));
        }
        if semantic.is_none() {
            reasons.push("semantic_unavailable".to_string());
        }

        Some(NewMatch {
            target_user_id,
            candidate_id,
            requirement_id: Some(req.id),
            overall_score: overall,
            skill_overlap_score: Some(overlap.score),
            semantic_score: semantic,
            matched_skills: overlap.matched,
            missing_skills: overlap.missing,
            matched_nice_to_have: overlap.nice_matched,
            reasons,
        })
    }

    /// Scores a startup/investor pair. There is no skill dimension here; without
    /// embeddings the pair is ranked on thesis alignment instead.
    pub fn score_investor_pair(
        &self,
        startup: &Startup,
        investor: &InvestorProfile,
        target_user_id: UserId,
        candidate_id: i64,
        startup_vector: Option<&[f32]>,
        investor_vector: Option<&[f32]>,
    ) -> NewMatch {
        let sector = investor.preferred_sectors.contains(&startup.industry);
        let stage = investor.preferred_stages.contains(&startup.stage);
        let check_size = check_size_fits(investor, startup);

        let semantic = semantic_score(startup_vector, investor_vector);
        let overall = fuse(None, semantic, &self.fusion)
            .unwrap_or_else(|| thesis_alignment(sector, stage, check_size));

        let mut reasons = Vec::new();
        if sector {
            reasons.push("sector_match".to_string());
        }
        if stage {
            reasons.push("stage_match".to_string());
        }
        if check_size {
            reasons.push("check_size_match".to_string());
        }
        if semantic.is_none() {
            reasons.push("semantic_unavailable".to_string());
        }

        NewMatch {
            target_user_id,
            candidate_id,
            requirement_id: None,
            overall_score: overall,
            skill_overlap_score: None,
            semantic_score: semantic,
            matched_skills: vec![],
            missing_skills: vec![],
            matched_nice_to_have: vec![],
            reasons,
        }
    }

    /// Scores a co-founder pair. Shared skills are reported but not scored.
    pub fn score_cofounder_pair(
        &self,
        source: &TalentProfile,
        candidate: &TalentProfile,
        source_vector: Option<&[f32]>,
        candidate_vector: Option<&[f32]>,
    ) -> NewMatch {
        let semantic = semantic_score(source_vector, candidate_vector);
        let overall =
            fuse(None, semantic, &self.fusion).unwrap_or(NEUTRAL_COFOUNDER_SCORE);
        let shared = source
            .skill_tokens()
            .intersection(&candidate.skill_tokens())
            .cloned()
            .collect();

        let mut reasons = vec!["cofounder_seeking".to_string()];
        if semantic.is_none() {
            reasons.push("semantic_unavailable".to_string());
        }

        NewMatch {
            target_user_id: candidate.user_id,
            candidate_id: candidate.id,
            requirement_id: None,
            overall_score: overall,
            skill_overlap_score: None,
            semantic_score: semantic,
            matched_skills: shared,
            missing_skills: vec![],
            matched_nice_to_have: vec![],
            reasons,
        }
    }

    /// Drops noise, orders best-first with a deterministic tie-break, and caps the list.
    pub fn rank(&self, scored: Vec<NewMatch>) -> Vec<NewMatch> {
        let mut kept: Vec<NewMatch> = scored
            .into_iter()
            .filter(|m| m.overall_score >= self.min_score)
            .collect();
        kept.sort_by(rank_order);
        kept.truncate(self.max_results);
        kept
    }
}

/// Ties break on the candidate entity's id, then the requirement.
fn rank_order(a: &NewMatch, b: &NewMatch) -> Ordering {
    b.overall_score
        .total_cmp(&a.overall_score)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        .then_with(|| a.requirement_id.cmp(&b.requirement_id))
}
