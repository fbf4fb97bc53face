//! Skill-Overlap Scorer: discrete set overlap between a requirement and a candidate.
//!
//! score = w_req · |required ∩ candidate| / |required|
//!       + w_nice · |nice ∩ candidate| / max(1, |nice|)
//!
//! An empty required set counts as fully satisfied. Nice-to-have skills add to the
//! score but never appear in `missing`.

use serde::Serialize;

use crate::config::MatchingConfig;
use crate::models::profile::TokenSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillWeights {
    pub required: f64,
    pub nice_to_have: f64,
}

impl Default for SkillWeights {
    fn default() -> Self {
        Self {
            required: 0.8,
            nice_to_have: 0.2,
        }
    }
}

impl From<&MatchingConfig> for SkillWeights {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            required: config.required_weight,
            nice_to_have: config.nice_to_have_weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillOverlap {
    pub score: f64,
    /// required ∩ candidate, sorted.
    pub matched: Vec<String>,
    /// required ∖ candidate, sorted.
    pub missing: Vec<String>,
    /// nice ∩ candidate, sorted.
    pub nice_matched: Vec<String>,
}

pub fn score_overlap(
    required: &TokenSet,
    nice_to_have: &TokenSet,
    candidate: &TokenSet,
    weights: &SkillWeights,
) -> SkillOverlap {
    let matched: Vec<String> = required.intersection(candidate).cloned().collect();
    let missing: Vec<String> = required.difference(candidate).cloned().collect();
    let nice_matched: Vec<String> = nice_to_have.intersection(candidate).cloned().collect();

    let required_term = if required.is_empty() {
        weights.required
    } else {
        weights.required * matched.len() as f64 / required.len() as f64
    };
    let nice_term =
        weights.nice_to_have * nice_matched.len() as f64 / nice_to_have.len().max(1) as f64;

    SkillOverlap {
        score: (required_term + nice_term).clamp(0.0, 1.0),
        matched,
        missing,
        nice_matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> TokenSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_worked_example_react_python_docker() {
        let overlap = score_overlap(
            &set(&["react", "python"]),
            &set(&["docker"]),
            &set(&["react", "docker"]),
            &SkillWeights::default(),
        );
        assert!((overlap.score - 0.6).abs() < 1e-9, "score was {}", overlap.score);
        assert_eq!(overlap.matched, vec!["react"]);
        assert_eq!(overlap.missing, vec!["python"]);
        assert_eq!(overlap.nice_matched, vec!["docker"]);
    }

    #[test]
    fn test_empty_required_contributes_full_weight() {
        let overlap = score_overlap(
            &set(&[]),
            &set(&["figma"]),
            &set(&["figma"]),
            &SkillWeights::default(),
        );
        assert!((overlap.score - 1.0).abs() < 1e-9);
        assert!(overlap.missing.is_empty());
        assert!(overlap.matched.is_empty());
    }

    #[test]
    fn test_empty_nice_contributes_nothing() {
        let overlap = score_overlap(
            &set(&["rust"]),
            &set(&[]),
            &set(&["rust"]),
            &SkillWeights::default(),
        );
        assert!((overlap.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_nice_to_have_never_reported_missing() {
        let overlap = score_overlap(
            &set(&["go"]),
            &set(&["kafka", "redis"]),
            &set(&[]),
            &SkillWeights::default(),
        );
        assert_eq!(overlap.missing, vec!["go"]);
        assert!(overlap.score.abs() < 1e-9);
    }

    #[test]
    fn test_matched_and_missing_partition_required() {
        let required = set(&["a", "b", "c", "d"]);
        let candidates = [set(&[]), set(&["a"]), set(&["b", "d", "z"]), set(&["a", "b", "c", "d"])];
        for candidate in &candidates {
            let overlap =
                score_overlap(&required, &set(&["z"]), candidate, &SkillWeights::default());
            let matched: TokenSet = overlap.matched.iter().cloned().collect();
            let missing: TokenSet = overlap.missing.iter().cloned().collect();
            assert!(matched.is_disjoint(&missing));
            assert!(matched.is_subset(&required));
            assert_eq!(matched.union(&missing).cloned().collect::<TokenSet>(), required);
        }
    }

    #[test]
    fn test_score_clamped_with_oversized_weights() {
        let weights = SkillWeights {
            required: 1.0,
            nice_to_have: 1.0,
        };
        let overlap = score_overlap(&set(&["x"]), &set(&["y"]), &set(&["x", "y"]), &weights);
        assert_eq!(overlap.score, 1.0);
    }
}
