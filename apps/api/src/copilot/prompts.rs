use serde_json::json;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::profile::{Requirement, Startup};

pub fn pitch_system() -> String {
    format!(
        "{JSON_ONLY_SYSTEM}\n\n\
        You are an experienced early-stage investor reviewing a founder's pitch. \
        Score it and return an object with exactly these fields:\n\
        - overall_score: integer 1-100\n\
        - market_size, traction, team, defensibility: each {{\"score\": integer 1-10, \"feedback\": string}}\n\
        - summary: string, two or three sentences\n\
        - suggestions: array of 3-5 concrete, actionable strings"
    )
}

pub fn team_gaps_system() -> String {
    format!(
        "{JSON_ONLY_SYSTEM}\n\n\
        You advise startup founders on team composition. Given a startup profile and its \
        open roles, identify the missing roles that most affect investor readiness. \
        Return an object with exactly these fields:\n\
        - missing_roles: array of {{\"role\": string, \"importance\": \"critical\" | \"important\" | \"nice_to_have\", \"reason\": string}}\n\
        - investor_readiness_score: integer 1-100\n\
        - summary: string"
    )
}

pub fn pitch_prompt(pitch_text: &str) -> String {
    format!("PITCH:\n{}", pitch_text.trim())
}

pub fn team_gaps_prompt(startup: &Startup, open_roles: &[Requirement]) -> String {
    let roles: Vec<_> = open_roles
        .iter()
        .filter(|r| r.is_active)
        .map(|r| {
            json!({
                "title": r.title,
                "required_skills": r.required_skills,
                "engagement_type": r.engagement_type.as_str(),
            })
        })
        .collect();
    let profile = json!({
        "name": startup.name,
        "industry": startup.industry,
        "stage": startup.stage.as_str(),
        "description": startup.description,
        "traction": startup.traction_summary,
        "team_size": startup.team_size,
        "open_roles": roles,
    });
    format!("STARTUP PROFILE:\n{profile:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EngagementType, StartupStage};
    use crate::testing::{requirement, startup};

    #[test]
    fn test_team_gaps_prompt_lists_only_active_roles() {
        let s = startup(1, 10, "edtech", StartupStage::Idea);
        let open = requirement(1, 1, &["react"], &[], EngagementType::PartTime);
        let mut closed = requirement(2, 1, &["go"], &[], EngagementType::FullTime);
        closed.is_active = false;
        let prompt = team_gaps_prompt(&s, &[open, closed]);
        assert!(prompt.contains("\"stage\": \"idea\""));
        assert!(prompt.contains("Role 1"));
        assert!(!prompt.contains("Role 2"));
    }
}
