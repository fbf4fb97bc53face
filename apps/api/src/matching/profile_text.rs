//! Deterministic text summaries of each profile kind, fed to the embedding provider.

use crate::matching::semantic::EmbeddingInput;
use crate::models::profile::{InvestorProfile, Requirement, Startup, TalentProfile};

const NOT_AVAILABLE: &str = "N/A";

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

fn join<'a, I: IntoIterator<Item = &'a String>>(items: I) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn talent_text(profile: &TalentProfile) -> String {
    let skills = join(profile.skills.iter().map(|s| &s.name));
    [
        format!("Skills: {skills}"),
        format!("Degree: {}", or_na(profile.degree.as_deref())),
        format!("Institution: {}", or_na(profile.institution.as_deref())),
        format!("Engagement: {}", profile.engagement_preference.as_str()),
        format!("Bio: {}", or_na(profile.bio.as_deref())),
    ]
    .join(". ")
}

pub fn requirement_text(req: &Requirement) -> String {
    [
        format!("Role: {}", req.title),
        format!("Required skills: {}", join(&req.required_skills)),
        format!("Nice to have: {}", join(&req.nice_to_have_skills)),
        format!("Description: {}", or_na(req.description.as_deref())),
        format!("Engagement: {}", req.engagement_type.as_str()),
    ]
    .join(". ")
}

pub fn startup_text(startup: &Startup) -> String {
    [
        format!("Name: {}", startup.name),
        format!("Industry: {}", startup.industry),
        format!("Stage: {}", startup.stage.as_str()),
        format!("Description: {}", or_na(startup.description.as_deref())),
        format!("Traction: {}", or_na(startup.traction_summary.as_deref())),
    ]
    .join(". ")
}

pub fn investor_text(profile: &InvestorProfile) -> String {
    let stages = profile
        .preferred_stages
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    [
        format!("Thesis: {}", or_na(profile.thesis.as_deref())),
        format!("Sectors: {}", join(&profile.preferred_sectors)),
        format!("Stages: {stages}"),
        format!("Type: {}", profile.investor_type),
    ]
    .join(". ")
}

pub fn talent_input(profile: &TalentProfile) -> EmbeddingInput {
    EmbeddingInput {
        stored: profile.embedding.clone(),
        text: talent_text(profile),
    }
}

pub fn requirement_input(req: &Requirement) -> EmbeddingInput {
    EmbeddingInput {
        stored: req.embedding.clone(),
        text: requirement_text(req),
    }
}

pub fn startup_input(startup: &Startup) -> EmbeddingInput {
    EmbeddingInput {
        stored: startup.embedding.clone(),
        text: startup_text(startup),
    }
}

pub fn investor_input(profile: &InvestorProfile) -> EmbeddingInput {
    EmbeddingInput {
        stored: profile.embedding.clone(),
        text: investor_text(profile),
    }
}
