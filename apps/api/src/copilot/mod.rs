// Founder copilot: pitch feedback and team-gap analysis.
// Opaque to the matching core; nothing here feeds into ranking.

pub mod handlers;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::profile::{Requirement, Startup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchFeedback {
    pub overall_score: u8,
    pub market_size: DimensionScore,
    pub traction: DimensionScore,
    pub team: DimensionScore,
    pub defensibility: DimensionScore,
    pub summary: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl PitchFeedback {
    /// Pulls model-supplied scores back into their documented ranges.
    fn clamped(mut self) -> Self {
        self.overall_score = self.overall_score.clamp(1, 100);
        for dim in [
            &mut self.market_size,
            &mut self.traction,
            &mut self.team,
            &mut self.defensibility,
        ] {
            dim.score = dim.score.clamp(1, 10);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleImportance {
    Critical,
    Important,
    NiceToHave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRole {
    pub role: String,
    pub importance: RoleImportance,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGapReport {
    pub missing_roles: Vec<MissingRole>,
    pub investor_readiness_score: u8,
    pub summary: String,
}

#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn analyze_pitch(&self, pitch_text: &str) -> Result<PitchFeedback, AppError>;

    async fn analyze_team_gaps(
        &self,
        startup: &Startup,
        open_roles: &[Requirement],
    ) -> Result<TeamGapReport, AppError>;
}

/// Canned feedback used when no LLM key is configured.
pub struct StaticFeedback;

impl StaticFeedback {
    pub fn pitch() -> PitchFeedback {
        PitchFeedback {
            overall_score: 65,
            market_size: DimensionScore {
                score: 7,
                feedback: "The need is clear; size the local market with concrete figures."
                    .to_string(),
            },
            traction: DimensionScore {
                score: 5,
                feedback: "Show early evidence such as user interviews, pilots or letters of intent."
                    .to_string(),
            },
            team: DimensionScore {
                score: 6,
                feedback: "A core team exists but key technical or commercial roles are open."
                    .to_string(),
            },
            defensibility: DimensionScore {
                score: 5,
                feedback: "Explain what would make this hard for a competitor to copy.".to_string(),
            },
            summary: "A promising idea with a visible need. Stronger traction evidence and a \
                      fuller team would raise investor confidence."
                .to_string(),
            suggestions: vec![
                "State TAM, SAM and SOM for your home market".to_string(),
                "Include customer quotes or signed letters of intent".to_string(),
                "Name your unfair advantage".to_string(),
                "Address competitors directly".to_string(),
            ],
        }
    }

    pub fn team_gaps() -> TeamGapReport {
        TeamGapReport {
            missing_roles: vec![
                MissingRole {
                    role: "CTO".to_string(),
                    importance: RoleImportance::Critical,
                    reason: "Technical leadership is needed to build and scale the product."
                        .to_string(),
                },
                MissingRole {
                    role: "Growth Lead".to_string(),
                    importance: RoleImportance::Important,
                    reason: "User acquisition needs a dedicated owner.".to_string(),
                },
            ],
            investor_readiness_score: 55,
            summary: "Strong domain knowledge, but technical leadership and growth are uncovered."
                .to_string(),
        }
    }
}

#[async_trait]
impl FeedbackService for StaticFeedback {
    async fn analyze_pitch(&self, _pitch_text: &str) -> Result<PitchFeedback, AppError> {
        Ok(Self::pitch())
    }

    async fn analyze_team_gaps(
        &self,
        _startup: &Startup,
        _open_roles: &[Requirement],
    ) -> Result<TeamGapReport, AppError> {
        Ok(Self::team_gaps())
    }
}

/// LLM-backed feedback. Unparseable replies fall back to the static record;
/// transport and API failures surface as `AppError::Llm`.
pub struct LlmCopilot {
    llm: LlmClient,
}

impl LlmCopilot {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

fn recover<T>(result: Result<T, LlmError>, fallback: impl FnOnce() -> T) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_malformed_output() => {
            warn!("LLM reply unusable, returning static feedback: {e}");
            Ok(fallback())
        }
        Err(e) => Err(AppError::Llm(e.to_string())),
    }
}

#[async_trait]
impl FeedbackService for LlmCopilot {
    async fn analyze_pitch(&self, pitch_text: &str) -> Result<PitchFeedback, AppError> {
        let result = self
            .llm
            .call_json::<PitchFeedback>(&prompts::pitch_prompt(pitch_text), &prompts::pitch_system())
            .await;
        recover(result.map(PitchFeedback::clamped), StaticFeedback::pitch)
    }

    async fn analyze_team_gaps(
        &self,
        startup: &Startup,
        open_roles: &[Requirement],
    ) -> Result<TeamGapReport, AppError> {
        let result = self
            .llm
            .call_json::<TeamGapReport>(
                &prompts::team_gaps_prompt(startup, open_roles),
                &prompts::team_gaps_system(),
            )
            .await;
        recover(
            result.map(|mut r| {
                r.investor_readiness_score = r.investor_readiness_score.clamp(1, 100);
                r
            }),
            StaticFeedback::team_gaps,
        )
    }
}
