use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::matching::MatchType;

pub type UserId = i64;

/// Normalized token set: deduplicated, case-folded, order-irrelevant.
pub type TokenSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Founder,
    Talent,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "founder",
            Role::Talent => "talent",
            Role::Investor => "investor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "founder" => Some(Role::Founder),
            "talent" => Some(Role::Talent),
            "investor" => Some(Role::Investor),
            _ => None,
        }
    }

    /// Directions a refresh for this role regenerates, in write order.
    pub fn match_types(&self) -> &'static [MatchType] {
        match self {
            Role::Founder => &[MatchType::TalentToStartup, MatchType::StartupToInvestor],
            Role::Talent => &[MatchType::TalentToStartup, MatchType::TalentToTalent],
            Role::Investor => &[MatchType::StartupToInvestor],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StartupStage {
    Idea,
    Mvp,
    EarlyTraction,
    Growth,
}

impl StartupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartupStage::Idea => "idea",
            StartupStage::Mvp => "mvp",
            StartupStage::EarlyTraction => "early_traction",
            StartupStage::Growth => "growth",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "idea" => Some(StartupStage::Idea),
            "mvp" => Some(StartupStage::Mvp),
            "early_traction" => Some(StartupStage::EarlyTraction),
            "growth" => Some(StartupStage::Growth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EngagementType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Cofounder,
}

impl EngagementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::FullTime => "full_time",
            EngagementType::PartTime => "part_time",
            EngagementType::Contract => "contract",
            EngagementType::Internship => "internship",
            EngagementType::Cofounder => "cofounder",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "full_time" => Some(EngagementType::FullTime),
            "part_time" => Some(EngagementType::PartTime),
            "contract" => Some(EngagementType::Contract),
            "internship" => Some(EngagementType::Internship),
            "cofounder" => Some(EngagementType::Cofounder),
            _ => None,
        }
    }

    /// Whether a talent with this preference can take a role offered as `offered`.
    ///
    /// Contract work is open to anyone preferring full- or part-time work, and a
    /// talent seeking a co-founder seat also takes full-time roles.
    pub fn accepts(&self, offered: EngagementType) -> bool {
        if *self == offered {
            return true;
        }
        matches!(
            (self, offered),
            (EngagementType::FullTime, EngagementType::Contract)
                | (EngagementType::PartTime, EngagementType::Contract)
                | (EngagementType::Cofounder, EngagementType::FullTime)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Proficiency::Beginner,
            "advanced" => Proficiency::Advanced,
            "expert" => Proficiency::Expert,
            _ => Proficiency::Intermediate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    /// Canonical skill token.
    pub name: String,
    pub proficiency: Proficiency,
    pub years_experience: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Startup {
    pub id: i64,
    pub founder_id: UserId,
    pub name: String,
    /// Canonical sector token.
    pub industry: String,
    pub stage: StartupStage,
    pub funding_ask: Option<f64>,
    pub description: Option<String>,
    pub traction_summary: Option<String>,
    pub team_size: i32,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i64,
    pub startup_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub required_skills: TokenSet,
    pub nice_to_have_skills: TokenSet,
    pub engagement_type: EngagementType,
    pub is_active: bool,
    /// Count of raw required-skill entries before normalization.
    #[serde(skip)]
    pub raw_required_count: usize,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl Requirement {
    /// A requirement that listed required skills which all normalized away is malformed.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.raw_required_count > 0 && self.required_skills.is_empty() {
            return Err(AppError::Validation(format!(
                "requirement {} lists {} required skills but none survive normalization",
                self.id, self.raw_required_count
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalentProfile {
    pub id: i64,
    pub user_id: UserId,
    pub skills: Vec<Skill>,
    pub engagement_preference: EngagementType,
    pub looking_for_cofounder: bool,
    pub bio: Option<String>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl TalentProfile {
    pub fn skill_tokens(&self) -> TokenSet {
        self.skills.iter().map(|s| s.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub id: i64,
    pub user_id: UserId,
    pub investor_type: String,
    pub thesis: Option<String>,
    pub preferred_sectors: TokenSet,
    pub preferred_stages: BTreeSet<StartupStage>,
    /// Count of raw stage labels before parsing. Non-zero means the investor
    /// stated a stage preference, even if none of the labels were recognised.
    #[serde(skip)]
    pub raw_stage_count: usize,
    pub check_size_min: Option<f64>,
    pub check_size_max: Option<f64>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl InvestorProfile {
    /// An investor who never stated a stage takes every stage. One who stated
    /// only unrecognised labels takes none.
    pub fn accepts_stage(&self, stage: StartupStage) -> bool {
        if self.raw_stage_count == 0 {
            return true;
        }
        self.preferred_stages.contains(&stage)
    }
}

/// A startup's open role, paired with the startup that owns it.
#[derive(Debug, Clone)]
pub struct OpenRole {
    pub startup: Startup,
    pub requirement: Requirement,
}

/// A participant's role-specific profile as loaded for matching.
#[derive(Debug, Clone)]
pub enum Profile {
    Founder {
        startup: Startup,
        requirements: Vec<Requirement>,
    },
    Talent(TalentProfile),
    Investor(InvestorProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Founder { .. } => Role::Founder,
            Profile::Talent(_) => Role::Talent,
            Profile::Investor(_) => Role::Investor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_exact_match_is_compatible() {
        assert!(EngagementType::PartTime.accepts(EngagementType::PartTime));
        assert!(EngagementType::Internship.accepts(EngagementType::Internship));
    }

    #[test]
    fn test_engagement_contract_open_to_time_based_preferences() {
        assert!(EngagementType::FullTime.accepts(EngagementType::Contract));
        assert!(EngagementType::PartTime.accepts(EngagementType::Contract));
        assert!(!EngagementType::Internship.accepts(EngagementType::Contract));
    }

    #[test]
    fn test_engagement_mismatch_rejected() {
        assert!(!EngagementType::PartTime.accepts(EngagementType::FullTime));
        assert!(!EngagementType::FullTime.accepts(EngagementType::Internship));
        assert!(!EngagementType::Contract.accepts(EngagementType::FullTime));
    }

    #[test]
    fn test_role_match_types() {
        assert_eq!(
            Role::Founder.match_types(),
            &[MatchType::TalentToStartup, MatchType::StartupToInvestor]
        );
        assert_eq!(Role::Investor.match_types(), &[MatchType::StartupToInvestor]);
    }

    #[test]
    fn test_requirement_with_blank_skills_is_invalid() {
        let req = Requirement {
            id: 4,
            startup_id: 1,
            title: "Engineer".into(),
            description: None,
            required_skills: TokenSet::new(),
            nice_to_have_skills: TokenSet::new(),
            engagement_type: EngagementType::FullTime,
            is_active: true,
            raw_required_count: 2,
            embedding: None,
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let open = Requirement {
            raw_required_count: 0,
            ..req
        };
        assert!(open.validate().is_ok());
    }
}
