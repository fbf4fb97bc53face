use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::errors::AppError;
use crate::matching::normalize::{
    normalize_engagement, normalize_sector, normalize_skill, normalize_stage, token_set,
};
use crate::models::profile::{
    InvestorProfile, OpenRole, Proficiency, Profile, Requirement, Role, Skill, Startup,
    TalentProfile, UserId,
};
use crate::store::ProfileSource;

#[derive(Debug, FromRow)]
struct StartupRow {
    id: i64,
    founder_id: i64,
    name: String,
    description: Option<String>,
    industry: String,
    stage: String,
    funding_ask: Option<f64>,
    traction_summary: Option<String>,
    team_size: i32,
    embedding: Option<Json<Vec<f32>>>,
}

#[derive(Debug, FromRow)]
struct RequirementRow {
    id: i64,
    startup_id: i64,
    title: String,
    description: Option<String>,
    required_skills: Vec<String>,
    nice_to_have_skills: Vec<String>,
    engagement_type: String,
    is_active: bool,
    embedding: Option<Json<Vec<f32>>>,
}

#[derive(Debug, FromRow)]
struct TalentRow {
    id: i64,
    user_id: i64,
    bio: Option<String>,
    institution: Option<String>,
    degree: Option<String>,
    engagement_preference: String,
    looking_for_cofounder: bool,
    embedding: Option<Json<Vec<f32>>>,
}

#[derive(Debug, FromRow)]
struct SkillRow {
    profile_id: i64,
    name: String,
    proficiency: String,
    years_experience: f64,
}

#[derive(Debug, FromRow)]
struct InvestorRow {
    id: i64,
    user_id: i64,
    investor_type: String,
    investment_thesis: Option<String>,
    preferred_sectors: Vec<String>,
    preferred_stages: Vec<String>,
    check_size_min: Option<f64>,
    check_size_max: Option<f64>,
    embedding: Option<Json<Vec<f32>>>,
}

const STARTUP_COLUMNS: &str = "id, founder_id, name, description, industry, stage, funding_ask, \
     traction_summary, team_size, embedding";

const REQUIREMENT_COLUMNS: &str = "id, startup_id, title, description, required_skills, \
     nice_to_have_skills, engagement_type, is_active, embedding";

const TALENT_QUERY: &str = r#"
    SELECT tp.id, tp.user_id, u.bio, tp.institution, tp.degree,
           tp.engagement_preference, tp.looking_for_cofounder, tp.embedding
    FROM talent_profiles tp
    JOIN users u ON u.id = tp.user_id
"#;

const INVESTOR_COLUMNS: &str = "id, user_id, investor_type, investment_thesis, preferred_sectors, \
     preferred_stages, check_size_min, check_size_max, embedding";

fn startup_from_row(row: StartupRow) -> Result<Startup, AppError> {
    let stage = normalize_stage(&row.stage).ok_or_else(|| {
        AppError::Validation(format!("startup {} has unknown stage '{}'", row.id, row.stage))
    })?;
    Ok(Startup {
        id: row.id,
        founder_id: row.founder_id,
        name: row.name,
        industry: normalize_sector(&row.industry),
        stage,
        funding_ask: row.funding_ask,
        description: row.description,
        traction_summary: row.traction_summary,
        team_size: row.team_size,
        embedding: row.embedding.map(|Json(v)| v),
    })
}

fn requirement_from_row(row: RequirementRow) -> Result<Requirement, AppError> {
    let engagement_type = normalize_engagement(&row.engagement_type).ok_or_else(|| {
        AppError::Validation(format!(
            "requirement {} has unknown engagement type '{}'",
            row.id, row.engagement_type
        ))
    })?;
    Ok(Requirement {
        id: row.id,
        startup_id: row.startup_id,
        title: row.title,
        description: row.description,
        raw_required_count: row.required_skills.len(),
        required_skills: token_set(&row.required_skills, normalize_skill),
        nice_to_have_skills: token_set(&row.nice_to_have_skills, normalize_skill),
        engagement_type,
        is_active: row.is_active,
        embedding: row.embedding.map(|Json(v)| v),
    })
}

/// Collapses raw skill rows onto canonical names, keeping the most experienced entry.
fn canonical_skills(rows: Vec<SkillRow>) -> Vec<Skill> {
    let mut by_name: BTreeMap<String, Skill> = BTreeMap::new();
    for row in rows {
        let name = normalize_skill(&row.name);
        if name.is_empty() {
            continue;
        }
        let skill = Skill {
            name: name.clone(),
            proficiency: Proficiency::parse(&row.proficiency),
            years_experience: row.years_experience,
        };
        match by_name.get(&name) {
            Some(existing) if existing.years_experience >= skill.years_experience => {}
            _ => {
                by_name.insert(name, skill);
            }
        }
    }
    by_name.into_values().collect()
}

fn talent_from_row(row: TalentRow, skills: Vec<SkillRow>) -> Result<TalentProfile, AppError> {
    let engagement_preference = normalize_engagement(&row.engagement_preference).ok_or_else(|| {
        AppError::Validation(format!(
            "talent profile {} has unknown engagement preference '{}'",
            row.id, row.engagement_preference
        ))
    })?;
    Ok(TalentProfile {
        id: row.id,
        user_id: row.user_id,
        skills: canonical_skills(skills),
        engagement_preference,
        looking_for_cofounder: row.looking_for_cofounder,
        bio: row.bio,
        institution: row.institution,
        degree: row.degree,
        embedding: row.embedding.map(|Json(v)| v),
    })
}

fn investor_from_row(row: InvestorRow) -> InvestorProfile {
    let preferred_stages = row
        .preferred_stages
        .iter()
        .filter_map(|raw| {
            let stage = normalize_stage(raw);
            if stage.is_none() {
                warn!(investor_id = row.id, "Ignoring unknown preferred stage '{raw}'");
            }
            stage
        })
        .collect();
    InvestorProfile {
        id: row.id,
        user_id: row.user_id,
        investor_type: row.investor_type,
        thesis: row.investment_thesis,
        preferred_sectors: token_set(&row.preferred_sectors, normalize_sector),
        preferred_stages,
        raw_stage_count: row.preferred_stages.len(),
        check_size_min: row.check_size_min,
        check_size_max: row.check_size_max,
        embedding: row.embedding.map(|Json(v)| v),
    }
}

/// Keeps the rows that convert, logging the ones that do not.
fn keep_valid<T>(converted: impl IntoIterator<Item = Result<T, AppError>>) -> Vec<T> {
    converted
        .into_iter()
        .filter_map(|r| match r {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed profile row: {e}");
                None
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct PgProfileSource {
    pool: PgPool,
}

impl PgProfileSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn skills_for(&self, profile_ids: &[i64]) -> Result<HashMap<i64, Vec<SkillRow>>, AppError> {
        let rows: Vec<SkillRow> = sqlx::query_as(
            "SELECT profile_id, name, proficiency, years_experience \
             FROM talent_skills WHERE profile_id = ANY($1)",
        )
        .bind(profile_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<SkillRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.profile_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn talent_rows(&self, user_id: Option<UserId>) -> Result<Vec<TalentProfile>, AppError> {
        let rows: Vec<TalentRow> = match user_id {
            Some(id) => {
                sqlx::query_as(&format!("{TALENT_QUERY} WHERE tp.user_id = $1"))
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as(&format!("{TALENT_QUERY} ORDER BY tp.user_id"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut skills = self.skills_for(&ids).await?;
        Ok(keep_valid(rows.into_iter().map(|row| {
            let own = skills.remove(&row.id).unwrap_or_default();
            talent_from_row(row, own)
        })))
    }
}

#[async_trait]
impl ProfileSource for PgProfileSource {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, AppError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(role) = role.as_deref().and_then(Role::parse) else {
            return Ok(None);
        };

        match role {
            Role::Founder => {
                let row: Option<StartupRow> = sqlx::query_as(&format!(
                    "SELECT {STARTUP_COLUMNS} FROM startups WHERE founder_id = $1"
                ))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
                let Some(row) = row else {
                    return Ok(None);
                };
                let startup = startup_from_row(row)?;
                let requirements = self.list_requirements(startup.id).await?;
                Ok(Some(Profile::Founder {
                    startup,
                    requirements,
                }))
            }
            Role::Talent => Ok(self
                .talent_rows(Some(user_id))
                .await?
                .into_iter()
                .next()
                .map(Profile::Talent)),
            Role::Investor => {
                let row: Option<InvestorRow> = sqlx::query_as(&format!(
                    "SELECT {INVESTOR_COLUMNS} FROM investor_profiles WHERE user_id = $1"
                ))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
                Ok(row.map(investor_from_row).map(Profile::Investor))
            }
        }
    }

    async fn list_requirements(&self, startup_id: i64) -> Result<Vec<Requirement>, AppError> {
        let rows: Vec<RequirementRow> = sqlx::query_as(&format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM talent_requirements WHERE startup_id = $1 ORDER BY id"
        ))
        .bind(startup_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keep_valid(rows.into_iter().map(requirement_from_row)))
    }

    async fn list_open_roles(&self) -> Result<Vec<OpenRole>, AppError> {
        let requirements: Vec<RequirementRow> = sqlx::query_as(&format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM talent_requirements WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        let startups: HashMap<i64, Startup> = self
            .list_startups()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(keep_valid(requirements.into_iter().map(requirement_from_row))
            .into_iter()
            .filter_map(|requirement| {
                let startup = startups.get(&requirement.startup_id)?.clone();
                Some(OpenRole {
                    startup,
                    requirement,
                })
            })
            .collect())
    }

    async fn list_talent(&self) -> Result<Vec<TalentProfile>, AppError> {
        self.talent_rows(None).await
    }

    async fn list_investors(&self) -> Result<Vec<InvestorProfile>, AppError> {
        let rows: Vec<InvestorRow> = sqlx::query_as(&format!(
            "SELECT {INVESTOR_COLUMNS} FROM investor_profiles ORDER BY user_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(investor_from_row).collect())
    }

    async fn list_startups(&self) -> Result<Vec<Startup>, AppError> {
        let rows: Vec<StartupRow> = sqlx::query_as(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startups ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(keep_valid(rows.into_iter().map(startup_from_row)))
    }
}
