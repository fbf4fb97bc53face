use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::matching::{Generation, MatchResult, MatchRow};
use crate::models::profile::UserId;
use crate::store::MatchStore;

const MATCH_COLUMNS: &str = "id, generation_id, source_user_id, target_user_id, candidate_id, \
     match_type, requirement_id, overall_score, skill_overlap_score, semantic_score, \
     matched_skills, missing_skills, matched_nice_to_have, reasons, created_at";

#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_results(rows: Vec<MatchRow>) -> Result<Vec<MatchResult>, AppError> {
    let mut results = rows
        .into_iter()
        .map(MatchResult::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    results.sort_by(MatchResult::read_order);
    Ok(results)
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn replace_generations(
        &self,
        source_user_id: UserId,
        generations: Vec<Generation>,
    ) -> Result<Vec<MatchResult>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializes writers for this source across processes; released at commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('matches:' || $1::text, 0))")
            .bind(source_user_id)
            .execute(&mut *tx)
            .await?;

        let mut written: Vec<MatchRow> = Vec::new();
        for generation in generations {
            let match_type = generation.match_type.as_str();
            let generation_id = Uuid::new_v4();

            let deleted = sqlx::query(
                "DELETE FROM matches WHERE source_user_id = $1 AND match_type = $2",
            )
            .bind(source_user_id)
            .bind(match_type)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let inserted = generation.rows.len();
            for row in generation.rows {
                let stored: MatchRow = sqlx::query_as(&format!(
                    r#"
                    INSERT INTO matches
                        (generation_id, source_user_id, target_user_id, candidate_id, match_type,
                         requirement_id, overall_score, skill_overlap_score, semantic_score,
                         matched_skills, missing_skills, matched_nice_to_have, reasons)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    RETURNING {MATCH_COLUMNS}
                    "#
                ))
                .bind(generation_id)
                .bind(source_user_id)
                .bind(row.target_user_id)
                .bind(row.candidate_id)
                .bind(match_type)
                .bind(row.requirement_id)
                .bind(row.overall_score)
                .bind(row.skill_overlap_score)
                .bind(row.semantic_score)
                .bind(&row.matched_skills)
                .bind(&row.missing_skills)
                .bind(&row.matched_nice_to_have)
                .bind(&row.reasons)
                .fetch_one(&mut *tx)
                .await?;
                written.push(stored);
            }

            info!(
                source_user_id,
                match_type,
                %generation_id,
                deleted,
                inserted,
                "Replaced match generation"
            );
        }

        tx.commit().await?;
        into_results(written)
    }

    async fn get(&self, source_user_id: UserId) -> Result<Vec<MatchResult>, AppError> {
        let rows: Vec<MatchRow> = sqlx::query_as(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE source_user_id = $1 \
             ORDER BY overall_score DESC, match_type, candidate_id, requirement_id NULLS FIRST"
        ))
        .bind(source_user_id)
        .fetch_all(&self.pool)
        .await?;
        into_results(rows)
    }
}
