use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub openai_api_key: Option<String>,
    pub embedding_api_url: String,
    pub embedding_model: String,
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub matching: MatchingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10, env_lookup)?,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_or("PORT", 8080, env_lookup)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            matching: MatchingConfig::from_lookup(env_lookup)?,
        })
    }
}

/// Tunable product constants for the ranking core.
///
/// The fusion and skill weights are observed product behaviour rather than
/// derived values, so every one of them can be overridden per deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Weight of the skill-overlap signal when both signals are defined.
    pub skill_weight: f64,
    /// Weight of the semantic signal when both signals are defined.
    pub semantic_weight: f64,
    /// Share of the skill-overlap score carried by required skills.
    pub required_weight: f64,
    /// Share of the skill-overlap score carried by nice-to-have skills.
    pub nice_to_have_weight: f64,
    /// Candidates scoring below this are dropped before ranking.
    pub min_score: f64,
    /// Cap on rows per (source, match_type) generation.
    pub max_results: usize,
    pub embedding_timeout: Duration,
    pub embedding_concurrency: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.6,
            semantic_weight: 0.4,
            required_weight: 0.8,
            nice_to_have_weight: 0.2,
            min_score: 0.05,
            max_results: 50,
            embedding_timeout: Duration::from_millis(3000),
            embedding_concurrency: 8,
        }
    }
}

impl MatchingConfig {
    /// Builds the config from a key lookup, falling back to defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            skill_weight: parse_or("MATCH_SKILL_WEIGHT", defaults.skill_weight, &lookup)?,
            semantic_weight: parse_or("MATCH_SEMANTIC_WEIGHT", defaults.semantic_weight, &lookup)?,
            required_weight: parse_or("MATCH_REQUIRED_WEIGHT", defaults.required_weight, &lookup)?,
            nice_to_have_weight: parse_or(
                "MATCH_NICE_WEIGHT",
                defaults.nice_to_have_weight,
                &lookup,
            )?,
            min_score: parse_or("MATCH_MIN_SCORE", defaults.min_score, &lookup)?,
            max_results: parse_or("MATCH_MAX_RESULTS", defaults.max_results, &lookup)?,
            embedding_timeout: Duration::from_millis(parse_or(
                "EMBEDDING_TIMEOUT_MS",
                defaults.embedding_timeout.as_millis() as u64,
                &lookup,
            )?),
            embedding_concurrency: parse_or(
                "EMBEDDING_CONCURRENCY",
                defaults.embedding_concurrency,
                &lookup,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("MATCH_SKILL_WEIGHT", self.skill_weight),
            ("MATCH_SEMANTIC_WEIGHT", self.semantic_weight),
            ("MATCH_REQUIRED_WEIGHT", self.required_weight),
            ("MATCH_NICE_WEIGHT", self.nice_to_have_weight),
            ("MATCH_MIN_SCORE", self.min_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be within [0, 1], got {value}");
            }
        }
        if self.skill_weight + self.semantic_weight <= 0.0 {
            bail!("MATCH_SKILL_WEIGHT and MATCH_SEMANTIC_WEIGHT cannot both be zero");
        }
        if self.required_weight + self.nice_to_have_weight <= 0.0 {
            bail!("MATCH_REQUIRED_WEIGHT and MATCH_NICE_WEIGHT cannot both be zero");
        }
        if self.max_results == 0 {
            bail!("MATCH_MAX_RESULTS must be at least 1");
        }
        if self.embedding_concurrency == 0 {
            bail!("EMBEDDING_CONCURRENCY must be at least 1");
        }
        Ok(())
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T, F>(key: &str, default: T, lookup: F) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ('{raw}'): {e}")),
        None => Ok(default),
    }
}
