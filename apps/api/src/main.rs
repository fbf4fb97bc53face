mod config;
mod connections;
mod copilot;
mod db;
mod embedding_client;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::connections::workflow::ConnectionService;
use crate::copilot::{FeedbackService, LlmCopilot, StaticFeedback};
use crate::db::create_pool;
use crate::embedding_client::{DisabledEmbeddings, EmbeddingProvider, OpenAiEmbeddingClient};
use crate::llm_client::LlmClient;
use crate::matching::refresh::MatchEngine;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::{PgConnectionStore, PgMatchStore, PgProfileSource};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchmaker v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let embeddings: Arc<dyn EmbeddingProvider> = match &config.openai_api_key {
        Some(key) => {
            info!("Embedding provider: {}", config.embedding_model);
            Arc::new(OpenAiEmbeddingClient::new(
                config.embedding_api_url.clone(),
                key.clone(),
                config.embedding_model.clone(),
            )?)
        }
        None => {
            info!("OPENAI_API_KEY not set; semantic scoring disabled");
            Arc::new(DisabledEmbeddings)
        }
    };

    let feedback: Arc<dyn FeedbackService> = match &config.anthropic_api_key {
        Some(key) => {
            info!("Copilot LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmCopilot::new(LlmClient::new(key.clone())?))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set; copilot returns static feedback");
            Arc::new(StaticFeedback)
        }
    };

    let profiles = Arc::new(PgProfileSource::new(db.clone()));
    let engine = MatchEngine::new(
        profiles.clone(),
        Arc::new(PgMatchStore::new(db.clone())),
        embeddings,
        &config.matching,
    );
    info!(
        "Matching weights: skill={} semantic={} min_score={} max_results={}",
        config.matching.skill_weight,
        config.matching.semantic_weight,
        config.matching.min_score,
        config.matching.max_results
    );

    let state = AppState {
        profiles,
        engine: Arc::new(engine),
        connections: ConnectionService::new(Arc::new(PgConnectionStore::new(db))),
        feedback,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client's domain is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
