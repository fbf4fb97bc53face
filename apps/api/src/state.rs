use std::sync::Arc;

use crate::connections::workflow::ConnectionService;
use crate::copilot::FeedbackService;
use crate::matching::refresh::MatchEngine;
use crate::store::ProfileSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileSource>,
    pub engine: Arc<MatchEngine>,
    pub connections: ConnectionService,
    /// Pitch and team-gap feedback. LLM-backed when ANTHROPIC_API_KEY is set, static otherwise.
    pub feedback: Arc<dyn FeedbackService>,
}
