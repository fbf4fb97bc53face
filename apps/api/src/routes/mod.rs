pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::connections::handlers as connections;
use crate::copilot::handlers as copilot;
use crate::matching::handlers as matches;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matches API
        .route("/api/v1/matches", get(matches::handle_get_matches))
        .route("/api/v1/matches/refresh", post(matches::handle_refresh))
        // Connections API
        .route(
            "/api/v1/connections",
            get(connections::handle_list).post(connections::handle_create),
        )
        .route(
            "/api/v1/connections/:id/accept",
            post(connections::handle_accept),
        )
        .route(
            "/api/v1/connections/:id/decline",
            post(connections::handle_decline),
        )
        // Copilot API
        .route(
            "/api/v1/copilot/pitch-feedback",
            post(copilot::handle_pitch_feedback),
        )
        .route("/api/v1/copilot/team-gaps", get(copilot::handle_team_gaps))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::MatchingConfig;
    use crate::connections::workflow::ConnectionService;
    use crate::copilot::StaticFeedback;
    use crate::embedding_client::DisabledEmbeddings;
    use crate::matching::refresh::MatchEngine;
    use crate::models::profile::{EngagementType, StartupStage};
    use crate::store::memory::{MemoryConnections, MemoryMatches, MemoryProfiles};
    use crate::testing::{requirement, startup, talent};

    fn test_router() -> Router {
        let profiles = Arc::new(MemoryProfiles::default());
        profiles.add_startup(startup(1, 10, "fintech", StartupStage::Mvp));
        profiles.add_requirement(requirement(
            7,
            1,
            &["react", "python"],
            &["docker"],
            EngagementType::PartTime,
        ));
        profiles.add_talent(talent(5, &["react", "docker"], EngagementType::PartTime, false));

        let engine = MatchEngine::new(
            profiles.clone(),
            Arc::new(MemoryMatches::default()),
            Arc::new(DisabledEmbeddings),
            &MatchingConfig::default(),
        );
        build_router(AppState {
            profiles,
            engine: Arc::new(engine),
            connections: ConnectionService::new(Arc::new(MemoryConnections::default())),
            feedback: Arc::new(StaticFeedback),
        })
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(b) => request.body(Body::from(b.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&test_router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "matchmaker");
    }

    #[tokio::test]
    async fn test_refresh_then_read_matches() {
        let router = test_router();
        let (status, body) =
            send(&router, "POST", "/api/v1/matches/refresh", Some(json!({"user_id": 5}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"][0]["target_user_id"], 10);
        assert_eq!(body["matches"][0]["match_type"], "talent_to_startup");
        assert_eq!(body["matches"][0]["missing_skills"], json!(["python"]));

        let (status, body) = send(&router, "GET", "/api/v1/matches?user_id=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_refresh_unknown_user_is_404() {
        let (status, body) = send(
            &test_router(),
            "POST",
            "/api/v1/matches/refresh",
            Some(json!({"user_id": 999})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_connection_lifecycle_over_http() {
        let router = test_router();
        let (status, created) = send(
            &router,
            "POST",
            "/api/v1/connections",
            Some(json!({"from_user_id": 5, "to_user_id": 10, "message": "Hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/connections",
            Some(json!({"from_user_id": 10, "to_user_id": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_PENDING");

        let accept = format!("/api/v1/connections/{id}/accept");
        let (status, _) = send(&router, "POST", &accept, Some(json!({"actor_id": 5}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&router, "POST", &accept, Some(json!({"actor_id": 10}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "accepted");

        let decline = format!("/api/v1/connections/{id}/decline");
        let (status, body) = send(&router, "POST", &decline, Some(json!({"actor_id": 10}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, body) = send(&router, "GET", "/api/v1/connections?user_id=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connections"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_self_connection_is_400() {
        let (status, body) = send(
            &test_router(),
            "POST",
            "/api/v1/connections",
            Some(json!({"from_user_id": 5, "to_user_id": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_copilot_endpoints() {
        let router = test_router();
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/copilot/pitch-feedback",
            Some(json!({"pitch_text": "We digitise rural payments."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["overall_score"].as_u64().is_some());

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/copilot/pitch-feedback",
            Some(json!({"pitch_text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&router, "GET", "/api/v1/copilot/team-gaps?user_id=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["missing_roles"][0]["importance"], "critical");

        let (status, _) = send(&router, "GET", "/api/v1/copilot/team-gaps?user_id=5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
