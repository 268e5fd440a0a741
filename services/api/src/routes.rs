use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::json;
use std::sync::Arc;
use talent_rank::workflows::ranking::{ranking_router, ProfileRepository, RankingService};

pub(crate) fn with_ranking_routes<R>(service: Arc<RankingService<R>>) -> axum::Router
where
    R: ProfileRepository + 'static,
{
    ranking_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryProfileRepository;
    use axum::body::Body;
    use axum::http::Request;
    use talent_rank::config::RankingConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_route_is_mounted_beside_ranking_routes() {
        let service = Arc::new(RankingService::new(
            Arc::new(InMemoryProfileRepository::default()),
            RankingConfig::default(),
        ));
        let router = with_ranking_routes(service);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let sweep = router
            .oneshot(
                Request::post("/api/v1/rankings/recalculate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(sweep.status(), StatusCode::OK);
    }
}
