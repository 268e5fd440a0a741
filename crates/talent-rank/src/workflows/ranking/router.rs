use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CandidateQuery, ExamCompletion, ProfileDetails, UserId};
use super::region::RegionScope;
use super::repository::{ProfileRepository, RepositoryError};
use super::service::{RankingError, RankingService};

/// Router builder exposing the ranking triggers and read endpoints.
pub fn ranking_router<R>(service: Arc<RankingService<R>>) -> Router
where
    R: ProfileRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/rankings/users/:user_id/refresh",
            post(refresh_handler::<R>),
        )
        .route("/api/v1/rankings/recalculate", post(recalculate_handler::<R>))
        .route("/api/v1/rankings/regions/rerank", post(rerank_handler::<R>))
        .route("/api/v1/rankings/leaderboard", get(leaderboard_handler::<R>))
        .route("/api/v1/candidates", get(candidates_handler::<R>))
        .route(
            "/api/v1/profiles/:user_id",
            get(profile_handler::<R>).put(profile_update_handler::<R>),
        )
        .route("/api/v1/profiles/:user_id/exams", post(exam_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LeaderboardParams {
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    limit: Option<usize>,
}

impl IntoResponse for RankingError {
    fn into_response(self) -> Response {
        let status = match &self {
            RankingError::NotFound { .. } => StatusCode::NOT_FOUND,
            RankingError::InvalidRole { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RankingError::RegionQuery(_) => StatusCode::BAD_REQUEST,
            RankingError::Persistence(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            RankingError::Persistence(RepositoryError::Conflict) => StatusCode::CONFLICT,
            RankingError::Persistence(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

pub(crate) async fn refresh_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.update_user_ranking(&UserId(user_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn recalculate_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.recalculate_all_rankings() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn rerank_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Json(scope): Json<RegionScope>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.rerank_region(&scope) {
        Ok(updated) => {
            let payload = json!({
                "region": scope.to_string(),
                "updated": updated,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn leaderboard_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Query(params): Query<LeaderboardParams>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    let scope = RegionScope {
        country: params.country,
        state: params.state,
        city: params.city,
    };
    match service.leaderboard(&scope, params.limit) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn candidates_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.candidates(&query) {
        Ok(candidates) => (StatusCode::OK, Json(candidates)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn profile_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.profile(&UserId(user_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn profile_update_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Path(user_id): Path<String>,
    Json(details): Json<ProfileDetails>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.apply_profile_update(&UserId(user_id), details) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn exam_handler<R>(
    State(service): State<Arc<RankingService<R>>>,
    Path(user_id): Path<String>,
    Json(completion): Json<ExamCompletion>,
) -> Response
where
    R: ProfileRepository + 'static,
{
    match service.record_exam_completion(&UserId(user_id), completion) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}
