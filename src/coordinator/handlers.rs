use super::protocol::*;
use super::service::{Coordinator, JobIntake};
use super::types::{JobRequest, PullSummary};
use crate::error::CoordinatorError;
use crate::roster::types::WorkerHandle;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(coordinator: Arc<Coordinator>, intake: JobIntake) -> Router {
    Router::new()
        .route(ENDPOINT_RECOMMEND, post(handle_recommend))
        .route(ENDPOINT_WORKERS, get(handle_list_workers))
        .route(ENDPOINT_FRAGMENT_RUN, post(handle_fragment_run))
        .layer(Extension(coordinator))
        .layer(Extension(intake))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn handle_recommend(
    Extension(intake): Extension<JobIntake>,
    Json(req): Json<RecommendRequest>,
) -> Result<(StatusCode, Json<RecommendResponse>), ApiError> {
    tracing::info!("Recommendation request for {} favorites", req.movie_ids.len());

    let request = JobRequest {
        favorites: req.movie_ids,
        limit: req.limit,
    };

    match intake.submit(request).await {
        Ok(recommendation) => Ok((
            StatusCode::CREATED,
            Json(RecommendResponse {
                movie_ids: recommendation.items,
                job_id: recommendation.job_id.to_string(),
                contributors: recommendation.contributors,
                dispatched: recommendation.dispatched,
            }),
        )),
        Err(e) => {
            tracing::error!("Recommendation failed: {}", e);
            Err(api_error(e))
        }
    }
}

pub async fn handle_list_workers(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Json<Vec<WorkerHandle>> {
    Json(coordinator.roster().snapshot())
}

pub async fn handle_fragment_run(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Result<Json<PullSummary>, ApiError> {
    coordinator
        .run_fragments()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!("Fragment run rejected: {}", e);
            api_error(e)
        })
}

fn api_error(error: CoordinatorError) -> ApiError {
    let status = match &error {
        CoordinatorError::EmptyRoster
        | CoordinatorError::NoResponses { .. }
        | CoordinatorError::IntakeFull
        | CoordinatorError::IntakeClosed => StatusCode::SERVICE_UNAVAILABLE,
        CoordinatorError::RunInProgress => StatusCode::CONFLICT,
        CoordinatorError::NothingToFragment => StatusCode::UNPROCESSABLE_ENTITY,
        CoordinatorError::Payload(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}
