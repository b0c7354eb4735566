use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::answers::AnswerStore;
use super::repository::ScreeningRepository;
use super::result::SubjectProfile;
use super::service::{ScreeningService, ScreeningServiceError};
use crate::auth::{AuthError, Identity, UserDirectory, UserId};
use crate::error::RepositoryError;

/// Header carrying the caller's user id on admin endpoints.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitScreeningRequest {
    pub user: Identity,
    #[serde(default)]
    pub subject: SubjectProfile,
    pub answers: AnswerStore,
}

/// Router builder exposing the questionnaire, submission and history endpoints.
pub fn screening_router<R, U>(service: Arc<ScreeningService<R, U>>) -> Router
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/screening/questionnaire",
            get(questionnaire_handler::<R, U>),
        )
        .route("/api/v1/screenings", post(submit_handler::<R, U>))
        .route(
            "/api/v1/users/:uid/screenings",
            get(journey_handler::<R, U>),
        )
        .route("/api/v1/admin/overview", get(overview_handler::<R, U>))
        .with_state(service)
}

pub(crate) async fn questionnaire_handler<R, U>(
    State(service): State<Arc<ScreeningService<R, U>>>,
) -> Response
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    (StatusCode::OK, axum::Json(service.questionnaire())).into_response()
}

pub(crate) async fn submit_handler<R, U>(
    State(service): State<Arc<ScreeningService<R, U>>>,
    axum::Json(request): axum::Json<SubmitScreeningRequest>,
) -> Response
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    match service.submit(&request.user, request.subject, &request.answers) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn journey_handler<R, U>(
    State(service): State<Arc<ScreeningService<R, U>>>,
    Path(uid): Path<String>,
) -> Response
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    match service.journey(&UserId(uid)) {
        Ok(journey) => (StatusCode::OK, axum::Json(journey)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn overview_handler<R, U>(
    State(service): State<Arc<ScreeningService<R, U>>>,
    headers: HeaderMap,
) -> Response
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    let requester = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let Some(requester) = requester else {
        let payload = json!({
            "error": format!("missing {USER_ID_HEADER} header"),
        });
        return (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response();
    };

    match service.overview(&UserId::new(requester)) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScreeningServiceError) -> Response {
    let status = match &error {
        ScreeningServiceError::Session(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScreeningServiceError::Auth(AuthError::NotAdmin(_)) => StatusCode::FORBIDDEN,
        other => match other.repository_error() {
            Some(RepositoryError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Some(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Some(error) if error.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
