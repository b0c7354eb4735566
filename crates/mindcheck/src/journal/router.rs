use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{JournalEntryId, JournalError, JournalRepository, JournalService};
use crate::auth::UserId;
use crate::error::RepositoryError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewJournalEntry {
    pub text: String,
}

pub fn journal_router<J>(service: Arc<JournalService<J>>) -> Router
where
    J: JournalRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:uid/journal",
            get(list_handler::<J>).post(add_handler::<J>),
        )
        .route(
            "/api/v1/users/:uid/journal/:entry_id",
            delete(delete_handler::<J>),
        )
        .with_state(service)
}

async fn add_handler<J>(
    State(service): State<Arc<JournalService<J>>>,
    Path(uid): Path<String>,
    axum::Json(body): axum::Json<NewJournalEntry>,
) -> Response
where
    J: JournalRepository + 'static,
{
    match service.add(&UserId(uid), body.text) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_handler<J>(
    State(service): State<Arc<JournalService<J>>>,
    Path(uid): Path<String>,
) -> Response
where
    J: JournalRepository + 'static,
{
    match service.entries(&UserId(uid)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_handler<J>(
    State(service): State<Arc<JournalService<J>>>,
    Path((uid, entry_id)): Path<(String, String)>,
) -> Response
where
    J: JournalRepository + 'static,
{
    match service.remove(&UserId(uid), &JournalEntryId(entry_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: JournalError) -> Response {
    let status = match &error {
        JournalError::EmptyEntry => StatusCode::UNPROCESSABLE_ENTITY,
        JournalError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        JournalError::Repository(RepositoryError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        JournalError::Repository(repository) if repository.is_retryable() => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        JournalError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
