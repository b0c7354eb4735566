use crate::infra::{parse_offset, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{FixedOffset, Offset, Utc};
use mindcheck::auth::UserDirectory;
use mindcheck::error::AppError;
use mindcheck::history::{aggregate_in, HistoryAggregate, ScreeningHistoryImporter};
use mindcheck::journal::{journal_router, JournalRepository, JournalService};
use mindcheck::screening::{screening_router, ScreeningRepository, ScreeningService};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryReportRequest {
    /// Screening export in the CSV layout accepted by the importer.
    pub(crate) csv: String,
    #[serde(default, deserialize_with = "deserialize_optional_offset")]
    pub(crate) utc_offset: Option<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryReportResponse {
    pub(crate) imported: usize,
    pub(crate) utc_offset: String,
    #[serde(flatten)]
    pub(crate) aggregate: HistoryAggregate,
}

pub(crate) fn with_api_routes<R, U, J>(
    screenings: Arc<ScreeningService<R, U>>,
    journal: Arc<JournalService<J>>,
) -> axum::Router
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
    J: JournalRepository + 'static,
{
    screening_router(screenings)
        .merge(journal_router(journal))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/history/report",
            axum::routing::post(history_report_endpoint),
        )
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

/// Chart data for an uploaded export, without touching the live store.
pub(crate) async fn history_report_endpoint(
    Json(payload): Json<HistoryReportRequest>,
) -> Result<Json<HistoryReportResponse>, AppError> {
    let HistoryReportRequest { csv, utc_offset } = payload;

    let results = ScreeningHistoryImporter::from_reader(Cursor::new(csv.into_bytes()))?;
    let offset = utc_offset.unwrap_or_else(|| Utc.fix());

    Ok(Json(HistoryReportResponse {
        imported: results.len(),
        utc_offset: offset.to_string(),
        aggregate: aggregate_in(&results, offset),
    }))
}

fn deserialize_optional_offset<'de, D>(deserializer: D) -> Result<Option<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_offset(&value).map_err(serde::de::Error::custom))
        .transpose()
}
