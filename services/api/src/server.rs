use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryJournalRepository, InMemoryScreeningRepository, InMemoryUserDirectory,
};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mindcheck::config::AppConfig;
use mindcheck::error::AppError;
use mindcheck::journal::JournalService;
use mindcheck::screening::ScreeningService;
use mindcheck::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryScreeningRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::with_admins(&config.access.admins));
    let screening_service = Arc::new(ScreeningService::new(
        repository,
        directory,
        config.screening,
        config.reporting,
    ));
    let journal_service = Arc::new(JournalService::new(Arc::new(
        InMemoryJournalRepository::default(),
    )));

    let app = with_api_routes(screening_service, journal_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        admins = config.access.admins.len(),
        incomplete_policy = ?config.screening.incomplete,
        "screening service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
