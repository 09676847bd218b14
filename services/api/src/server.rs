use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use seatwise::allocation::AllocationEngine;
use seatwise::booking::{BookingService, CsvBookingStore};
use seatwise::config::AppConfig;
use seatwise::error::AppError;
use seatwise::telemetry;
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
    if let Some(policy) = args.strategy.take() {
        config.allocation.policy = policy;
    }
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = data_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(CsvBookingStore::open(&config.storage.data_dir)?);
    let policy = config.allocation.policy;
    let booking_service = Arc::new(BookingService::new(store, AllocationEngine::new(policy)));

    let app = with_booking_routes(booking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        strategy = %policy,
        data_dir = %config.storage.data_dir.display(),
        "seat booking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
