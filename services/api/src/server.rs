use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationSink};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::telemetry;
use job_board::workflows::applications::{FormSessionRegistry, SimulatedSubmission};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(latency_ms) = args.latency_ms.take() {
        config.submission.simulated_latency = Duration::from_millis(latency_ms);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sink = InMemoryApplicationSink::default();
    let port = Arc::new(SimulatedSubmission::new(config.submission.simulated_latency));
    let registry = Arc::new(FormSessionRegistry::new(port, Arc::new(sink.clone())));

    let app = with_application_routes(registry)
        .layer(Extension(app_state))
        .layer(Extension(sink))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        latency_ms = config.submission.latency_ms(),
        "application intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
