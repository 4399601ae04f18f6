use crate::infra::{AppState, InMemoryApplicationSink, ReceivedApplicationView};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use job_board::workflows::applications::{
    application_form_router, ApplicationSink, FormSessionRegistry, SubmissionPort,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<P, S>(
    registry: Arc<FormSessionRegistry<P, S>>,
) -> axum::Router
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    application_form_router(registry)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/applications/received",
            axum::routing::get(received_applications_endpoint),
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

pub(crate) async fn received_applications_endpoint(
    Extension(sink): Extension<InMemoryApplicationSink>,
) -> Json<Vec<ReceivedApplicationView>> {
    let received = sink.received();
    Json(received.iter().map(ReceivedApplicationView::from).collect())
}
