use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::controller::{SessionError, SessionSnapshot, SubmitAttempt};
use super::domain::{ContactPrefill, ResumeAttachment, TextField};
use super::port::SubmissionPort;
use super::registry::{ApplicationSink, FormId, FormSessionRegistry, RegistryError};
use super::view::FormView;

#[derive(Debug, Deserialize)]
pub(crate) struct FieldUpdate {
    pub(crate) value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResumeUpload {
    pub(crate) file_name: String,
    pub(crate) content_base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgreementUpdate {
    pub(crate) agreed: bool,
}

type SessionResult = Result<Result<SessionSnapshot, SessionError>, RegistryError>;

/// Router builder exposing the application form sessions over HTTP.
pub fn application_form_router<P, S>(registry: Arc<FormSessionRegistry<P, S>>) -> Router
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    Router::new()
        .route("/api/v1/applications/forms", post(open_handler::<P, S>))
        .route(
            "/api/v1/applications/forms/:form_id",
            get(view_handler::<P, S>).delete(cancel_handler::<P, S>),
        )
        .route(
            "/api/v1/applications/forms/:form_id/fields/:field",
            put(field_handler::<P, S>),
        )
        .route(
            "/api/v1/applications/forms/:form_id/resume",
            put(resume_handler::<P, S>).delete(remove_resume_handler::<P, S>),
        )
        .route(
            "/api/v1/applications/forms/:form_id/agreement",
            put(agreement_handler::<P, S>),
        )
        .route(
            "/api/v1/applications/forms/:form_id/submit",
            post(submit_handler::<P, S>),
        )
        .route(
            "/api/v1/applications/forms/:form_id/retry",
            post(retry_handler::<P, S>),
        )
        .with_state(registry)
}

pub(crate) async fn open_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    prefill: Option<axum::Json<ContactPrefill>>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let prefill = prefill.map(|axum::Json(prefill)| prefill);
    let form_id = registry.open(prefill.as_ref());

    match registry.with_session(&form_id, |controller| controller.snapshot()) {
        Ok(snapshot) => {
            let payload = json!({
                "form_id": form_id,
                "view": FormView::render(&snapshot),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn view_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let result = registry.with_session(&FormId(form_id), |controller| {
        Ok::<_, SessionError>(controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn field_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path((form_id, field)): Path<(String, String)>,
    axum::Json(update): axum::Json<FieldUpdate>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let Some(text_field) = TextField::from_label(&field) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown text field '{field}'"),
        );
    };

    let result = registry.with_session(&FormId(form_id), |controller| {
        controller
            .set_field(text_field, update.value)
            .map(|_| controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn resume_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
    axum::Json(upload): axum::Json<ResumeUpload>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let bytes = match base64::engine::general_purpose::STANDARD.decode(upload.content_base64) {
        Ok(bytes) => bytes,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("resume content is not valid base64: {err}"),
            )
        }
    };
    let resume = ResumeAttachment::new(upload.file_name, bytes);

    let result = registry.with_session(&FormId(form_id), |controller| {
        controller
            .set_attachment(Some(resume))
            .map(|_| controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn remove_resume_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let result = registry.with_session(&FormId(form_id), |controller| {
        controller
            .set_attachment(None)
            .map(|_| controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn agreement_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
    axum::Json(update): axum::Json<AgreementUpdate>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let result = registry.with_session(&FormId(form_id), |controller| {
        controller
            .set_agreement(update.agreed)
            .map(|_| controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn submit_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let result = registry.with_session(&FormId(form_id), |controller| {
        controller
            .submit()
            .map(|attempt| (attempt, controller.snapshot()))
    });

    match result {
        Ok(Ok((attempt, snapshot))) => {
            let status = match attempt {
                SubmitAttempt::Started => StatusCode::ACCEPTED,
                SubmitAttempt::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SubmitAttempt::Ignored { .. } => StatusCode::CONFLICT,
            };
            (status, axum::Json(FormView::render(&snapshot))).into_response()
        }
        Ok(Err(error)) => session_error_response(error),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn retry_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let result = registry.with_session(&FormId(form_id), |controller| {
        controller.retry().map(|_| controller.snapshot())
    });
    session_response(result)
}

pub(crate) async fn cancel_handler<P, S>(
    State(registry): State<Arc<FormSessionRegistry<P, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    match registry.close(&FormId(form_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => registry_error_response(error),
    }
}

fn session_response(result: SessionResult) -> Response {
    match result {
        Ok(Ok(snapshot)) => (StatusCode::OK, axum::Json(FormView::render(&snapshot))).into_response(),
        Ok(Err(error)) => session_error_response(error),
        Err(error) => registry_error_response(error),
    }
}

fn session_error_response(error: SessionError) -> Response {
    let status = match error {
        SessionError::NoRuntime => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::Locked { .. }
        | SessionError::RetryUnavailable { .. }
        | SessionError::TornDown
        | SessionError::Form(_) => StatusCode::CONFLICT,
    };
    error_response(status, error.to_string())
}

fn registry_error_response(error: RegistryError) -> Response {
    match error {
        RegistryError::NotFound(_) => error_response(StatusCode::NOT_FOUND, error.to_string()),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({ "error": message });
    (status, axum::Json(payload)).into_response()
}
