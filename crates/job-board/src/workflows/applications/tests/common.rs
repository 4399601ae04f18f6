use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::Utc;
use serde_json::Value;

use crate::workflows::applications::domain::{
    ApplicationDraft, ApplicationId, ResumeAttachment, SubmissionReceipt, TextField,
};
use crate::workflows::applications::port::{
    SimulatedSubmission, SubmissionFailure, SubmissionPort,
};
use crate::workflows::applications::registry::{
    ApplicationSink, FormSessionRegistry, SubmittedApplication,
};
use crate::workflows::applications::{application_form_router, FormState, SubmissionController};

pub(super) const LATENCY: Duration = Duration::from_millis(2000);

pub(super) fn resume() -> ResumeAttachment {
    ResumeAttachment::new("ada_lovelace.pdf", b"%PDF-1.7 analytical engine notes".to_vec())
}

pub(super) fn valid_draft() -> ApplicationDraft {
    ApplicationDraft {
        full_name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-0100".to_string(),
        resume: Some(resume()),
        cover_letter: String::new(),
        agree_to_terms: true,
    }
}

pub(super) fn simulated_port() -> Arc<SimulatedSubmission> {
    Arc::new(SimulatedSubmission::new(LATENCY))
}

/// Populate every required field with a passing value.
pub(super) fn fill_valid<P>(controller: &mut SubmissionController<P>)
where
    P: SubmissionPort + 'static,
{
    let draft = valid_draft();
    controller
        .set_field(TextField::FullName, draft.full_name)
        .expect("editable");
    controller
        .set_field(TextField::Email, draft.email)
        .expect("editable");
    controller
        .set_field(TextField::Phone, draft.phone)
        .expect("editable");
    controller.set_attachment(draft.resume).expect("editable");
    controller.set_agreement(true).expect("editable");
}

/// Controller wired to a counter-backed completion handler.
pub(super) fn counted_controller<P>(
    port: Arc<P>,
) -> (
    SubmissionController<P>,
    Arc<AtomicUsize>,
    Arc<Mutex<Vec<ApplicationDraft>>>,
)
where
    P: SubmissionPort + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let handler_calls = calls.clone();
    let handler_delivered = delivered.clone();

    let controller = SubmissionController::new(FormState::new(), port).on_submit(move |draft| {
        handler_calls.fetch_add(1, Ordering::SeqCst);
        handler_delivered
            .lock()
            .expect("delivered mutex poisoned")
            .push(draft);
    });

    (controller, calls, delivered)
}

/// Port that fails the first `failures` calls and then accepts.
pub(super) struct FlakyPort {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyPort {
    pub(super) fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionPort for FlakyPort {
    async fn submit(
        &self,
        _draft: &ApplicationDraft,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(SubmissionFailure::Unavailable(
                "upstream timed out".to_string(),
            ));
        }
        Ok(SubmissionReceipt {
            application_id: ApplicationId(format!("flaky-{call}")),
            submitted_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    records: Mutex<Vec<SubmittedApplication>>,
}

impl MemorySink {
    pub(super) fn records(&self) -> Vec<SubmittedApplication> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }
}

impl ApplicationSink for MemorySink {
    fn record(&self, application: SubmittedApplication) {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(application);
    }
}

pub(super) type SimulatedRegistry = FormSessionRegistry<SimulatedSubmission, MemorySink>;

pub(super) fn build_registry() -> (Arc<SimulatedRegistry>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let registry = Arc::new(FormSessionRegistry::new(simulated_port(), sink.clone()));
    (registry, sink)
}

pub(super) fn router_with_registry(registry: Arc<SimulatedRegistry>) -> axum::Router {
    application_form_router(registry)
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("body serializes")))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
