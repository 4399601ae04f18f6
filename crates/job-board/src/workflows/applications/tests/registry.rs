use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::common::*;
use crate::workflows::applications::controller::SubmitAttempt;
use crate::workflows::applications::domain::{
    ApplicationDraft, ApplicationId, SubmissionPhase, SubmissionReceipt,
};
use crate::workflows::applications::port::{SimulatedSubmission, SubmissionFailure, SubmissionPort};
use crate::workflows::applications::registry::{
    ApplicationSink, FormId, FormSessionRegistry, RegistryError, SubmittedApplication,
    COMPLETED_RETENTION_MINUTES,
};
use crate::workflows::applications::FormView;

type LookbackRegistry = FormSessionRegistry<SimulatedSubmission, LookbackSink>;

/// Sink that asks the registry about the session it is being handed.
#[derive(Default)]
struct LookbackSink {
    registry: OnceLock<Weak<LookbackRegistry>>,
    observed: Mutex<Vec<(FormId, Option<SubmissionPhase>)>>,
}

impl LookbackSink {
    fn attach(&self, registry: &Arc<LookbackRegistry>) {
        let _ = self.registry.set(Arc::downgrade(registry));
    }

    fn observed(&self) -> Vec<(FormId, Option<SubmissionPhase>)> {
        self.observed.lock().expect("observed mutex poisoned").clone()
    }
}

impl ApplicationSink for LookbackSink {
    fn record(&self, application: SubmittedApplication) {
        let phase = self
            .registry
            .get()
            .and_then(Weak::upgrade)
            .and_then(|registry| {
                registry
                    .with_session(&application.form_id, |controller| controller.phase())
                    .ok()
            });
        self.observed
            .lock()
            .expect("observed mutex poisoned")
            .push((application.form_id, phase));
    }
}

/// Port whose receipts are stamped well before the retention cutoff.
struct BackdatedPort;

#[async_trait]
impl SubmissionPort for BackdatedPort {
    async fn submit(
        &self,
        _draft: &ApplicationDraft,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(SubmissionReceipt {
            application_id: ApplicationId("backdated".to_string()),
            submitted_at: Utc::now()
                - chrono::Duration::minutes(COMPLETED_RETENTION_MINUTES + 5),
        })
    }
}

fn submit_valid<P, S>(registry: &FormSessionRegistry<P, S>, form_id: &FormId)
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    let attempt = registry
        .with_session(form_id, |controller| {
            fill_valid(controller);
            controller.submit()
        })
        .expect("session exists");
    assert_eq!(attempt, Ok(SubmitAttempt::Started));
}

#[tokio::test(start_paused = true)]
async fn sink_may_read_back_through_registry_during_delivery() {
    let sink = Arc::new(LookbackSink::default());
    let registry = Arc::new(FormSessionRegistry::new(simulated_port(), sink.clone()));
    sink.attach(&registry);

    let form_id = registry.open(None);
    let mut phases = registry
        .with_session(&form_id, |controller| {
            fill_valid(controller);
            assert_eq!(controller.submit(), Ok(SubmitAttempt::Started));
            controller.subscribe()
        })
        .expect("session exists");

    tokio::time::timeout(LATENCY * 2, phases.wait_for(|phase| phase.is_terminal()))
        .await
        .expect("delivery does not stall")
        .expect("phase published");

    assert_eq!(
        sink.observed(),
        vec![(form_id, Some(SubmissionPhase::Submitted))]
    );
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn completed_session_is_released_after_confirmation_is_read() {
    let (registry, sink) = build_registry();
    let form_ids: Vec<_> = (0..3).map(|_| registry.open(None)).collect();
    for form_id in &form_ids {
        submit_valid(&*registry, form_id);
    }

    tokio::time::sleep(LATENCY + Duration::from_millis(100)).await;
    assert_eq!(sink.records().len(), 3);
    assert_eq!(registry.len(), 3);

    for (read, form_id) in form_ids.iter().enumerate() {
        let view = registry
            .with_session(form_id, |controller| FormView::render(&controller.snapshot()))
            .expect("confirmation readable once");
        assert!(view.confirmation.is_some());
        assert_eq!(registry.len(), 2 - read);
    }

    assert!(registry.is_empty());
    assert_eq!(
        registry.with_session(&form_ids[0], |_| ()),
        Err(RegistryError::NotFound(form_ids[0].clone()))
    );
}

#[tokio::test(start_paused = true)]
async fn sessions_in_progress_are_kept_after_reads() {
    let (registry, _) = build_registry();
    let form_id = registry.open(None);
    submit_valid(&*registry, &form_id);

    let phase = registry
        .with_session(&form_id, |controller| controller.phase())
        .expect("session exists");
    assert_eq!(phase, SubmissionPhase::Submitting);
    assert_eq!(registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn open_sweeps_stale_completed_sessions() {
    let registry = FormSessionRegistry::new(
        Arc::new(BackdatedPort),
        Arc::new(MemorySink::default()),
    );
    let stale = registry.open(None);
    submit_valid(&registry, &stale);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.len(), 1);

    let fresh = registry.open(None);
    assert_eq!(registry.len(), 1);
    assert!(registry.with_session(&stale, |_| ()).is_err());
    assert!(registry.with_session(&fresh, |_| ()).is_ok());
}

#[tokio::test(start_paused = true)]
async fn open_keeps_recently_completed_sessions() {
    let (registry, _) = build_registry();
    let first = registry.open(None);
    submit_valid(&*registry, &first);
    tokio::time::sleep(LATENCY + Duration::from_millis(100)).await;

    registry.open(None);
    assert_eq!(registry.len(), 2);
}
