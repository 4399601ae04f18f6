use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::{
    ApplicationDraft, FieldErrors, ResumeAttachment, SubmissionPhase, SubmissionReceipt,
    TextField,
};
use super::form::{FormError, FormState};
use super::port::{SubmissionFailure, SubmissionPort};

pub type CompletionHandler = Box<dyn FnOnce(ApplicationDraft) + Send + 'static>;
pub type CancelHandler = Box<dyn FnOnce() + Send + 'static>;

/// Result of pressing the submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Validation passed; the frozen draft is on its way to the backend.
    Started,
    /// Validation failed; the session is back in `Editing` with these errors.
    Rejected(FieldErrors),
    /// The submit control is disabled in the current phase.
    Ignored { phase: SubmissionPhase },
}

/// Errors raised when driving a form session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("form session is {phase}; edits are locked")]
    Locked { phase: SubmissionPhase },
    #[error("retry is only available after a failed submission (session is {phase})")]
    RetryUnavailable { phase: SubmissionPhase },
    #[error("form session has been torn down")]
    TornDown,
    #[error("submissions must be started from within a Tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Point-in-time copy of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SubmissionPhase,
    pub draft: ApplicationDraft,
    pub errors: FieldErrors,
    pub receipt: Option<SubmissionReceipt>,
    pub failure: Option<SubmissionFailure>,
    pub disposed: bool,
}

impl SessionSnapshot {
    pub fn submit_enabled(&self) -> bool {
        !self.disposed && self.phase == SubmissionPhase::Editing
    }
}

struct SessionState {
    form: FormState,
    phase: SubmissionPhase,
    history: Vec<SubmissionPhase>,
    receipt: Option<SubmissionReceipt>,
    failure: Option<SubmissionFailure>,
    on_submit: Option<CompletionHandler>,
    disposed: bool,
}

struct SessionShared {
    label: String,
    state: Mutex<SessionState>,
    phase_tx: watch::Sender<SubmissionPhase>,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, state: &mut SessionState, phase: SubmissionPhase) {
        self.record(state, phase);
        self.phase_tx.send_replace(phase);
    }

    /// Move to `phase` without notifying subscribers yet.
    fn record(&self, state: &mut SessionState, phase: SubmissionPhase) {
        let previous = state.phase;
        state.phase = phase;
        state.history.push(phase);
        info!(session = %self.label, from = %previous, to = %phase, "form session phase changed");
    }

    /// Settle an in-flight submission.
    ///
    /// `Submitted` is committed under the session lock, so a teardown that gets there
    /// first suppresses delivery. The completion handler itself runs after the lock is
    /// released and before subscribers see the new phase.
    fn complete(
        &self,
        draft: ApplicationDraft,
        outcome: Result<SubmissionReceipt, SubmissionFailure>,
    ) {
        let mut state = self.lock();
        if state.disposed {
            debug!(session = %self.label, "submission settled after teardown; dropping result");
            return;
        }

        match outcome {
            Ok(receipt) => {
                info!(
                    session = %self.label,
                    application_id = %receipt.application_id.0,
                    "application submitted"
                );
                state.receipt = Some(receipt);
                self.record(&mut state, SubmissionPhase::Submitted);
                let handler = state.on_submit.take();
                drop(state);

                if let Some(handler) = handler {
                    handler(draft);
                }
                self.phase_tx.send_replace(SubmissionPhase::Submitted);
            }
            Err(failure) => {
                warn!(session = %self.label, error = %failure, "application submission failed");
                state.failure = Some(failure);
                self.enter(&mut state, SubmissionPhase::Failed);
            }
        }
    }
}

/// Drives one application form from first keystroke to confirmation.
///
/// Edits are accepted only while `Editing`. A successful submission is terminal;
/// a failed one parks the session in `Failed` until `retry` returns it to `Editing`.
/// Dropping the controller tears it down, which cancels any in-flight submission;
/// once a teardown has run the completion handler will not be invoked.
pub struct SubmissionController<P> {
    shared: Arc<SessionShared>,
    port: Arc<P>,
    pending: Option<JoinHandle<()>>,
    on_cancel: Option<CancelHandler>,
}

impl<P> SubmissionController<P>
where
    P: SubmissionPort + 'static,
{
    pub fn new(form: FormState, port: Arc<P>) -> Self {
        Self::labelled("form", form, port)
    }

    pub fn labelled(label: impl Into<String>, form: FormState, port: Arc<P>) -> Self {
        let (phase_tx, _) = watch::channel(SubmissionPhase::Editing);
        let state = SessionState {
            form,
            phase: SubmissionPhase::Editing,
            history: vec![SubmissionPhase::Editing],
            receipt: None,
            failure: None,
            on_submit: None,
            disposed: false,
        };

        Self {
            shared: Arc::new(SessionShared {
                label: label.into(),
                state: Mutex::new(state),
                phase_tx,
            }),
            port,
            pending: None,
            on_cancel: None,
        }
    }

    /// Register the handler that receives the frozen draft once the backend accepts it.
    pub fn on_submit(self, handler: impl FnOnce(ApplicationDraft) + Send + 'static) -> Self {
        self.shared.lock().on_submit = Some(Box::new(handler));
        self
    }

    pub fn on_cancel(mut self, handler: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(handler));
        self
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    pub fn set_field(
        &mut self,
        field: TextField,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        let mut state = self.editable()?;
        state.form.set_field(field, value)?;
        debug!(session = %self.shared.label, field = field.field_name().label(), "field updated");
        Ok(())
    }

    pub fn set_attachment(&mut self, resume: Option<ResumeAttachment>) -> Result<(), SessionError> {
        let mut state = self.editable()?;
        let attached = resume.is_some();
        state.form.set_attachment(resume)?;
        debug!(session = %self.shared.label, attached, "resume updated");
        Ok(())
    }

    pub fn set_agreement(&mut self, agreed: bool) -> Result<(), SessionError> {
        let mut state = self.editable()?;
        state.form.set_agreement(agreed)?;
        debug!(session = %self.shared.label, agreed, "terms agreement updated");
        Ok(())
    }

    /// Validate the draft and, when it passes, start the backend submission.
    ///
    /// Must be called from within a Tokio runtime; the port call runs as a spawned task.
    pub fn submit(&mut self) -> Result<SubmitAttempt, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let mut state = self.shared.lock();
        if state.disposed {
            return Err(SessionError::TornDown);
        }
        if state.phase != SubmissionPhase::Editing {
            debug!(session = %self.shared.label, phase = %state.phase, "submit ignored");
            return Ok(SubmitAttempt::Ignored { phase: state.phase });
        }

        self.shared.enter(&mut state, SubmissionPhase::Validating);
        let errors = state.form.validate().clone();
        if !errors.is_empty() {
            info!(
                session = %self.shared.label,
                failing_fields = errors.len(),
                "submission blocked by validation"
            );
            self.shared.enter(&mut state, SubmissionPhase::Editing);
            return Ok(SubmitAttempt::Rejected(errors));
        }

        let draft = state.form.freeze();
        self.shared.enter(&mut state, SubmissionPhase::Submitting);
        drop(state);

        let shared = Arc::clone(&self.shared);
        let port = Arc::clone(&self.port);
        self.pending = Some(runtime.spawn(async move {
            let outcome = port.submit(&draft).await;
            shared.complete(draft, outcome);
        }));

        Ok(SubmitAttempt::Started)
    }

    /// Return a failed session to `Editing` so the applicant can try again.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        let mut state = self.shared.lock();
        if state.disposed {
            return Err(SessionError::TornDown);
        }
        if state.phase != SubmissionPhase::Failed {
            return Err(SessionError::RetryUnavailable { phase: state.phase });
        }

        state.failure = None;
        state.form.thaw();
        self.shared.enter(&mut state, SubmissionPhase::Editing);
        drop(state);

        self.pending = None;
        Ok(())
    }

    /// The applicant abandoned the form.
    pub fn cancel(mut self) {
        self.teardown();
        info!(session = %self.shared.label, "application form cancelled");
        if let Some(handler) = self.on_cancel.take() {
            handler();
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.shared.lock().phase
    }

    pub fn errors(&self) -> FieldErrors {
        self.shared.lock().form.errors().clone()
    }

    pub fn draft(&self) -> ApplicationDraft {
        self.shared.lock().form.draft().clone()
    }

    pub fn receipt(&self) -> Option<SubmissionReceipt> {
        self.shared.lock().receipt.clone()
    }

    pub fn failure(&self) -> Option<SubmissionFailure> {
        self.shared.lock().failure.clone()
    }

    /// Every phase entered so far, starting with `Editing`.
    pub fn history(&self) -> Vec<SubmissionPhase> {
        self.shared.lock().history.clone()
    }

    pub fn submit_enabled(&self) -> bool {
        self.snapshot().submit_enabled()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        SessionSnapshot {
            phase: state.phase,
            draft: state.form.draft().clone(),
            errors: state.form.errors().clone(),
            receipt: state.receipt.clone(),
            failure: state.failure.clone(),
            disposed: state.disposed,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionPhase> {
        self.shared.phase_tx.subscribe()
    }

    fn editable(&self) -> Result<MutexGuard<'_, SessionState>, SessionError> {
        let state = self.shared.lock();
        if state.disposed {
            return Err(SessionError::TornDown);
        }
        if !state.phase.accepts_edits() {
            return Err(SessionError::Locked { phase: state.phase });
        }
        Ok(state)
    }
}

impl<P> SubmissionController<P> {
    /// Release the session: abort any in-flight submission and drop the completion handler.
    pub fn teardown(&mut self) {
        {
            let mut state = self.shared.lock();
            if !state.disposed {
                state.disposed = true;
                state.on_submit = None;
                debug!(session = %self.shared.label, phase = %state.phase, "form session torn down");
            }
        }

        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl<P> Drop for SubmissionController<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
