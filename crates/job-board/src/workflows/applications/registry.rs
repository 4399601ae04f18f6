use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::controller::SubmissionController;
use super::domain::{ApplicationDraft, ContactPrefill};
use super::form::FormState;
use super::port::SubmissionPort;

/// How long an unread `Submitted` session is kept before `open` sweeps it.
pub const COMPLETED_RETENTION_MINUTES: i64 = 15;

/// Identifier for an open form session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormId(pub String);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draft delivered by a session's completion handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedApplication {
    pub form_id: FormId,
    pub draft: ApplicationDraft,
}

/// Destination for completed applications (e.g. the hosted data client).
pub trait ApplicationSink: Send + Sync {
    fn record(&self, application: SubmittedApplication);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("form session {0} not found")]
    NotFound(FormId),
}

/// In-memory table of live form sessions, one controller per form id.
pub struct FormSessionRegistry<P, S> {
    port: Arc<P>,
    sink: Arc<S>,
    sessions: Mutex<HashMap<FormId, SubmissionController<P>>>,
    sequence: AtomicU64,
}

impl<P, S> FormSessionRegistry<P, S>
where
    P: SubmissionPort + 'static,
    S: ApplicationSink + 'static,
{
    pub fn new(port: Arc<P>, sink: Arc<S>) -> Self {
        Self {
            port,
            sink,
            sessions: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(1),
        }
    }

    /// Open a fresh session, seeding it with read-only contact details when given.
    pub fn open(&self, prefill: Option<&ContactPrefill>) -> FormId {
        let form_id = self.next_form_id();
        let form = prefill.map(FormState::with_prefill).unwrap_or_default();

        let sink = Arc::clone(&self.sink);
        let delivered_id = form_id.clone();
        let controller =
            SubmissionController::labelled(form_id.0.clone(), form, Arc::clone(&self.port))
                .on_submit(move |draft| {
                    sink.record(SubmittedApplication {
                        form_id: delivered_id,
                        draft,
                    })
                });

        let mut sessions = self.lock();
        sweep_completed(&mut *sessions);
        sessions.insert(form_id.clone(), controller);
        drop(sessions);
        info!(form_id = %form_id, "application form opened");
        form_id
    }

    /// Run `f` against the session's controller.
    ///
    /// A session found in `Submitted` is released once `f` returns, so the
    /// confirmation is served to the first reader only.
    pub fn with_session<T>(
        &self,
        form_id: &FormId,
        f: impl FnOnce(&mut SubmissionController<P>) -> T,
    ) -> Result<T, RegistryError> {
        let mut sessions = self.lock();
        let controller = sessions
            .get_mut(form_id)
            .ok_or_else(|| RegistryError::NotFound(form_id.clone()))?;
        let result = f(controller);

        if controller.phase().is_terminal() {
            sessions.remove(form_id);
            info!(form_id = %form_id, "completed form session released");
        }
        Ok(result)
    }

    /// Abandon a session: it is cancelled, torn down, and forgotten.
    pub fn close(&self, form_id: &FormId) -> Result<(), RegistryError> {
        let controller = self
            .lock()
            .remove(form_id)
            .ok_or_else(|| RegistryError::NotFound(form_id.clone()))?;
        controller.cancel();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FormId, SubmissionController<P>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_form_id(&self) -> FormId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        FormId(format!("form-{id:06}"))
    }
}

fn sweep_completed<P>(sessions: &mut HashMap<FormId, SubmissionController<P>>)
where
    P: SubmissionPort + 'static,
{
    let cutoff = Utc::now() - Duration::minutes(COMPLETED_RETENTION_MINUTES);
    let before = sessions.len();
    sessions.retain(|_, controller| {
        controller
            .receipt()
            .map_or(true, |receipt| receipt.submitted_at > cutoff)
    });

    let swept = before - sessions.len();
    if swept > 0 {
        debug!(swept, "released unread completed form sessions");
    }
}
