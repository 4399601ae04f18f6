use chrono::{DateTime, Utc};
use job_board::workflows::applications::{ApplicationSink, SubmittedApplication};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Application as it landed in the sink, stamped with its arrival time.
#[derive(Debug, Clone)]
pub(crate) struct ReceivedApplication {
    pub(crate) application: SubmittedApplication,
    pub(crate) received_at: DateTime<Utc>,
}

/// Public listing entry; resume bytes and cover letter stay server-side.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReceivedApplicationView {
    pub(crate) form_id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) resume_file: Option<String>,
    pub(crate) has_cover_letter: bool,
    pub(crate) received_at: DateTime<Utc>,
}

impl From<&ReceivedApplication> for ReceivedApplicationView {
    fn from(received: &ReceivedApplication) -> Self {
        let draft = &received.application.draft;
        Self {
            form_id: received.application.form_id.0.clone(),
            full_name: draft.full_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            resume_file: draft.resume.as_ref().map(|resume| resume.file_name.clone()),
            has_cover_letter: !draft.cover_letter.trim().is_empty(),
            received_at: received.received_at,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationSink {
    received: Arc<Mutex<Vec<ReceivedApplication>>>,
}

impl ApplicationSink for InMemoryApplicationSink {
    fn record(&self, application: SubmittedApplication) {
        let mut guard = self.received.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(ReceivedApplication {
            application,
            received_at: Utc::now(),
        });
    }
}

impl InMemoryApplicationSink {
    pub(crate) fn received(&self) -> Vec<ReceivedApplication> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_board::workflows::applications::{ApplicationDraft, FormId, ResumeAttachment};

    #[test]
    fn listing_view_redacts_document_contents() {
        let sink = InMemoryApplicationSink::default();
        sink.record(SubmittedApplication {
            form_id: FormId("form-000007".to_string()),
            draft: ApplicationDraft {
                full_name: " Ada Lovelace ".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
                resume: Some(ResumeAttachment::new("ada.pdf", b"notes".to_vec())),
                cover_letter: "  ".to_string(),
                agree_to_terms: true,
            },
        });

        let received = sink.received();
        assert_eq!(received.len(), 1);
        let view = ReceivedApplicationView::from(&received[0]);
        assert_eq!(view.form_id, "form-000007");
        assert_eq!(view.full_name, "Ada Lovelace");
        assert_eq!(view.resume_file.as_deref(), Some("ada.pdf"));
        assert!(!view.has_cover_letter);
    }
}
