use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{ApplicationDraft, ApplicationId, SubmissionReceipt};

/// Outbound boundary that accepts a frozen draft.
#[async_trait]
pub trait SubmissionPort: Send + Sync {
    async fn submit(&self, draft: &ApplicationDraft)
        -> Result<SubmissionReceipt, SubmissionFailure>;
}

/// Failure reported by a submission backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionFailure {
    #[error("submission rejected by backend: {0}")]
    Rejected(String),
    #[error("submission backend unavailable: {0}")]
    Unavailable(String),
}

/// Stand-in backend: waits a fixed latency and then always accepts.
#[derive(Debug)]
pub struct SimulatedSubmission {
    latency: Duration,
    sequence: AtomicU64,
}

impl SimulatedSubmission {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    fn next_application_id(&self) -> ApplicationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }
}

#[async_trait]
impl SubmissionPort for SimulatedSubmission {
    async fn submit(
        &self,
        _draft: &ApplicationDraft,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        tokio::time::sleep(self.latency).await;

        Ok(SubmissionReceipt {
            application_id: self.next_application_id(),
            submitted_at: Utc::now(),
        })
    }
}
