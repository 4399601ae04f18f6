//! Job application intake: field validation, form sessions, and the submission lifecycle.
//!
//! A session moves `Editing -> Validating -> Submitting -> Submitted`. Validation failures
//! return it to `Editing` with per-field errors; a backend failure parks it in `Failed`
//! until the applicant retries.

pub mod controller;
pub mod domain;
pub mod form;
pub mod port;
pub mod registry;
pub mod router;
pub mod validation;
pub mod view;

#[cfg(test)]
mod tests;

pub use controller::{SessionError, SessionSnapshot, SubmissionController, SubmitAttempt};
pub use domain::{
    resume_hint, ApplicationDraft, ApplicationId, ContactPrefill, FieldErrorKind, FieldErrors,
    FieldName, ResumeAttachment, SubmissionPhase, SubmissionReceipt, TextField,
    ACCEPTED_RESUME_EXTENSIONS,
};
pub use form::{FormError, FormState};
pub use port::{SimulatedSubmission, SubmissionFailure, SubmissionPort};
pub use registry::{
    ApplicationSink, FormId, FormSessionRegistry, RegistryError, SubmittedApplication,
};
pub use router::application_form_router;
pub use validation::{email_has_minimal_shape, validate};
pub use view::{ConfirmationView, FieldErrorView, FormView};
