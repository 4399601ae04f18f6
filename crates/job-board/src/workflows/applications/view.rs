use chrono::{DateTime, Utc};
use serde::Serialize;

use super::controller::SessionSnapshot;
use super::domain::{resume_hint, ApplicationId, FieldErrorKind, FieldName, SubmissionPhase};

/// Serializable presentation model for one form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub phase: SubmissionPhase,
    pub fields: FieldValuesView,
    pub errors: Vec<FieldErrorView>,
    pub submit_enabled: bool,
    pub submitting: bool,
    pub resume_hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValuesView {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: String,
    pub agree_to_terms: bool,
    pub resume: Option<ResumeView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeView {
    pub file_name: String,
    pub size: usize,
    pub content_type: String,
    /// False when the file name lacks an advertised extension. Display only.
    pub matches_hint: bool,
}

/// A single inline error line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrorView {
    pub field: FieldName,
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Static confirmation shown once the backend accepted the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationView {
    pub application_id: ApplicationId,
    pub submitted_at: DateTime<Utc>,
    pub applicant_name: String,
    pub contact_email: String,
    pub message: String,
}

impl FormView {
    pub fn render(snapshot: &SessionSnapshot) -> Self {
        let draft = &snapshot.draft;

        let confirmation = match (snapshot.phase, &snapshot.receipt) {
            (SubmissionPhase::Submitted, Some(receipt)) => Some(ConfirmationView {
                application_id: receipt.application_id.clone(),
                submitted_at: receipt.submitted_at,
                applicant_name: draft.full_name.trim().to_string(),
                contact_email: draft.email.trim().to_string(),
                message: format!(
                    "Thanks {}, your application has been received. We'll be in touch at {}.",
                    draft.full_name.trim(),
                    draft.email.trim()
                ),
            }),
            _ => None,
        };

        let failure = match snapshot.phase {
            SubmissionPhase::Failed => snapshot.failure.as_ref().map(ToString::to_string),
            _ => None,
        };

        Self {
            phase: snapshot.phase,
            fields: FieldValuesView {
                full_name: draft.full_name.clone(),
                email: draft.email.clone(),
                phone: draft.phone.clone(),
                cover_letter: draft.cover_letter.clone(),
                agree_to_terms: draft.agree_to_terms,
                resume: draft.resume.as_ref().map(|resume| ResumeView {
                    file_name: resume.file_name.clone(),
                    size: resume.size(),
                    content_type: resume.content_type(),
                    matches_hint: resume.has_accepted_extension(),
                }),
            },
            errors: snapshot
                .errors
                .iter()
                .map(|(field, kind)| FieldErrorView {
                    field,
                    kind,
                    message: kind.message(field),
                })
                .collect(),
            submit_enabled: snapshot.submit_enabled(),
            submitting: snapshot.phase == SubmissionPhase::Submitting,
            resume_hint: resume_hint(),
            confirmation,
            failure,
        }
    }

    pub fn error_for(&self, field: FieldName) -> Option<&FieldErrorView> {
        self.errors.iter().find(|error| error.field == field)
    }
}
