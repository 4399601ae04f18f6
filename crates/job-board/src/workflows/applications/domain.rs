use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extensions advertised next to the resume upload control. Advisory only.
pub const ACCEPTED_RESUME_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Hint rendered beside the upload control.
pub fn resume_hint() -> String {
    let listed = ACCEPTED_RESUME_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Accepted formats: {listed}")
}

/// Identifier wrapper for applications accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Uploaded resume: the file name plus a shared handle on the raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeAttachment {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl ResumeAttachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the file name carries one of the advertised extensions.
    ///
    /// Validation never consults this; it only feeds the presentation hint.
    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .map(|ext| ACCEPTED_RESUME_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

// Bytes are left out so logs never carry document contents.
impl fmt::Debug for ResumeAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeAttachment")
            .field("file_name", &self.file_name)
            .field("size", &self.size())
            .finish()
    }
}

/// The in-progress set of applicant answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub resume: Option<ResumeAttachment>,
    pub cover_letter: String,
    pub agree_to_terms: bool,
}

/// Every field the application form exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    FullName,
    Email,
    Phone,
    Resume,
    CoverLetter,
    AgreeToTerms,
}

impl FieldName {
    pub const fn label(self) -> &'static str {
        match self {
            FieldName::FullName => "fullName",
            FieldName::Email => "email",
            FieldName::Phone => "phone",
            FieldName::Resume => "resume",
            FieldName::CoverLetter => "coverLetter",
            FieldName::AgreeToTerms => "agreeToTerms",
        }
    }

    const fn display_name(self) -> &'static str {
        match self {
            FieldName::FullName => "Full name",
            FieldName::Email => "Email",
            FieldName::Phone => "Phone number",
            FieldName::Resume => "Resume",
            FieldName::CoverLetter => "Cover letter",
            FieldName::AgreeToTerms => "Terms agreement",
        }
    }
}

/// String-valued fields accepted by `set_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    FullName,
    Email,
    Phone,
    CoverLetter,
}

impl TextField {
    pub const fn field_name(self) -> FieldName {
        match self {
            TextField::FullName => FieldName::FullName,
            TextField::Email => FieldName::Email,
            TextField::Phone => FieldName::Phone,
            TextField::CoverLetter => FieldName::CoverLetter,
        }
    }

    /// Parse the wire label (`fullName`, `email`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "fullName" => Some(TextField::FullName),
            "email" => Some(TextField::Email),
            "phone" => Some(TextField::Phone),
            "coverLetter" => Some(TextField::CoverLetter),
            _ => None,
        }
    }
}

/// Reason a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Format,
}

impl FieldErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            FieldErrorKind::Required => "required",
            FieldErrorKind::Format => "format",
        }
    }

    pub fn message(self, field: FieldName) -> String {
        match (field, self) {
            (FieldName::AgreeToTerms, FieldErrorKind::Required) => {
                "You must agree to the terms and conditions".to_string()
            }
            (FieldName::Resume, FieldErrorKind::Required) => "Please upload your resume".to_string(),
            (FieldName::Email, FieldErrorKind::Format) => {
                "Please enter a valid email address".to_string()
            }
            (field, FieldErrorKind::Required) => format!("{} is required", field.display_name()),
            (field, FieldErrorKind::Format) => format!("{} is not valid", field.display_name()),
        }
    }
}

/// Per-field validation failures; only failing fields have an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldName, FieldErrorKind>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldName, kind: FieldErrorKind) {
        self.0.insert(field, kind);
    }

    pub fn get(&self, field: FieldName) -> Option<FieldErrorKind> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    /// Drop the entry for `field`, reporting whether one existed.
    pub fn clear(&mut self, field: FieldName) -> bool {
        self.0.remove(&field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, FieldErrorKind)> + '_ {
        self.0.iter().map(|(field, kind)| (*field, *kind))
    }
}

impl FromIterator<(FieldName, FieldErrorKind)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (FieldName, FieldErrorKind)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lifecycle of a single form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Editing,
    Validating,
    Submitting,
    Submitted,
    Failed,
}

impl SubmissionPhase {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionPhase::Editing => "editing",
            SubmissionPhase::Validating => "validating",
            SubmissionPhase::Submitting => "submitting",
            SubmissionPhase::Submitted => "submitted",
            SubmissionPhase::Failed => "failed",
        }
    }

    pub const fn accepts_edits(self) -> bool {
        matches!(self, SubmissionPhase::Editing)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, SubmissionPhase::Submitted)
    }
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only contact details lifted from the signed-in session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPrefill {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Acknowledgement returned once the backend accepts an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub submitted_at: DateTime<Utc>,
}
