use tracing::debug;

use super::domain::{
    ApplicationDraft, ContactPrefill, FieldErrors, FieldName, ResumeAttachment, TextField,
};
use super::validation::validate;

/// Raised when a frozen form is edited.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("form is frozen while its draft is being submitted; {field:?} was not changed")]
    Frozen { field: FieldName },
}

/// Live draft plus the errors from the most recent validation pass.
///
/// Setters clear the edited field's error without re-running its rule; errors only
/// come back on the next full `validate`.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    draft: ApplicationDraft,
    errors: FieldErrors,
    frozen: bool,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefill(prefill: &ContactPrefill) -> Self {
        let draft = ApplicationDraft {
            full_name: prefill.full_name.clone().unwrap_or_default(),
            email: prefill.email.clone().unwrap_or_default(),
            ..ApplicationDraft::default()
        };

        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_field(&mut self, field: TextField, value: impl Into<String>) -> Result<(), FormError> {
        let name = field.field_name();
        self.ensure_editable(name)?;

        let value = value.into();
        let slot = match field {
            TextField::FullName => &mut self.draft.full_name,
            TextField::Email => &mut self.draft.email,
            TextField::Phone => &mut self.draft.phone,
            TextField::CoverLetter => &mut self.draft.cover_letter,
        };
        *slot = value;

        self.clear_error(name);
        Ok(())
    }

    pub fn set_attachment(&mut self, resume: Option<ResumeAttachment>) -> Result<(), FormError> {
        self.ensure_editable(FieldName::Resume)?;
        self.draft.resume = resume;
        self.clear_error(FieldName::Resume);
        Ok(())
    }

    pub fn set_agreement(&mut self, agreed: bool) -> Result<(), FormError> {
        self.ensure_editable(FieldName::AgreeToTerms)?;
        self.draft.agree_to_terms = agreed;
        self.clear_error(FieldName::AgreeToTerms);
        Ok(())
    }

    /// Full validation pass; replaces the current error set.
    pub fn validate(&mut self) -> &FieldErrors {
        self.errors = validate(&self.draft);
        &self.errors
    }

    /// Lock the draft and hand back the snapshot being submitted.
    pub fn freeze(&mut self) -> ApplicationDraft {
        self.frozen = true;
        self.draft.clone()
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    fn ensure_editable(&self, field: FieldName) -> Result<(), FormError> {
        if self.frozen {
            return Err(FormError::Frozen { field });
        }
        Ok(())
    }

    fn clear_error(&mut self, field: FieldName) {
        if self.errors.clear(field) {
            debug!(field = field.label(), "cleared field error on edit");
        }
    }
}
