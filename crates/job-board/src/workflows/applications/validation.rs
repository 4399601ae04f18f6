use std::sync::LazyLock;

use regex::Regex;

use super::domain::{ApplicationDraft, FieldErrorKind, FieldErrors, FieldName};

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email shape pattern compiles"));

/// Run every field rule against `draft`.
///
/// Rules are independent: each failing field gets exactly one entry and no rule
/// looks at another field. The cover letter is unconstrained.
pub fn validate(draft: &ApplicationDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if draft.full_name.trim().is_empty() {
        errors.insert(FieldName::FullName, FieldErrorKind::Required);
    }

    if draft.email.trim().is_empty() {
        errors.insert(FieldName::Email, FieldErrorKind::Required);
    } else if !email_has_minimal_shape(&draft.email) {
        errors.insert(FieldName::Email, FieldErrorKind::Format);
    }

    if draft.phone.trim().is_empty() {
        errors.insert(FieldName::Phone, FieldErrorKind::Required);
    }

    if draft.resume.is_none() {
        errors.insert(FieldName::Resume, FieldErrorKind::Required);
    }

    if !draft.agree_to_terms {
        errors.insert(FieldName::AgreeToTerms, FieldErrorKind::Required);
    }

    errors
}

/// Minimal `local@domain.tld` shape check; deliberately far looser than RFC 5322.
///
/// Surrounding whitespace is ignored, matching how the required check trims.
pub fn email_has_minimal_shape(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email.trim())
}
