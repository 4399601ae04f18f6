use super::common::*;
use crate::workflows::applications::domain::{
    ApplicationDraft, ContactPrefill, FieldErrorKind, FieldName, TextField,
};
use crate::workflows::applications::form::{FormError, FormState};

#[test]
fn new_form_starts_empty_without_errors() {
    let form = FormState::new();
    assert_eq!(form.draft(), &ApplicationDraft::default());
    assert!(form.errors().is_empty());
    assert!(!form.is_frozen());
}

#[test]
fn editing_clears_error_even_when_value_still_fails() {
    let mut form = FormState::new();
    form.validate();
    assert!(form.errors().contains(FieldName::Email));

    form.set_field(TextField::Email, "still wrong")
        .expect("form editable");
    assert!(!form.errors().contains(FieldName::Email));
    assert!(form.errors().contains(FieldName::FullName));

    assert_eq!(
        form.validate().get(FieldName::Email),
        Some(FieldErrorKind::Format)
    );
}

#[test]
fn attachment_and_agreement_clear_their_errors() {
    let mut form = FormState::new();
    form.validate();

    form.set_attachment(None).expect("form editable");
    assert!(!form.errors().contains(FieldName::Resume));

    form.set_agreement(false).expect("form editable");
    assert!(!form.errors().contains(FieldName::AgreeToTerms));

    assert!(form.errors().contains(FieldName::Phone));
}

#[test]
fn editing_one_field_leaves_other_errors_alone() {
    let mut form = FormState::new();
    let before = form.validate().len();

    form.set_field(TextField::CoverLetter, "hello")
        .expect("form editable");
    assert_eq!(form.errors().len(), before);
}

#[test]
fn frozen_form_rejects_every_setter() {
    let mut form = FormState::new();
    form.set_field(TextField::FullName, "Ada").expect("editable");
    let snapshot = form.freeze();

    assert_eq!(
        form.set_field(TextField::FullName, "Grace"),
        Err(FormError::Frozen {
            field: FieldName::FullName
        })
    );
    assert!(form.set_attachment(Some(resume())).is_err());
    assert!(form.set_agreement(true).is_err());
    assert_eq!(form.draft(), &snapshot);

    form.thaw();
    form.set_field(TextField::FullName, "Grace").expect("editable again");
    assert_eq!(form.draft().full_name, "Grace");
}

#[test]
fn prefill_seeds_contact_details_only() {
    let prefill = ContactPrefill {
        full_name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
    };
    let mut form = FormState::with_prefill(&prefill);

    assert_eq!(form.draft().full_name, "Ada Lovelace");
    assert_eq!(form.draft().email, "ada@example.com");
    assert!(form.draft().phone.is_empty());

    let errors = form.validate();
    assert!(!errors.contains(FieldName::FullName));
    assert!(!errors.contains(FieldName::Email));
    assert!(errors.contains(FieldName::Phone));
}
