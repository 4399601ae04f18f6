use crate::infra::{InMemoryApplicationSink, ReceivedApplicationView};
use clap::Args;
use job_board::error::AppError;
use job_board::workflows::applications::{
    resume_hint, ContactPrefill, FormSessionRegistry, FormView, ResumeAttachment,
    SimulatedSubmission, SubmissionPhase, SubmitAttempt, TextField,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated backend latency in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub(crate) latency_ms: u64,
    /// Press submit once with a malformed email before fixing it.
    #[arg(long)]
    pub(crate) invalid_first: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        latency_ms,
        invalid_first,
    } = args;

    println!("Job application intake demo");
    println!("- Simulated backend latency: {latency_ms} ms");
    println!("- Resume hint: {}", resume_hint());

    let sink = InMemoryApplicationSink::default();
    let registry = FormSessionRegistry::new(
        Arc::new(SimulatedSubmission::new(Duration::from_millis(latency_ms))),
        Arc::new(sink.clone()),
    );

    let prefill = ContactPrefill {
        full_name: Some("Ada Lovelace".to_string()),
        email: Some(if invalid_first {
            "ada at example dot com".to_string()
        } else {
            "ada@example.com".to_string()
        }),
    };
    let form_id = registry.open(Some(&prefill));
    println!("\nOpened {form_id} with contact details from the signed-in session");

    registry.with_session(&form_id, |controller| -> Result<(), AppError> {
        controller.set_field(TextField::Phone, "+44 20 7946 0018")?;
        controller.set_field(
            TextField::CoverLetter,
            "I'd like to bring analytical engines to your team.",
        )?;
        controller.set_attachment(Some(ResumeAttachment::new(
            "ada_lovelace.pdf",
            b"%PDF-1.7 notes on the analytical engine".to_vec(),
        )))?;
        controller.set_agreement(true)?;
        Ok(())
    })??;

    let mut attempt = registry.with_session(&form_id, |controller| controller.submit())??;
    if let SubmitAttempt::Rejected(errors) = &attempt {
        println!("\nSubmit blocked by validation:");
        let view = registry.with_session(&form_id, |controller| {
            FormView::render(&controller.snapshot())
        })?;
        for error in &view.errors {
            println!("  - {}: {}", error.field.label(), error.message);
        }
        println!("  ({} field(s) to fix)", errors.len());

        attempt = registry.with_session(&form_id, |controller| {
            controller.set_field(TextField::Email, "ada@example.com")?;
            controller.submit()
        })??;
        println!("Corrected the email and pressed submit again");
    }

    match attempt {
        SubmitAttempt::Started => println!("\nSubmitting... (submit control disabled)"),
        other => {
            println!("\nSubmission did not start: {other:?}");
            return Ok(());
        }
    }

    let mut phases = registry.with_session(&form_id, |controller| controller.subscribe())?;
    let settled = phases
        .wait_for(|phase| matches!(phase, SubmissionPhase::Submitted | SubmissionPhase::Failed))
        .await
        .map(|phase| *phase)
        .unwrap_or(SubmissionPhase::Failed);

    let view = registry.with_session(&form_id, |controller| {
        FormView::render(&controller.snapshot())
    })?;
    println!("- Final phase: {settled}");
    if let Some(confirmation) = &view.confirmation {
        println!(
            "- Application {} received at {}",
            confirmation.application_id.0,
            confirmation.submitted_at.to_rfc3339()
        );
        println!("  {}", confirmation.message);
    }
    if let Some(failure) = &view.failure {
        println!("- Submission failed: {failure}");
    }

    println!("\nApplications delivered to the sink (documents redacted):");
    for received in sink.received() {
        let listing = ReceivedApplicationView::from(&received);
        println!(
            "  - {} | {} <{}> | resume: {} | cover letter: {}",
            listing.form_id,
            listing.full_name,
            listing.email,
            listing.resume_file.as_deref().unwrap_or("none"),
            if listing.has_cover_letter { "yes" } else { "no" }
        );
    }

    Ok(())
}
