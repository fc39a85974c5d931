use serde::Serialize;

use super::attachment::{Attachment, ATTACHMENT_FIELD};
use super::validation::ValidationErrors;
use super::{FormDefinition, FormKind};

/// A validated form waiting for the applicant's confirmation.
///
/// Only [`SubmissionService`](super::SubmissionService) consumes a review, so
/// nothing is written upstream until the applicant has seen the summary.
/// Dropping the review cancels the submission.
#[derive(Debug, Clone)]
pub struct SubmissionReview<F> {
    form: F,
    attachment: Option<Attachment>,
    draft_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub kind: FormKind,
    pub email: String,
    pub fields: Vec<ReviewField>,
    pub attachment: Option<String>,
}

impl<F: FormDefinition> SubmissionReview<F> {
    /// Validate the form and attachment; the caller's form is left untouched.
    pub fn prepare(form: &F, attachment: Option<Attachment>) -> Result<Self, ValidationErrors> {
        let mut errors = form.validate().err().unwrap_or_default();
        if let Some(attachment) = &attachment {
            if let Err(message) = attachment.validate() {
                errors.add(ATTACHMENT_FIELD, message);
            }
        }
        errors.into_result()?;

        Ok(Self {
            form: form.clone(),
            attachment,
            draft_id: None,
        })
    }

    /// Remember the draft to discard once the submission lands.
    pub fn with_draft(mut self, draft_id: Option<String>) -> Self {
        self.draft_id = draft_id;
        self
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.as_deref()
    }

    pub fn summary(&self) -> ReviewSummary {
        let fields = F::fields()
            .iter()
            .map(|spec| ReviewField {
                name: spec.name,
                label: spec.label,
                value: self.form.value_of(spec.name).display(),
            })
            .collect();

        ReviewSummary {
            kind: F::KIND,
            email: self.form.email().to_string(),
            fields,
            attachment: self
                .attachment
                .as_ref()
                .map(|attachment| attachment.file_name.clone()),
        }
    }

    pub(crate) fn into_parts(self) -> (F, Option<Attachment>, Option<String>) {
        (self.form, self.attachment, self.draft_id)
    }
}
