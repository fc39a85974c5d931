use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::attachment::Attachment;
use super::contact::{ContactForm, ContactRpcArgs};
use super::preview::SubmissionReview;
use super::sponsor::{NewSponsorProfile, SponsorForm};
use super::talent::{NewTalentProfile, TalentForm};
use super::validation::ValidationErrors;
use super::{FormDefinition, FormKind};
use crate::domain::Table;
use crate::drafts::DraftStore;
use crate::remote::{RemoteError, SharedRemote, CONTACT_RPC};

/// What happened to the CV that accompanied a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttachmentOutcome {
    None,
    Stored { path: String },
    /// Upload failed; the profile was saved without it.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub kind: FormKind,
    pub id: Option<String>,
    pub email: String,
    pub attachment: AttachmentOutcome,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("submission could not be saved: {0}")]
    Remote(#[from] RemoteError),
    #[error("submission could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Turns confirmed reviews into exactly one upstream write each.
#[derive(Clone)]
pub struct SubmissionService {
    remote: SharedRemote,
    cv_bucket: String,
    drafts: Option<Arc<DraftStore>>,
}

impl SubmissionService {
    pub fn new(remote: SharedRemote, cv_bucket: impl Into<String>) -> Self {
        Self {
            remote,
            cv_bucket: cv_bucket.into(),
            drafts: None,
        }
    }

    pub fn with_drafts(mut self, drafts: Arc<DraftStore>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    pub fn prepare_talent(
        &self,
        form: &TalentForm,
        attachment: Option<Attachment>,
    ) -> Result<SubmissionReview<TalentForm>, ValidationErrors> {
        SubmissionReview::prepare(form, attachment)
    }

    pub fn prepare_sponsor(
        &self,
        form: &SponsorForm,
    ) -> Result<SubmissionReview<SponsorForm>, ValidationErrors> {
        SubmissionReview::prepare(form, None)
    }

    pub fn prepare_contact(
        &self,
        form: &ContactForm,
    ) -> Result<SubmissionReview<ContactForm>, ValidationErrors> {
        SubmissionReview::prepare(form, None)
    }

    /// Store the CV if one was attached, then insert the profile.
    ///
    /// A failed upload is logged and the profile is still saved without a
    /// `cv_path`; only the insert itself can fail the submission.
    pub async fn confirm_talent(
        &self,
        review: SubmissionReview<TalentForm>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let (form, attachment, draft_id) = review.into_parts();
        let now = Utc::now();

        let outcome = match attachment {
            None => AttachmentOutcome::None,
            Some(attachment) => self.store_attachment(&form, attachment, now).await,
        };
        let cv_path = match &outcome {
            AttachmentOutcome::Stored { path } => Some(path.clone()),
            _ => None,
        };

        let row = serde_json::to_value(NewTalentProfile::from_form(&form, cv_path, now))?;
        let stored = self
            .remote
            .insert(Table::TalentProfiles.name(), row)
            .await?;
        self.discard_draft(FormKind::Talent, draft_id.as_deref())
            .await;

        let id = stored_id(&stored);
        info!(form = "talent", id = id.as_deref().unwrap_or("-"), "talent profile submitted");
        Ok(SubmissionReceipt {
            kind: FormKind::Talent,
            id,
            email: form.email().to_string(),
            attachment: outcome,
            message: "Thank you! Your profile has been submitted for review.".to_string(),
        })
    }

    pub async fn confirm_sponsor(
        &self,
        review: SubmissionReview<SponsorForm>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let (form, _, draft_id) = review.into_parts();
        let row = serde_json::to_value(NewSponsorProfile::from_form(&form, Utc::now()))?;
        let stored = self
            .remote
            .insert(Table::SponsorProfiles.name(), row)
            .await?;
        self.discard_draft(FormKind::Sponsor, draft_id.as_deref())
            .await;

        let id = stored_id(&stored);
        info!(form = "sponsor", id = id.as_deref().unwrap_or("-"), "sponsor profile submitted");
        Ok(SubmissionReceipt {
            kind: FormKind::Sponsor,
            id,
            email: form.email().to_string(),
            attachment: AttachmentOutcome::None,
            message: "Thank you for your interest in sponsoring talent. We'll be in touch soon."
                .to_string(),
        })
    }

    /// Contact messages go through the server-side function rather than a
    /// direct insert.
    pub async fn confirm_contact(
        &self,
        review: SubmissionReview<ContactForm>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let (form, _, draft_id) = review.into_parts();
        let args = serde_json::to_value(ContactRpcArgs::from_form(&form, Utc::now()))?;
        let result = self.remote.rpc(CONTACT_RPC, args).await?;
        self.discard_draft(FormKind::Contact, draft_id.as_deref())
            .await;

        info!(form = "contact", "contact message submitted");
        Ok(SubmissionReceipt {
            kind: FormKind::Contact,
            id: stored_id(&result),
            email: form.email().to_string(),
            attachment: AttachmentOutcome::None,
            message: "Thanks for reaching out. We'll get back to you shortly.".to_string(),
        })
    }

    async fn store_attachment(
        &self,
        form: &TalentForm,
        attachment: Attachment,
        now: chrono::DateTime<Utc>,
    ) -> AttachmentOutcome {
        let path = attachment.storage_path(form.email(), now);
        let content_type = attachment
            .resolved_content_type()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        match self
            .remote
            .upload(&self.cv_bucket, &path, attachment.bytes, &content_type)
            .await
        {
            Ok(stored) => AttachmentOutcome::Stored { path: stored.path },
            Err(err) => {
                warn!(bucket = %self.cv_bucket, error = %err, "cv upload failed; saving profile without it");
                AttachmentOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn discard_draft(&self, kind: FormKind, draft_id: Option<&str>) {
        let (Some(drafts), Some(draft_id)) = (&self.drafts, draft_id) else {
            return;
        };
        if let Err(err) = drafts.clear(kind, draft_id).await {
            warn!(form = kind.as_str(), draft = draft_id, error = %err, "draft could not be cleared");
        }
    }
}

fn stored_id(value: &serde_json::Value) -> Option<String> {
    match value.get("id") {
        Some(serde_json::Value::String(id)) => Some(id.clone()),
        Some(serde_json::Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}
