//! Public submission forms: field rules, the review step, and the single
//! upstream write each confirmed form turns into.

pub mod attachment;
pub mod contact;
pub mod preview;
pub mod service;
pub mod sponsor;
pub mod talent;
pub mod validation;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use attachment::{Attachment, ATTACHMENT_FIELD, MAX_ATTACHMENT_BYTES};
pub use contact::{ContactForm, ContactRpcArgs};
pub use preview::{ReviewField, ReviewSummary, SubmissionReview};
pub use service::{AttachmentOutcome, SubmissionError, SubmissionReceipt, SubmissionService};
pub use sponsor::{NewSponsorProfile, SponsorForm};
pub use talent::{NewTalentProfile, TalentForm};
pub use validation::{FieldRule, FieldSpec, FieldValue, ValidationErrors};

/// Value written to the `source` column of every public submission.
pub const SUBMISSION_SOURCE: &str = "website";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Talent,
    Sponsor,
    Contact,
}

impl FormKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FormKind::Talent => "talent",
            FormKind::Sponsor => "sponsor",
            FormKind::Contact => "contact",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            FormKind::Talent => TalentForm::fields(),
            FormKind::Sponsor => SponsorForm::fields(),
            FormKind::Contact => ContactForm::fields(),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "talent" | "for-talent" => Ok(FormKind::Talent),
            "sponsor" | "sponsors" | "for-sponsors" => Ok(FormKind::Sponsor),
            "contact" => Ok(FormKind::Contact),
            other => Err(format!("unknown form '{other}'")),
        }
    }
}

/// Common surface of the public forms.
pub trait FormDefinition: Clone + Send + Sync + 'static {
    const KIND: FormKind;

    fn fields() -> &'static [FieldSpec];

    fn value_of(&self, field: &str) -> FieldValue;

    fn email(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate_fields(Self::fields(), |name| self.value_of(name))
    }
}

/// Check one field in isolation, as a client does when the field loses focus.
pub fn validate_field(kind: FormKind, field: &str, value: &Value) -> Result<(), ValidationErrors> {
    let spec = kind
        .fields()
        .iter()
        .find(|spec| spec.name == field)
        .ok_or_else(|| ValidationErrors::single(field, format!("Unknown field for the {kind} form")))?;

    spec.rule
        .check(spec.label, &FieldValue::from_json(value))
        .map_err(|message| ValidationErrors::single(field, message))
}

/// Trimmed text, or `None` when nothing meaningful was entered.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|value| value.trim()) {
        if !value.is_empty() && !cleaned.iter().any(|existing| existing == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}
