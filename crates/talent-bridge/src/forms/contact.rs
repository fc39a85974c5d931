use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldRule, FieldSpec, FieldValue};
use super::{non_empty, FormDefinition, FormKind, SUBMISSION_SOURCE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub inquiry_type: String,
    pub organization: Option<String>,
    pub message: String,
}

const CONTACT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Name",
        rule: FieldRule::Text { min: 2, max: 100 },
    },
    FieldSpec {
        name: "email",
        label: "Email",
        rule: FieldRule::Email,
    },
    FieldSpec {
        name: "inquiry_type",
        label: "Inquiry type",
        rule: FieldRule::Choice,
    },
    FieldSpec {
        name: "organization",
        label: "Organization",
        rule: FieldRule::OptionalText { max: 150 },
    },
    FieldSpec {
        name: "message",
        label: "Message",
        rule: FieldRule::Text { min: 10, max: 5000 },
    },
];

impl FormDefinition for ContactForm {
    const KIND: FormKind = FormKind::Contact;

    fn fields() -> &'static [FieldSpec] {
        CONTACT_FIELDS
    }

    fn value_of(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "inquiry_type" => FieldValue::text(&self.inquiry_type),
            "organization" => FieldValue::optional_text(self.organization.as_deref()),
            "message" => FieldValue::text(&self.message),
            _ => FieldValue::Missing,
        }
    }

    fn email(&self) -> &str {
        self.email.trim()
    }
}

/// Arguments of the server-side contact submission function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRpcArgs {
    pub name: String,
    pub email: String,
    pub inquiry_type: String,
    pub organization: Option<String>,
    pub message: String,
    pub source: &'static str,
    pub submitted_at: DateTime<Utc>,
}

impl ContactRpcArgs {
    pub fn from_form(form: &ContactForm, now: DateTime<Utc>) -> Self {
        Self {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_lowercase(),
            inquiry_type: form.inquiry_type.trim().to_string(),
            organization: non_empty(form.organization.as_deref()),
            message: form.message.trim().to_string(),
            source: SUBMISSION_SOURCE,
            submitted_at: now,
        }
    }
}
