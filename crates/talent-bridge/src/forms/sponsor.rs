use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldRule, FieldSpec, FieldValue};
use super::{clean_list, non_empty, FormDefinition, FormKind, SUBMISSION_SOURCE};
use crate::domain::ReviewStatus;

/// "For sponsors" sign-up as entered on the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorForm {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub role_title: Option<String>,
    pub website: Option<String>,
    pub sponsor_type: String,
    pub focus_areas: Vec<String>,
    pub message: Option<String>,
    pub pledge_accepted: bool,
    pub consent: bool,
}

const SPONSOR_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Full name",
        rule: FieldRule::Text { min: 2, max: 100 },
    },
    FieldSpec {
        name: "email",
        label: "Email",
        rule: FieldRule::Email,
    },
    FieldSpec {
        name: "organization",
        label: "Organization",
        rule: FieldRule::Text { min: 2, max: 150 },
    },
    FieldSpec {
        name: "role_title",
        label: "Role",
        rule: FieldRule::OptionalText { max: 100 },
    },
    FieldSpec {
        name: "website",
        label: "Website",
        rule: FieldRule::Url,
    },
    FieldSpec {
        name: "sponsor_type",
        label: "Sponsor type",
        rule: FieldRule::Choice,
    },
    FieldSpec {
        name: "focus_areas",
        label: "Focus area",
        rule: FieldRule::Selection,
    },
    FieldSpec {
        name: "message",
        label: "Message",
        rule: FieldRule::OptionalText { max: 2000 },
    },
    FieldSpec {
        name: "pledge_accepted",
        label: "The sponsor pledge",
        rule: FieldRule::Accepted,
    },
    FieldSpec {
        name: "consent",
        label: "The privacy policy",
        rule: FieldRule::Accepted,
    },
];

impl FormDefinition for SponsorForm {
    const KIND: FormKind = FormKind::Sponsor;

    fn fields() -> &'static [FieldSpec] {
        SPONSOR_FIELDS
    }

    fn value_of(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "organization" => FieldValue::text(&self.organization),
            "role_title" => FieldValue::optional_text(self.role_title.as_deref()),
            "website" => FieldValue::optional_text(self.website.as_deref()),
            "sponsor_type" => FieldValue::text(&self.sponsor_type),
            "focus_areas" => FieldValue::List(self.focus_areas.clone()),
            "message" => FieldValue::optional_text(self.message.as_deref()),
            "pledge_accepted" => FieldValue::Flag(self.pledge_accepted),
            "consent" => FieldValue::Flag(self.consent),
            _ => FieldValue::Missing,
        }
    }

    fn email(&self) -> &str {
        self.email.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSponsorProfile {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub role_title: Option<String>,
    pub website: Option<String>,
    pub sponsor_type: String,
    pub focus_areas: Vec<String>,
    pub message: Option<String>,
    pub pledge_accepted: bool,
    pub consent: bool,
    pub source: &'static str,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewSponsorProfile {
    pub fn from_form(form: &SponsorForm, now: DateTime<Utc>) -> Self {
        Self {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_lowercase(),
            organization: form.organization.trim().to_string(),
            role_title: non_empty(form.role_title.as_deref()),
            website: non_empty(form.website.as_deref()),
            sponsor_type: form.sponsor_type.trim().to_string(),
            focus_areas: clean_list(&form.focus_areas),
            message: non_empty(form.message.as_deref()),
            pledge_accepted: form.pledge_accepted,
            consent: form.consent,
            source: SUBMISSION_SOURCE,
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
