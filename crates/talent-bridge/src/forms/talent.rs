use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldRule, FieldSpec, FieldValue};
use super::{clean_list, non_empty, FormDefinition, FormKind, SUBMISSION_SOURCE};
use crate::domain::ReviewStatus;

/// "For talent" application as entered by the applicant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalentForm {
    pub name: String,
    pub email: String,
    pub headline: String,
    pub bio: String,
    pub industry: String,
    pub seniority: String,
    pub years_of_experience: Option<u32>,
    pub functions: Vec<String>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub achievements: Vec<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub website_url: Option<String>,
    pub consent: bool,
}

const TALENT_FIELDS: &[FieldSpec] = &[
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
        name: "headline",
        label: "Professional headline",
        rule: FieldRule::Text { min: 5, max: 120 },
    },
    FieldSpec {
        name: "bio",
        label: "Bio",
        rule: FieldRule::Text { min: 50, max: 2000 },
    },
    FieldSpec {
        name: "industry",
        label: "Industry",
        rule: FieldRule::Choice,
    },
    FieldSpec {
        name: "seniority",
        label: "Seniority",
        rule: FieldRule::Choice,
    },
    FieldSpec {
        name: "years_of_experience",
        label: "Years of experience",
        rule: FieldRule::Range { min: 0, max: 60 },
    },
    FieldSpec {
        name: "functions",
        label: "Function",
        rule: FieldRule::Selection,
    },
    FieldSpec {
        name: "skills",
        label: "Skill",
        rule: FieldRule::Selection,
    },
    FieldSpec {
        name: "languages",
        label: "Languages",
        rule: FieldRule::OptionalList,
    },
    FieldSpec {
        name: "achievements",
        label: "Achievements",
        rule: FieldRule::OptionalList,
    },
    FieldSpec {
        name: "linkedin_url",
        label: "LinkedIn URL",
        rule: FieldRule::Url,
    },
    FieldSpec {
        name: "portfolio_url",
        label: "Portfolio URL",
        rule: FieldRule::Url,
    },
    FieldSpec {
        name: "website_url",
        label: "Website URL",
        rule: FieldRule::Url,
    },
    FieldSpec {
        name: "consent",
        label: "The privacy policy",
        rule: FieldRule::Accepted,
    },
];

impl FormDefinition for TalentForm {
    const KIND: FormKind = FormKind::Talent;

    fn fields() -> &'static [FieldSpec] {
        TALENT_FIELDS
    }

    fn value_of(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "headline" => FieldValue::text(&self.headline),
            "bio" => FieldValue::text(&self.bio),
            "industry" => FieldValue::text(&self.industry),
            "seniority" => FieldValue::text(&self.seniority),
            "years_of_experience" => FieldValue::optional_number(self.years_of_experience),
            "functions" => FieldValue::List(self.functions.clone()),
            "skills" => FieldValue::List(self.skills.clone()),
            "languages" => FieldValue::List(self.languages.clone()),
            "achievements" => FieldValue::List(self.achievements.clone()),
            "linkedin_url" => FieldValue::optional_text(self.linkedin_url.as_deref()),
            "portfolio_url" => FieldValue::optional_text(self.portfolio_url.as_deref()),
            "website_url" => FieldValue::optional_text(self.website_url.as_deref()),
            "consent" => FieldValue::Flag(self.consent),
            _ => FieldValue::Missing,
        }
    }

    fn email(&self) -> &str {
        self.email.trim()
    }
}

/// Row inserted for a confirmed talent application. Every column is sent,
/// optional ones as `null` or an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTalentProfile {
    pub name: String,
    pub email: String,
    pub headline: String,
    pub bio: Option<String>,
    pub industry: String,
    pub seniority: Option<String>,
    pub years_of_experience: Option<u32>,
    pub functions: Vec<String>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub achievements: Vec<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub website_url: Option<String>,
    pub cv_path: Option<String>,
    pub consent: bool,
    pub source: &'static str,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTalentProfile {
    pub fn from_form(form: &TalentForm, cv_path: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_lowercase(),
            headline: form.headline.trim().to_string(),
            bio: non_empty(Some(form.bio.as_str())),
            industry: form.industry.trim().to_string(),
            seniority: non_empty(Some(form.seniority.as_str())),
            years_of_experience: form.years_of_experience,
            functions: clean_list(&form.functions),
            skills: clean_list(&form.skills),
            languages: clean_list(&form.languages),
            achievements: clean_list(&form.achievements),
            linkedin_url: non_empty(form.linkedin_url.as_deref()),
            portfolio_url: non_empty(form.portfolio_url.as_deref()),
            website_url: non_empty(form.website_url.as_deref()),
            cv_path,
            consent: form.consent,
            source: SUBMISSION_SOURCE,
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
