use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, RecordId, ReviewStatus};

/// Talent profile row as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentProfile {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headline: String,
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub industry: String,
    pub seniority: Option<String>,
    pub years_of_experience: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    pub cv_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub consent: bool,
    pub source: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
