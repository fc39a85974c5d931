use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, RecordId, ReviewStatus};

/// Sponsor (organization or individual backer) profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorProfile {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization: String,
    pub role_title: Option<String>,
    pub website: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sponsor_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub focus_areas: Vec<String>,
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pledge_accepted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub consent: bool,
    pub source: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
