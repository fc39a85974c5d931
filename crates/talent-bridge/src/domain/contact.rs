use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, ContactStatus, RecordId};

/// Message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inquiry_type: String,
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}
