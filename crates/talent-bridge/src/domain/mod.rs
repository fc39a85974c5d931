//! Records exchanged with the hosted data service.
//!
//! Storage is authoritative on the remote side; these types only describe the
//! shape of the rows this service reads and writes.

pub mod change;
pub mod contact;
pub mod sponsor;
pub mod status;
pub mod talent;

use serde::{Deserialize, Deserializer, Serialize};

pub use change::{ChangeKind, RealtimeChange, Table};
pub use contact::ContactSubmission;
pub use sponsor::SponsorProfile;
pub use status::{ContactStatus, ReviewStatus, UnknownStatus};
pub use talent::TalentProfile;

/// Identifier assigned by the remote store to every row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rows written by older clients carry `null` for list columns.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
