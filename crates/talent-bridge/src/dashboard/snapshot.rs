use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ContactSubmission, SponsorProfile, TalentProfile};

/// Last successfully read copy of each collection, newest rows first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub talent: Vec<TalentProfile>,
    pub sponsors: Vec<SponsorProfile>,
    pub contacts: Vec<ContactSubmission>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    pub fn find_talent(&self, id: &str) -> Option<&TalentProfile> {
        self.talent.iter().find(|row| row.id.as_str() == id)
    }

    pub fn find_sponsor(&self, id: &str) -> Option<&SponsorProfile> {
        self.sponsors.iter().find(|row| row.id.as_str() == id)
    }

    pub fn find_contact(&self, id: &str) -> Option<&ContactSubmission> {
        self.contacts.iter().find(|row| row.id.as_str() == id)
    }
}
