use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::snapshot::DashboardSnapshot;
use crate::domain::{ContactStatus, ReviewStatus};

const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    fn tally(statuses: impl Iterator<Item = ReviewStatus>) -> Self {
        statuses.fold(Self::default(), |mut counts, status| {
            counts.total += 1;
            match status {
                ReviewStatus::Pending => counts.pending += 1,
                ReviewStatus::Approved => counts.approved += 1,
                ReviewStatus::Rejected => counts.rejected += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactCounts {
    pub total: usize,
    pub new: usize,
    pub read: usize,
    pub replied: usize,
    pub archived: usize,
}

impl ContactCounts {
    fn tally(statuses: impl Iterator<Item = ContactStatus>) -> Self {
        statuses.fold(Self::default(), |mut counts, status| {
            counts.total += 1;
            match status {
                ContactStatus::New => counts.new += 1,
                ContactStatus::Read => counts.read += 1,
                ContactStatus::Replied => counts.replied += 1,
                ContactStatus::Archived => counts.archived += 1,
            }
            counts
        })
    }
}

/// Headline numbers shown above the dashboard tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub talent: StatusCounts,
    pub sponsors: StatusCounts,
    pub contacts: ContactCounts,
    /// Rows of any collection created in the last seven days.
    pub submissions_last_7_days: usize,
    /// Approved share of decided talent and sponsor profiles, in percent.
    pub approval_rate: Option<f64>,
}

impl DashboardStats {
    pub fn compute(snapshot: &DashboardSnapshot, now: DateTime<Utc>) -> Self {
        let talent = StatusCounts::tally(snapshot.talent.iter().map(|row| row.status));
        let sponsors = StatusCounts::tally(snapshot.sponsors.iter().map(|row| row.status));
        let contacts = ContactCounts::tally(snapshot.contacts.iter().map(|row| row.status));

        let since = now - Duration::days(RECENT_WINDOW_DAYS);
        let submissions_last_7_days = snapshot
            .talent
            .iter()
            .map(|row| row.created_at)
            .chain(snapshot.sponsors.iter().map(|row| row.created_at))
            .chain(snapshot.contacts.iter().map(|row| row.created_at))
            .filter(|created_at| *created_at >= since)
            .count();

        let approved = talent.approved + sponsors.approved;
        let decided = approved + talent.rejected + sponsors.rejected;
        let approval_rate = if decided == 0 {
            None
        } else {
            let rate = approved as f64 / decided as f64 * 100.0;
            Some((rate * 10.0).round() / 10.0)
        };

        Self {
            talent,
            sponsors,
            contacts,
            submissions_last_7_days,
            approval_rate,
        }
    }
}
