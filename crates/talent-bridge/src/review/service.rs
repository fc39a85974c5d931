use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::transitions::{contact_transition, review_transition, ContactAction, ReviewAction, TransitionError};
use crate::dashboard::DashboardAggregator;
use crate::domain::Table;
use crate::remote::{RemoteError, SharedRemote};

/// Lifetime of the signed link handed to an admin opening a CV.
pub const CV_LINK_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("no {table} record with id {id}")]
    UnknownRecord { table: &'static str, id: String },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("status update failed: {0}")]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    pub table: Table,
    pub id: String,
    pub from: &'static str,
    pub to: &'static str,
}

/// Applies admin actions as single remote updates.
///
/// The current status is read from the dashboard snapshot and the transition
/// is checked before anything is sent. The snapshot itself is never edited
/// here; it picks up the new status on the next refresh.
pub struct ReviewService {
    remote: SharedRemote,
    dashboard: Arc<DashboardAggregator>,
    cv_bucket: String,
}

impl ReviewService {
    pub fn new(
        remote: SharedRemote,
        dashboard: Arc<DashboardAggregator>,
        cv_bucket: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            dashboard,
            cv_bucket: cv_bucket.into(),
        }
    }

    pub async fn review_talent(
        &self,
        id: &str,
        action: ReviewAction,
    ) -> Result<ReviewOutcome, ReviewError> {
        let table = Table::TalentProfiles;
        let current = self
            .dashboard
            .talent_status(id)
            .ok_or_else(|| unknown(table, id))?;
        let next = review_transition(current, action)?;
        self.apply(table, id, current.label(), next.label()).await
    }

    pub async fn review_sponsor(
        &self,
        id: &str,
        action: ReviewAction,
    ) -> Result<ReviewOutcome, ReviewError> {
        let table = Table::SponsorProfiles;
        let current = self
            .dashboard
            .sponsor_status(id)
            .ok_or_else(|| unknown(table, id))?;
        let next = review_transition(current, action)?;
        self.apply(table, id, current.label(), next.label()).await
    }

    pub async fn triage_contact(
        &self,
        id: &str,
        action: ContactAction,
    ) -> Result<ReviewOutcome, ReviewError> {
        let table = Table::ContactSubmissions;
        let current = self
            .dashboard
            .contact_status(id)
            .ok_or_else(|| unknown(table, id))?;
        let next = contact_transition(current, action)?;
        self.apply(table, id, current.label(), next.label()).await
    }

    /// Short-lived download link for a talent profile's CV, if it has one.
    pub async fn cv_link(&self, id: &str) -> Result<Option<String>, ReviewError> {
        let profile = self
            .dashboard
            .talent_by_id(id)
            .ok_or_else(|| unknown(Table::TalentProfiles, id))?;
        let Some(path) = profile.cv_path else {
            return Ok(None);
        };
        let url = self
            .remote
            .signed_url(&self.cv_bucket, &path, CV_LINK_TTL)
            .await?;
        Ok(Some(url))
    }

    async fn apply(
        &self,
        table: Table,
        id: &str,
        from: &'static str,
        to: &'static str,
    ) -> Result<ReviewOutcome, ReviewError> {
        let now = Utc::now();
        let patch = json!({
            "status": to,
            "updated_at": now,
            "reviewed_at": now,
        });

        if let Err(err) = self.remote.update(table.name(), id, patch).await {
            warn!(table = table.name(), id, to, error = %err, "status update failed");
            self.dashboard
                .set_banner(format!("Failed to update {} {id}: {err}", table.label()));
            return Err(err.into());
        }

        info!(table = table.name(), id, from, to, "status updated");
        Ok(ReviewOutcome {
            table,
            id: id.to_string(),
            from,
            to,
        })
    }
}

fn unknown(table: Table, id: &str) -> ReviewError {
    ReviewError::UnknownRecord {
        table: table.label(),
        id: id.to_string(),
    }
}
