use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::analytics::DashboardStats;
use super::filter::{filter_rows, CollectionFilter};
use super::notices::{Banner, RecentChanges, Toast};
use super::snapshot::DashboardSnapshot;
use crate::config::DashboardConfig;
use crate::domain::{
    ContactStatus, ContactSubmission, RealtimeChange, ReviewStatus, SponsorProfile, Table,
    TalentProfile,
};
use crate::remote::{select_rows, DecodedRows, RemoteError, SelectQuery, SharedRemote};

/// What asked for a refresh. Every trigger takes the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Startup,
    Poll,
    Push,
    Manual,
}

impl RefreshTrigger {
    pub const fn label(self) -> &'static str {
        match self {
            RefreshTrigger::Startup => "startup",
            RefreshTrigger::Poll => "poll",
            RefreshTrigger::Push => "push",
            RefreshTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionFailure {
    pub table: Table,
    pub message: String,
}

/// Rows left out of a collection because they did not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRows {
    pub table: Table,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub trigger: RefreshTrigger,
    pub updated: Vec<Table>,
    pub failures: Vec<CollectionFailure>,
    pub skipped: Vec<SkippedRows>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Another refresh was already running; nothing was read.
    Skipped,
    Completed(RefreshReport),
}

/// Everything the dashboard header needs in one read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub recent_changes: Vec<RealtimeChange>,
    pub toast: Option<Toast>,
    pub banner: Option<Banner>,
    pub auto_refresh: bool,
    pub refreshing: bool,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct DashboardState {
    snapshot: DashboardSnapshot,
    recent: RecentChanges,
    toast: Option<Toast>,
    banner: Option<Banner>,
}

/// Clears the in-flight flag when the refresh that set it ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct DashboardAggregator {
    remote: SharedRemote,
    state: RwLock<DashboardState>,
    refreshing: AtomicBool,
    auto_refresh: AtomicBool,
    toast_ttl: Duration,
}

impl DashboardAggregator {
    pub fn new(remote: SharedRemote, config: &DashboardConfig) -> Self {
        Self::with_settings(remote, config.toast_ttl, config.auto_refresh)
    }

    pub fn with_settings(remote: SharedRemote, toast_ttl: Duration, auto_refresh: bool) -> Self {
        Self {
            remote,
            state: RwLock::new(DashboardState::default()),
            refreshing: AtomicBool::new(false),
            auto_refresh: AtomicBool::new(auto_refresh),
            toast_ttl,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-read all three collections unless a refresh is already running.
    ///
    /// Reads run concurrently. Each collection that reads successfully
    /// replaces its list; a failed read keeps the previous list and is
    /// reported, and a banner is raised only when every read failed.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.refreshing) else {
            debug!(trigger = trigger.label(), "refresh already in flight; skipped");
            return RefreshOutcome::Skipped;
        };
        debug!(trigger = trigger.label(), "dashboard refresh started");

        let (talent, sponsors, contacts) = tokio::join!(
            self.read_collection::<TalentProfile>(Table::TalentProfiles),
            self.read_collection::<SponsorProfile>(Table::SponsorProfiles),
            self.read_collection::<ContactSubmission>(Table::ContactSubmissions),
        );

        let finished_at = Utc::now();
        let mut updated = Vec::with_capacity(Table::ALL.len());
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        {
            let mut state = self.write_state();
            match talent {
                Ok(decoded) => {
                    note_skipped(&mut skipped, Table::TalentProfiles, &decoded);
                    state.snapshot.talent = decoded.rows;
                    updated.push(Table::TalentProfiles);
                }
                Err(err) => failures.push(failed_read(Table::TalentProfiles, &err)),
            }
            match sponsors {
                Ok(decoded) => {
                    note_skipped(&mut skipped, Table::SponsorProfiles, &decoded);
                    state.snapshot.sponsors = decoded.rows;
                    updated.push(Table::SponsorProfiles);
                }
                Err(err) => failures.push(failed_read(Table::SponsorProfiles, &err)),
            }
            match contacts {
                Ok(decoded) => {
                    note_skipped(&mut skipped, Table::ContactSubmissions, &decoded);
                    state.snapshot.contacts = decoded.rows;
                    updated.push(Table::ContactSubmissions);
                }
                Err(err) => failures.push(failed_read(Table::ContactSubmissions, &err)),
            }

            if updated.is_empty() {
                let message = failures
                    .first()
                    .map(|failure| failure.message.clone())
                    .unwrap_or_default();
                state.banner = Some(Banner {
                    message: format!("Unable to refresh dashboard data: {message}"),
                    raised_at: finished_at,
                });
            } else {
                state.snapshot.last_refreshed_at = Some(finished_at);
            }
        }

        info!(
            trigger = trigger.label(),
            updated = updated.len(),
            failed = failures.len(),
            skipped = skipped.len(),
            "dashboard refresh finished"
        );
        RefreshOutcome::Completed(RefreshReport {
            trigger,
            updated,
            failures,
            skipped,
            finished_at,
        })
    }

    async fn read_collection<T: DeserializeOwned>(
        &self,
        table: Table,
    ) -> Result<DecodedRows<T>, RemoteError> {
        let query = SelectQuery::new().order_by("created_at", false);
        select_rows(self.remote.as_ref(), table.read_source(), &query).await
    }

    /// Log a pushed change and raise its toast. No toast is raised when the
    /// display time cannot be represented.
    pub fn record_change(&self, change: RealtimeChange) -> Option<Toast> {
        let toast = chrono::Duration::from_std(self.toast_ttl)
            .ok()
            .and_then(|ttl| change.received_at.checked_add_signed(ttl))
            .map(|expires_at| Toast {
                message: change.describe(),
                expires_at,
                change: change.clone(),
            });
        if toast.is_none() {
            warn!(ttl = ?self.toast_ttl, "toast lifetime out of range; change logged without a toast");
        }

        let mut state = self.write_state();
        state.recent.push(change);
        if toast.is_some() {
            state.toast = toast.clone();
        }
        toast
    }

    pub fn recent_changes(&self) -> Vec<RealtimeChange> {
        self.read_state().recent.to_vec()
    }

    /// The latest toast, until its display time has passed.
    pub fn active_toast(&self, now: DateTime<Utc>) -> Option<Toast> {
        self.read_state()
            .toast
            .as_ref()
            .filter(|toast| toast.is_active(now))
            .cloned()
    }

    pub fn set_banner(&self, message: impl Into<String>) {
        self.write_state().banner = Some(Banner {
            message: message.into(),
            raised_at: Utc::now(),
        });
    }

    pub fn dismiss_banner(&self) -> Option<Banner> {
        self.write_state().banner.take()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.read_state().banner.clone()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh.load(Ordering::Acquire)
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        self.auto_refresh.store(enabled, Ordering::Release);
        info!(enabled, "dashboard auto-refresh toggled");
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.read_state().snapshot.clone()
    }

    pub fn talent(&self, filter: &CollectionFilter<ReviewStatus>) -> Vec<TalentProfile> {
        filter_rows(&self.read_state().snapshot.talent, filter)
    }

    pub fn sponsors(&self, filter: &CollectionFilter<ReviewStatus>) -> Vec<SponsorProfile> {
        filter_rows(&self.read_state().snapshot.sponsors, filter)
    }

    pub fn contacts(&self, filter: &CollectionFilter<ContactStatus>) -> Vec<ContactSubmission> {
        filter_rows(&self.read_state().snapshot.contacts, filter)
    }

    pub fn talent_by_id(&self, id: &str) -> Option<TalentProfile> {
        self.read_state().snapshot.find_talent(id).cloned()
    }

    pub fn talent_status(&self, id: &str) -> Option<ReviewStatus> {
        self.read_state()
            .snapshot
            .find_talent(id)
            .map(|row| row.status)
    }

    pub fn sponsor_status(&self, id: &str) -> Option<ReviewStatus> {
        self.read_state()
            .snapshot
            .find_sponsor(id)
            .map(|row| row.status)
    }

    pub fn contact_status(&self, id: &str) -> Option<ContactStatus> {
        self.read_state()
            .snapshot
            .find_contact(id)
            .map(|row| row.status)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        DashboardStats::compute(&self.read_state().snapshot, now)
    }

    pub fn overview(&self, now: DateTime<Utc>) -> DashboardOverview {
        let state = self.read_state();
        DashboardOverview {
            stats: DashboardStats::compute(&state.snapshot, now),
            recent_changes: state.recent.to_vec(),
            toast: state.toast.as_ref().filter(|toast| toast.is_active(now)).cloned(),
            banner: state.banner.clone(),
            auto_refresh: self.auto_refresh(),
            refreshing: self.is_refreshing(),
            last_refreshed_at: state.snapshot.last_refreshed_at,
        }
    }
}

fn note_skipped<T>(skipped: &mut Vec<SkippedRows>, table: Table, decoded: &DecodedRows<T>) {
    if decoded.skipped > 0 {
        warn!(table = table.name(), skipped = decoded.skipped, "rows left out of the dashboard");
        skipped.push(SkippedRows {
            table,
            count: decoded.skipped,
        });
    }
}

fn failed_read(table: Table, err: &RemoteError) -> CollectionFailure {
    warn!(table = table.name(), error = %err, "dashboard read failed");
    CollectionFailure {
        table,
        message: err.to_string(),
    }
}
