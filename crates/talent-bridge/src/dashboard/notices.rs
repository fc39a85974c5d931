use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::RealtimeChange;

pub const RECENT_CHANGES_CAPACITY: usize = 5;

/// Bounded history of pushed changes, newest first.
#[derive(Debug, Clone)]
pub struct RecentChanges {
    entries: VecDeque<RealtimeChange>,
    capacity: usize,
}

impl Default for RecentChanges {
    fn default() -> Self {
        Self::with_capacity(RECENT_CHANGES_CAPACITY)
    }
}

impl RecentChanges {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, change: RealtimeChange) {
        self.entries.push_front(change);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<RealtimeChange> {
        self.entries.iter().cloned().collect()
    }
}

/// Transient notification for the latest pushed change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub message: String,
    pub change: RealtimeChange,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Last action error, shown until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}
