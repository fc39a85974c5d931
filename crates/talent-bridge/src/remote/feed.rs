use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::{ChangeKind, RealtimeChange, Table};

const DEFAULT_CAPACITY: usize = 64;

/// Header the hosted service is configured to send with every webhook.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

type HmacSha256 = Hmac<Sha256>;

/// Fan-out hub for change notifications.
///
/// Producers (the in-memory backend, the webhook endpoint) publish immutable
/// [`RealtimeChange`] values; every subscription receives its own copy.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<RealtimeChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change, returning how many subscribers will see it.
    pub fn publish(&self, change: RealtimeChange) -> usize {
        debug!(table = change.table.name(), kind = change.kind.label(), "change published");
        self.sender.send(change).unwrap_or(0)
    }

    /// Subscribe to every table.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            tables: None,
        }
    }

    /// Subscribe to a subset of tables.
    pub fn subscribe_tables(&self, tables: &[Table]) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            tables: Some(tables.iter().copied().collect()),
        }
    }
}

pub struct ChangeSubscription {
    receiver: broadcast::Receiver<RealtimeChange>,
    tables: Option<HashSet<Table>>,
}

impl ChangeSubscription {
    /// Next change for the subscribed tables, or `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<RealtimeChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => {
                    if self.accepts(change.table) {
                        return Some(change);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change subscription lagged; notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn accepts(&self, table: Table) -> bool {
        self.tables
            .as_ref()
            .map_or(true, |tables| tables.contains(&table))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("unsupported event type '{0}'")]
    UnsupportedEvent(String),
}

/// Database webhook body posted by the hosted service on row changes.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
}

impl WebhookPayload {
    pub fn into_change(self) -> Result<RealtimeChange, FeedError> {
        let table =
            Table::from_name(&self.table).ok_or_else(|| FeedError::UnknownTable(self.table.clone()))?;
        let kind = ChangeKind::from_event_type(&self.event_type)
            .ok_or_else(|| FeedError::UnsupportedEvent(self.event_type.clone()))?;
        Ok(RealtimeChange {
            table,
            kind,
            received_at: Utc::now(),
        })
    }
}

/// Shared secret the webhook caller must present.
///
/// Presented values are compared through HMAC tags so the check takes the
/// same time whatever the input.
#[derive(Clone)]
pub struct WebhookSecret {
    keyed: HmacSha256,
    expected: Vec<u8>,
}

impl WebhookSecret {
    /// `None` for a blank secret.
    pub fn new(secret: &str) -> Option<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            return None;
        }
        let keyed = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        let mut mac = keyed.clone();
        mac.update(secret.as_bytes());
        Some(Self {
            keyed,
            expected: mac.finalize().into_bytes().to_vec(),
        })
    }

    pub fn matches(&self, presented: &str) -> bool {
        let mut mac = self.keyed.clone();
        mac.update(presented.trim().as_bytes());
        mac.verify_slice(&self.expected).is_ok()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret").finish_non_exhaustive()
    }
}
