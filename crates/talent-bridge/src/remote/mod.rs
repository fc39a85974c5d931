//! Boundary to the hosted data service.
//!
//! Everything that leaves the process goes through [`RemoteDataService`]:
//! table reads and writes, the contact-form RPC, CV storage and access-token
//! checks. The client is built once at start-up and shared as a
//! [`SharedRemote`].

pub mod feed;
pub mod http;
pub mod memory;
pub mod query;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub use feed::{
    ChangeFeed, ChangeSubscription, FeedError, WebhookPayload, WebhookSecret,
    WEBHOOK_SECRET_HEADER,
};
pub use http::RestDataService;
pub use memory::{InMemoryDataService, Operation, CONTACT_RPC};
pub use query::SelectQuery;

/// Shared handle to whichever backend the application was started with.
pub type SharedRemote = Arc<dyn RemoteDataService>;

/// Reference to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
}

/// Identity resolved from an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unable to decode remote payload: {0}")]
    Decode(String),
    #[error("record not found")]
    NotFound,
    #[error("access token rejected")]
    Unauthorized,
    #[error("remote service unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Operations the application needs from the hosted data service.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn select(&self, source: &str, query: &SelectQuery) -> Result<Vec<Value>, RemoteError>;

    /// Insert one row and return the stored representation.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError>;

    /// Patch the row with the given id and return the stored representation.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, RemoteError>;

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, RemoteError>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, RemoteError>;

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RemoteError>;

    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, RemoteError>;
}

/// Rows that decoded into the requested record, plus a count of those that
/// did not.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRows<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> DecodedRows<T> {
    /// Rows the backend returned, decoded or not.
    pub fn fetched(&self) -> usize {
        self.rows.len() + self.skipped
    }
}

/// Select rows and decode them one at a time. A row that does not fit `T`
/// is logged with its id and left out rather than failing the whole read.
pub async fn select_rows<T>(
    remote: &dyn RemoteDataService,
    source: &str,
    query: &SelectQuery,
) -> Result<DecodedRows<T>, RemoteError>
where
    T: DeserializeOwned,
{
    let raw = remote.select(source, query).await?;
    let mut decoded = DecodedRows {
        rows: Vec::with_capacity(raw.len()),
        skipped: 0,
    };
    for row in raw {
        let id = row.get("id").map(Value::to_string).unwrap_or_default();
        match serde_json::from_value(row) {
            Ok(record) => decoded.rows.push(record),
            Err(err) => {
                warn!(source, id = %id, error = %err, "skipping row that does not decode");
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}
