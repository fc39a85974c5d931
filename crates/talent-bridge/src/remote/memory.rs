use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use super::feed::ChangeFeed;
use super::query::SelectQuery;
use super::{AuthUser, RemoteDataService, RemoteError, StoredObject};
use crate::domain::{ChangeKind, RealtimeChange, Table};

/// Server-side function that records a contact-form message.
pub const CONTACT_RPC: &str = "submit_contact_form";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Rpc,
    Upload,
    SignedUrl,
    Authenticate,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<String, (String, Vec<u8>)>,
    users: HashMap<String, AuthUser>,
    failures: HashSet<(Operation, String)>,
    calls: HashMap<Operation, usize>,
}

/// Process-local stand-in for the hosted data service.
///
/// Used when no remote endpoint is configured and throughout the tests. Every
/// write publishes a change on the attached [`ChangeFeed`], mirroring the
/// hosted service's database webhooks.
#[derive(Debug)]
pub struct InMemoryDataService {
    state: Mutex<MemoryState>,
    feed: Option<ChangeFeed>,
    reads_paused: watch::Sender<bool>,
}

impl Default for InMemoryDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDataService {
    pub fn new() -> Self {
        let (reads_paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(MemoryState::default()),
            feed: None,
            reads_paused,
        }
    }

    pub fn with_feed(feed: ChangeFeed) -> Self {
        Self {
            feed: Some(feed),
            ..Self::new()
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RemoteError> {
        self.state
            .lock()
            .map_err(|_| RemoteError::Unavailable("memory backend lock poisoned".to_string()))
    }

    fn state_unchecked(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the rows of a table.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.state_unchecked().tables.insert(table.to_string(), rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state_unchecked()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        self.state_unchecked()
            .objects
            .get(&format!("{bucket}/{path}"))
            .cloned()
    }

    /// Register an access token that resolves to `user`.
    pub fn register_token(&self, token: impl Into<String>, user: AuthUser) {
        self.state_unchecked().users.insert(token.into(), user);
    }

    /// Make every `operation` against `target` (table, function or bucket) fail.
    pub fn fail_on(&self, operation: Operation, target: &str) {
        self.state_unchecked()
            .failures
            .insert((operation, target.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state_unchecked().failures.clear();
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.state_unchecked()
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Hold every subsequent read until [`resume_reads`](Self::resume_reads).
    pub fn pause_reads(&self) {
        self.reads_paused.send_replace(true);
    }

    pub fn resume_reads(&self) {
        self.reads_paused.send_replace(false);
    }

    fn begin(&self, operation: Operation, target: &str) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        *state.calls.entry(operation).or_insert(0) += 1;
        if state.failures.contains(&(operation, target.to_string())) {
            return Err(RemoteError::Unavailable(format!(
                "{operation:?} against {target} failed"
            )));
        }
        Ok(())
    }

    fn notify(&self, table: &str, kind: ChangeKind) {
        if let (Some(feed), Some(table)) = (&self.feed, Table::from_name(table)) {
            feed.publish(RealtimeChange::new(table, kind));
        }
    }

    fn storage_table(source: &str) -> &str {
        match Table::from_name(source) {
            Some(table) => table.name(),
            None => source,
        }
    }

    fn insert_row(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        let Value::Object(mut fields) = row else {
            return Err(RemoteError::Api {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| json!(Utc::now()));

        let stored = Value::Object(fields);
        {
            let mut state = self.state()?;
            state
                .tables
                .entry(table.to_string())
                .or_default()
                .push(stored.clone());
        }
        self.notify(table, ChangeKind::Insert);
        Ok(stored)
    }
}

fn merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[async_trait]
impl RemoteDataService for InMemoryDataService {
    async fn select(&self, source: &str, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        let mut paused = self.reads_paused.subscribe();
        let _ = paused.wait_for(|paused| !*paused).await;

        let table = Self::storage_table(source);
        self.begin(Operation::Select, source)?;
        let state = self.state()?;
        let rows = state.tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        self.begin(Operation::Insert, table)?;
        self.insert_row(table, row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, RemoteError> {
        self.begin(Operation::Update, table)?;
        let Value::Object(patch) = patch else {
            return Err(RemoteError::Api {
                status: 400,
                message: "patch must be a JSON object".to_string(),
            });
        };

        let updated = {
            let mut state = self.state()?;
            let row = state
                .tables
                .get_mut(table)
                .and_then(|rows| {
                    rows.iter_mut()
                        .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
                })
                .ok_or(RemoteError::NotFound)?;
            if let Value::Object(fields) = row {
                merge(fields, patch);
            }
            row.clone()
        };
        self.notify(table, ChangeKind::Update);
        Ok(updated)
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, RemoteError> {
        self.begin(Operation::Rpc, function)?;
        match function {
            CONTACT_RPC => {
                let mut row = match args {
                    Value::Object(fields) => fields,
                    _ => {
                        return Err(RemoteError::Api {
                            status: 400,
                            message: "contact arguments must be an object".to_string(),
                        })
                    }
                };
                row.insert("status".to_string(), json!("new"));
                self.insert_row(Table::ContactSubmissions.name(), Value::Object(row))
            }
            other => Err(RemoteError::Api {
                status: 404,
                message: format!("function {other} does not exist"),
            }),
        }
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, RemoteError> {
        self.begin(Operation::Upload, bucket)?;
        let key = format!("{bucket}/{path}");
        let mut state = self.state()?;
        if state.objects.contains_key(&key) {
            return Err(RemoteError::Api {
                status: 409,
                message: "object already exists".to_string(),
            });
        }
        state
            .objects
            .insert(key, (content_type.to_string(), bytes));
        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RemoteError> {
        self.begin(Operation::SignedUrl, bucket)?;
        let state = self.state()?;
        if !state.objects.contains_key(&format!("{bucket}/{path}")) {
            return Err(RemoteError::NotFound);
        }
        Ok(format!(
            "memory://{bucket}/{path}?expires_in={}",
            expires_in.as_secs()
        ))
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, RemoteError> {
        self.begin(Operation::Authenticate, "auth")?;
        let state = self.state()?;
        state
            .users
            .get(access_token)
            .cloned()
            .ok_or(RemoteError::Unauthorized)
    }
}
