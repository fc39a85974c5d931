//! Debounced persistence of in-progress form drafts.
//!
//! A draft is saved on every keystroke burst but only written to disk once no
//! newer save has arrived for the debounce window. Restoring prefers the value
//! still waiting to be flushed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::forms::FormKind;

const MAX_DRAFT_ID_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("draft id must be 1-64 letters, digits, '-' or '_'")]
    InvalidId,
    #[error("draft storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DraftKey {
    kind: FormKind,
    id: String,
}

#[derive(Debug)]
struct PendingDraft {
    generation: u64,
    value: Value,
}

#[derive(Debug, Default)]
struct DraftState {
    next_generation: u64,
    pending: HashMap<DraftKey, PendingDraft>,
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    root: PathBuf,
    debounce: Duration,
    state: Arc<Mutex<DraftState>>,
}

impl DraftStore {
    pub fn new(root: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            root: root.into(),
            debounce,
            state: Arc::new(Mutex::new(DraftState::default())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record the latest draft and schedule a flush after the debounce window.
    pub async fn save(&self, kind: FormKind, id: &str, value: Value) -> Result<(), DraftError> {
        let key = draft_key(kind, id)?;
        let generation = {
            let mut state = self.state.lock().await;
            state.next_generation += 1;
            let generation = state.next_generation;
            state
                .pending
                .insert(key.clone(), PendingDraft { generation, value });
            generation
        };

        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(store.debounce).await;
            if let Err(err) = store.flush_if_current(&key, generation).await {
                warn!(form = key.kind.as_str(), draft = %key.id, error = %err, "draft flush failed");
            }
        });
        Ok(())
    }

    /// Latest saved value, whether or not it has reached disk yet.
    pub async fn restore(&self, kind: FormKind, id: &str) -> Result<Option<Value>, DraftError> {
        let key = draft_key(kind, id)?;
        {
            let state = self.state.lock().await;
            if let Some(pending) = state.pending.get(&key) {
                return Ok(Some(pending.value.clone()));
            }
        }

        match tokio::fs::read(self.path_for(&key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Drop the draft, including any flush still waiting on the debounce.
    pub async fn clear(&self, kind: FormKind, id: &str) -> Result<(), DraftError> {
        let key = draft_key(kind, id)?;
        let mut state = self.state.lock().await;
        state.pending.remove(&key);
        match tokio::fs::remove_file(self.path_for(&key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write every pending draft immediately; used on shutdown.
    pub async fn flush_all(&self) -> Result<usize, DraftError> {
        let mut state = self.state.lock().await;
        let pending: Vec<(DraftKey, PendingDraft)> = state.pending.drain().collect();
        for (key, draft) in &pending {
            self.write(key, &draft.value).await?;
        }
        Ok(pending.len())
    }

    async fn flush_if_current(&self, key: &DraftKey, generation: u64) -> Result<(), DraftError> {
        // The lock is held across the write so a concurrent clear cannot be undone.
        let mut state = self.state.lock().await;
        let is_current = state
            .pending
            .get(key)
            .is_some_and(|pending| pending.generation == generation);
        if !is_current {
            return Ok(());
        }

        if let Some(draft) = state.pending.remove(key) {
            self.write(key, &draft.value).await?;
            debug!(form = key.kind.as_str(), draft = %key.id, "draft flushed");
        }
        Ok(())
    }

    async fn write(&self, key: &DraftKey, value: &Value) -> Result<(), DraftError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec(value)?).await?;
        Ok(())
    }

    fn path_for(&self, key: &DraftKey) -> PathBuf {
        self.root
            .join(key.kind.as_str())
            .join(format!("{}.json", key.id))
    }
}

fn draft_key(kind: FormKind, id: &str) -> Result<DraftKey, DraftError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_DRAFT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(DraftError::InvalidId);
    }
    Ok(DraftKey {
        kind,
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(dir: &Path, debounce_ms: u64) -> DraftStore {
        DraftStore::new(dir, Duration::from_millis(debounce_ms))
    }

    async fn wait_for_file(path: &Path) -> bool {
        for _ in 0..100 {
            if tokio::fs::metadata(path).await.is_ok() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn latest_save_wins_after_debounce() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drafts = store(dir.path(), 30);

        drafts
            .save(FormKind::Talent, "draft-1", json!({ "name": "A" }))
            .await
            .expect("first save");
        drafts
            .save(FormKind::Talent, "draft-1", json!({ "name": "Ada" }))
            .await
            .expect("second save");

        let path = dir.path().join("talent").join("draft-1.json");
        assert!(!path.exists(), "nothing is written inside the debounce window");
        assert_eq!(
            drafts
                .restore(FormKind::Talent, "draft-1")
                .await
                .expect("restore pending"),
            Some(json!({ "name": "Ada" }))
        );

        assert!(wait_for_file(&path).await, "draft flushed to disk");
        let on_disk: Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read draft")).expect("json");
        assert_eq!(on_disk, json!({ "name": "Ada" }));

        let reopened = store(dir.path(), 30);
        assert_eq!(
            reopened
                .restore(FormKind::Talent, "draft-1")
                .await
                .expect("restore from disk"),
            Some(json!({ "name": "Ada" }))
        );
    }

    #[tokio::test]
    async fn clear_cancels_pending_flush() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drafts = store(dir.path(), 20);

        drafts
            .save(FormKind::Sponsor, "s1", json!({ "organization": "Acme" }))
            .await
            .expect("save");
        drafts.clear(FormKind::Sponsor, "s1").await.expect("clear");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!dir.path().join("sponsor").join("s1.json").exists());
        assert_eq!(
            drafts.restore(FormKind::Sponsor, "s1").await.expect("restore"),
            None
        );
    }

    #[tokio::test]
    async fn flush_all_writes_immediately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drafts = store(dir.path(), 60_000);

        drafts
            .save(FormKind::Contact, "c1", json!({ "message": "hello" }))
            .await
            .expect("save");
        assert_eq!(drafts.flush_all().await.expect("flush"), 1);
        assert!(dir.path().join("contact").join("c1.json").exists());
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drafts = store(dir.path(), 10);
        for id in ["", "../escape", "a/b", &"x".repeat(65)] {
            assert!(matches!(
                drafts.save(FormKind::Talent, id, json!({})).await,
                Err(DraftError::InvalidId)
            ));
        }
    }
}
