use std::fmt;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::listing::{industries, DirectoryEntry, DirectoryFilter};
use crate::domain::{ReviewStatus, Table, TalentProfile};
use crate::remote::{select_rows, RemoteError, SelectQuery, SharedRemote};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Incorrect access code. Please try again.")]
    Denied,
    #[error("the talent directory is not available")]
    NotConfigured,
    #[error("directory access code hash is unusable: {0}")]
    InvalidHash(String),
    #[error("directory listing unavailable: {0}")]
    Remote(#[from] RemoteError),
}

/// Decides whether a credential opens the directory.
#[async_trait]
pub trait AccessVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<(), GateError>;
}

/// Shared access code handed out to sponsors, held only as an argon2 hash.
pub struct SharedCodeVerifier {
    hash: Option<String>,
}

impl SharedCodeVerifier {
    /// Verifier for a PHC string such as the one `hash-access-code` prints.
    pub fn from_hash(phc: impl Into<String>) -> Result<Self, GateError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(invalid_hash)?;
        Ok(Self { hash: Some(phc) })
    }

    /// Hash a plaintext code at startup. A blank code leaves the gate closed.
    pub fn from_code(code: &str) -> Result<Self, GateError> {
        if code.trim().is_empty() {
            return Ok(Self::unconfigured());
        }
        Ok(Self {
            hash: Some(hash_access_code(code)?),
        })
    }

    pub fn unconfigured() -> Self {
        Self { hash: None }
    }
}

/// PHC-format argon2id hash of an access code, salted per call.
pub fn hash_access_code(code: &str) -> Result<String, GateError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(code.trim().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(invalid_hash)
}

fn invalid_hash(err: password_hash::Error) -> GateError {
    GateError::InvalidHash(err.to_string())
}

impl fmt::Debug for SharedCodeVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCodeVerifier")
            .field("configured", &self.hash.is_some())
            .finish()
    }
}

#[async_trait]
impl AccessVerifier for SharedCodeVerifier {
    async fn verify(&self, credential: &str) -> Result<(), GateError> {
        let Some(hash) = &self.hash else {
            return Err(GateError::NotConfigured);
        };
        let parsed = PasswordHash::new(hash).map_err(invalid_hash)?;
        match Argon2::default().verify_password(credential.trim().as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(password_hash::Error::Password) => Err(GateError::Denied),
            Err(err) => Err(invalid_hash(err)),
        }
    }
}

/// Accepts any access token the remote auth API resolves to a user.
pub struct RemoteAuthVerifier {
    remote: SharedRemote,
}

impl RemoteAuthVerifier {
    pub fn new(remote: SharedRemote) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl AccessVerifier for RemoteAuthVerifier {
    async fn verify(&self, credential: &str) -> Result<(), GateError> {
        match self.remote.authenticate(credential.trim()).await {
            Ok(user) => {
                debug!(user = %user.id, "directory token accepted");
                Ok(())
            }
            Err(RemoteError::Unauthorized) => Err(GateError::Denied),
            Err(err) => Err(err.into()),
        }
    }
}

/// Revealed directory; only [`DirectoryGate::unlock`] hands one out.
#[derive(Debug, Clone, Serialize)]
pub struct DirectorySession {
    entries: Vec<DirectoryEntry>,
    industries: Vec<String>,
}

impl DirectorySession {
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn industries(&self) -> &[String] {
        &self.industries
    }

    pub fn filter(&self, filter: &DirectoryFilter) -> Vec<&DirectoryEntry> {
        filter.apply(&self.entries)
    }
}

pub struct DirectoryGate {
    verifier: Arc<dyn AccessVerifier>,
    remote: SharedRemote,
    page_size: usize,
}

impl DirectoryGate {
    pub fn new(verifier: Arc<dyn AccessVerifier>, remote: SharedRemote, page_size: usize) -> Self {
        Self {
            verifier,
            remote,
            page_size: page_size.max(1),
        }
    }

    /// Check the credential, then load every approved profile page by page.
    pub async fn unlock(&self, credential: &str) -> Result<DirectorySession, GateError> {
        self.verifier.verify(credential).await?;

        let entries = self.approved_entries().await?;
        info!(entries = entries.len(), "talent directory unlocked");
        let industries = industries(&entries);
        Ok(DirectorySession {
            entries,
            industries,
        })
    }

    async fn approved_entries(&self) -> Result<Vec<DirectoryEntry>, GateError> {
        let mut entries = Vec::new();
        let mut page = 0;
        loop {
            let query = SelectQuery::new()
                .eq("status", ReviewStatus::Approved.label())
                .order_by("created_at", false)
                .page(page, self.page_size);
            let page_rows = select_rows::<TalentProfile>(
                self.remote.as_ref(),
                Table::TalentProfiles.name(),
                &query,
            )
            .await?;
            let fetched = page_rows.fetched();
            entries.extend(page_rows.rows.into_iter().map(DirectoryEntry::from));
            if fetched < self.page_size {
                return Ok(entries);
            }
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{AuthUser, InMemoryDataService, Operation};
    use argon2::{Algorithm, Params, Version};
    use serde_json::{json, Value};

    /// Low-cost parameters so hashing stays quick in unoptimised test builds.
    fn cheap_hash(code: &str) -> String {
        let params = Params::new(1024, 1, 1, None).expect("valid argon2 params");
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(code.as_bytes(), &SaltString::generate(&mut OsRng))
            .expect("hashes")
            .to_string()
    }

    fn talent_row(id: &str, headline: &str, status: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "name": "Hidden Name",
            "email": "hidden@example.org",
            "headline": headline,
            "bio": null,
            "industry": "Fintech",
            "seniority": "Senior",
            "years_of_experience": 8,
            "functions": ["Engineering"],
            "skills": ["Rust", "Engineering"],
            "languages": null,
            "achievements": ["Shipped a ledger"],
            "linkedin_url": null,
            "portfolio_url": null,
            "cv_path": null,
            "consent": true,
            "source": "website",
            "status": status,
            "created_at": created_at,
            "updated_at": null
        })
    }

    fn remote_with_rows() -> Arc<InMemoryDataService> {
        let remote = Arc::new(InMemoryDataService::new());
        remote.seed(
            "talent_profiles",
            vec![
                talent_row("t1", "Backend Engineer", "approved", "2025-01-01T00:00:00Z"),
                talent_row("t2", "Data Lead", "pending", "2025-01-02T00:00:00Z"),
                talent_row("t3", "Platform Engineer", "approved", "2025-01-03T00:00:00Z"),
                talent_row("t4", "Staff Engineer", "approved", "2025-01-04T00:00:00Z"),
            ],
        );
        remote
    }

    fn code_gate(remote: Arc<InMemoryDataService>, page_size: usize) -> DirectoryGate {
        DirectoryGate::new(
            Arc::new(SharedCodeVerifier::from_hash(cheap_hash("open-sesame")).expect("valid hash")),
            remote,
            page_size,
        )
    }

    #[tokio::test]
    async fn correct_code_reveals_only_approved_talent() {
        let remote = remote_with_rows();
        let gate = code_gate(remote.clone(), 2);

        let session = gate.unlock("open-sesame").await.expect("unlocks");
        let ids: Vec<&str> = session.entries().iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["t4", "t3", "t1"]);
        assert_eq!(session.entries()[0].expertise, vec!["Engineering", "Rust"]);
        assert_eq!(session.industries(), ["All".to_string(), "Fintech".to_string()]);
        assert_eq!(remote.calls(Operation::Select), 2, "two pages of two");

        let serialized = serde_json::to_string(&session).expect("serializes");
        assert!(!serialized.contains("hidden@example.org"));
    }

    #[tokio::test]
    async fn wrong_code_is_denied_without_reading() {
        let remote = remote_with_rows();
        let gate = code_gate(remote.clone(), 50);

        for attempt in ["", "open", "OPEN-SESAME", "open-sesame!"] {
            match gate.unlock(attempt).await {
                Err(GateError::Denied) => {}
                other => panic!("expected denial for {attempt:?}, got {other:?}"),
            }
        }
        assert_eq!(remote.calls(Operation::Select), 0);
        assert_eq!(
            GateError::Denied.to_string(),
            "Incorrect access code. Please try again."
        );
    }

    #[tokio::test]
    async fn unset_code_never_unlocks() {
        let remote = remote_with_rows();
        let blank = SharedCodeVerifier::from_code("  ").expect("blank code is accepted");
        let gate = DirectoryGate::new(Arc::new(blank), remote.clone(), 50);
        assert!(matches!(gate.unlock("").await, Err(GateError::NotConfigured)));

        let gate = DirectoryGate::new(Arc::new(SharedCodeVerifier::unconfigured()), remote, 50);
        assert!(matches!(gate.unlock("anything").await, Err(GateError::NotConfigured)));
    }

    #[test]
    fn malformed_hash_is_rejected_up_front() {
        match SharedCodeVerifier::from_hash("open-sesame") {
            Err(GateError::InvalidHash(_)) => {}
            other => panic!("expected an invalid hash error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stored_hash_carries_its_own_parameters() {
        let phc = cheap_hash("open-sesame");
        assert!(phc.starts_with("$argon2id$"));
        assert!(!phc.contains("open-sesame"));

        let verifier = SharedCodeVerifier::from_hash(phc).expect("valid hash");
        assert!(verifier.verify(" open-sesame ").await.is_ok());
        assert!(matches!(verifier.verify("open-sesam").await, Err(GateError::Denied)));
        assert!(!format!("{verifier:?}").contains("argon2"));
    }

    #[test]
    fn default_hashes_are_salted_per_call() {
        let first = hash_access_code("open-sesame").expect("hashes");
        let second = hash_access_code("open-sesame").expect("hashes");
        assert_ne!(first, second);
        assert!(SharedCodeVerifier::from_hash(first).is_ok());
    }

    #[tokio::test]
    async fn undecodable_row_does_not_lock_the_directory() {
        let remote = remote_with_rows();
        let mut rows = remote.rows("talent_profiles");
        let mut broken = talent_row("t5", "Broken Row", "approved", "2025-01-05T00:00:00Z");
        broken["years_of_experience"] = json!("eight");
        rows.push(broken);
        remote.seed("talent_profiles", rows);
        let gate = code_gate(remote.clone(), 2);

        let session = gate.unlock("open-sesame").await.expect("unlocks");
        let ids: Vec<&str> = session.entries().iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["t4", "t3", "t1"]);
    }

    #[tokio::test]
    async fn remote_tokens_are_checked_with_auth_api() {
        let remote = remote_with_rows();
        remote.register_token(
            "member-token",
            AuthUser {
                id: "u1".to_string(),
                email: None,
                role: None,
            },
        );
        let gate = DirectoryGate::new(
            Arc::new(RemoteAuthVerifier::new(remote.clone())),
            remote.clone(),
            50,
        );

        assert!(gate.unlock("member-token").await.is_ok());
        assert!(matches!(gate.unlock("stranger").await, Err(GateError::Denied)));
    }
}
