use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::dashboard::DashboardAggregator;
use crate::remote::{ChangeFeed, InMemoryDataService, SharedRemote};

pub(super) const TOAST_TTL: Duration = Duration::from_secs(3);

pub(super) fn talent_row(id: &str, name: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{id}@example.org"),
        "headline": "Engineering lead",
        "bio": null,
        "industry": "Fintech",
        "seniority": null,
        "years_of_experience": null,
        "functions": ["Engineering"],
        "skills": ["Rust"],
        "languages": [],
        "achievements": [],
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

pub(super) fn sponsor_row(id: &str, organization: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": "Sponsor Contact",
        "email": format!("{id}@example.org"),
        "organization": organization,
        "role_title": null,
        "website": null,
        "sponsor_type": "Mentor",
        "focus_areas": ["Fintech"],
        "message": null,
        "pledge_accepted": true,
        "consent": true,
        "source": "website",
        "status": status,
        "created_at": created_at,
        "updated_at": null
    })
}

pub(super) fn contact_row(id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": "Visitor",
        "email": format!("{id}@example.org"),
        "inquiry_type": "General",
        "organization": null,
        "message": "Just saying hello to the team",
        "status": status,
        "created_at": created_at
    })
}

pub(super) fn seeded_remote(feed: Option<ChangeFeed>) -> Arc<InMemoryDataService> {
    let remote = match feed {
        Some(feed) => InMemoryDataService::with_feed(feed),
        None => InMemoryDataService::new(),
    };
    remote.seed(
        "talent_profiles",
        vec![
            talent_row("t1", "Ada", "pending", "2025-01-01T00:00:00Z"),
            talent_row("t2", "Grace", "approved", "2025-01-03T00:00:00Z"),
        ],
    );
    remote.seed(
        "sponsor_profiles",
        vec![sponsor_row("s1", "Acme", "pending", "2025-01-02T00:00:00Z")],
    );
    remote.seed(
        "contact_submissions",
        vec![contact_row("c1", "new", "2025-01-04T00:00:00Z")],
    );
    Arc::new(remote)
}

pub(super) fn aggregator(remote: &Arc<InMemoryDataService>) -> Arc<DashboardAggregator> {
    let shared: SharedRemote = remote.clone();
    Arc::new(DashboardAggregator::with_settings(shared, TOAST_TTL, true))
}

/// Poll `condition` until it holds, giving spawned tasks a chance to run.
pub(super) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
