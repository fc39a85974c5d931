use crate::infra::{AppContext, AppState};
use crate::routes::app_router;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use talent_bridge::config::{
    AppConfig, AppEnvironment, DashboardConfig, DirectoryConfig, DraftConfig, RemoteConfig,
    ServerConfig, TelemetryConfig,
};
use talent_bridge::remote::{AuthUser, ChangeFeed, InMemoryDataService, WEBHOOK_SECRET_HEADER};
use tempfile::TempDir;
use tower::ServiceExt;

pub(crate) const ADMIN_TOKEN: &str = "admin-token";
pub(crate) const MEMBER_TOKEN: &str = "member-token";
pub(crate) const ACCESS_CODE: &str = "open-sesame";
pub(crate) const CV_BUCKET: &str = "cvs";
pub(crate) const WEBHOOK_SECRET: &str = "hook-secret";

/// Argon2 hash of [`ACCESS_CODE`] with low-cost parameters, built once.
pub(crate) fn access_code_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        let params = Params::new(1024, 1, 1, None).expect("valid argon2 params");
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(ACCESS_CODE.as_bytes(), &SaltString::generate(&mut OsRng))
            .expect("hashes")
            .to_string()
    })
    .clone()
}

pub(crate) struct Harness {
    pub(crate) router: Router,
    pub(crate) remote: Arc<InMemoryDataService>,
    pub(crate) context: Arc<AppContext>,
    pub(crate) readiness: Arc<AtomicBool>,
    _drafts: TempDir,
}

pub(crate) fn config(drafts: &Path) -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "debug".to_string(),
        },
        remote: RemoteConfig {
            url: None,
            anon_key: String::new(),
            service_key: None,
            cv_bucket: CV_BUCKET.to_string(),
            dev_admin_token: None,
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        },
        dashboard: DashboardConfig {
            refresh_interval: Duration::from_secs(30),
            toast_ttl: Duration::from_secs(3),
            auto_refresh: false,
        },
        drafts: DraftConfig {
            directory: drafts.to_path_buf(),
            debounce: Duration::from_millis(20),
        },
        directory: DirectoryConfig {
            access_code: None,
            access_code_hash: Some(access_code_hash()),
            page_size: 2,
        },
    }
}

pub(crate) fn harness() -> Harness {
    let drafts = tempfile::tempdir().expect("draft dir");
    let config = config(drafts.path());
    harness_with(config, drafts)
}

pub(crate) fn harness_with(config: AppConfig, drafts: TempDir) -> Harness {
    let feed = ChangeFeed::new(16);
    let remote = Arc::new(InMemoryDataService::with_feed(feed.clone()));
    remote.register_token(
        ADMIN_TOKEN,
        AuthUser {
            id: "admin-1".to_string(),
            email: Some("ops@example.org".to_string()),
            role: Some("admin".to_string()),
        },
    );
    remote.register_token(
        MEMBER_TOKEN,
        AuthUser {
            id: "member-1".to_string(),
            email: Some("member@example.org".to_string()),
            role: None,
        },
    );

    let context = Arc::new(
        AppContext::assemble(&config, remote.clone(), feed).expect("context assembles"),
    );
    let readiness = Arc::new(AtomicBool::new(true));
    let state = AppState {
        readiness: readiness.clone(),
        metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        context: context.clone(),
    };

    Harness {
        router: app_router(state),
        remote,
        context,
        readiness,
        _drafts: drafts,
    }
}

pub(crate) fn talent_row(id: &str, status: &str, cv_path: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": format!("Talent {id}"),
        "email": format!("{id}@example.org"),
        "headline": "Payments engineer",
        "bio": null,
        "industry": "Fintech",
        "seniority": "Senior",
        "years_of_experience": 8,
        "functions": ["Engineering"],
        "skills": ["Rust", "Payments"],
        "languages": ["English"],
        "achievements": [],
        "linkedin_url": null,
        "portfolio_url": null,
        "cv_path": cv_path,
        "consent": true,
        "source": "website",
        "status": status,
        "created_at": "2025-02-01T00:00:00Z",
        "updated_at": null
    })
}

pub(crate) fn contact_row(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": "Visitor",
        "email": format!("{id}@example.org"),
        "inquiry_type": "General",
        "organization": null,
        "message": "Just saying hello to the team",
        "status": status,
        "created_at": "2025-02-02T00:00:00Z"
    })
}

pub(crate) fn talent_form() -> Value {
    json!({
        "name": "Ada Obi",
        "email": "ada@example.org",
        "headline": "Product lead for fintech",
        "bio": "Ten years building payment products across West Africa and Europe, most recently leading a platform team.",
        "industry": "Fintech",
        "seniority": "Senior",
        "years_of_experience": 10,
        "functions": ["Product"],
        "skills": ["Payments"],
        "languages": ["English"],
        "achievements": [],
        "consent": true
    })
}

pub(crate) fn contact_form() -> Value {
    json!({
        "name": "Sam Doe",
        "email": "sam@example.org",
        "inquiry_type": "Partnership",
        "message": "We would like to discuss a partnership."
    })
}

fn with_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub(crate) fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    with_token(Request::get(uri), token)
        .body(Body::empty())
        .expect("request builds")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Value,
    token: Option<&str>,
) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(crate) fn webhook_request(body: Value, secret: Option<&str>) -> Request<Body> {
    let builder = Request::post("/api/v1/realtime/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    let builder = match secret {
        Some(secret) => builder.header(WEBHOOK_SECRET_HEADER, secret),
        None => builder,
    };
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(crate) async fn respond(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.expect("router responds")
}

pub(crate) async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec()
}

/// Status plus the body parsed as JSON (`Null` when empty).
pub(crate) async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = respond(router, request).await;
    let status = response.status();
    let bytes = body_bytes(response).await;
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&bytes).expect("json body"))
}
