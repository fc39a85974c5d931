use super::common::*;
use axum::http::{header, Method, StatusCode};
use serde_json::json;
use talent_bridge::dashboard::RefreshTrigger;
use talent_bridge::remote::{Operation, RemoteDataService};

async fn seeded() -> Harness {
    let harness = harness();
    harness.remote.seed(
        "talent_profiles",
        vec![
            talent_row("t1", "submitted", Some("t1/cv.pdf")),
            talent_row("t2", "approved", None),
        ],
    );
    harness
        .remote
        .seed("contact_submissions", vec![contact_row("c1", "new")]);
    harness
        .context
        .dashboard
        .refresh(RefreshTrigger::Startup)
        .await;
    harness
}

#[tokio::test]
async fn admin_routes_require_an_admin_token() {
    let harness = seeded().await;

    let (status, body) = send(&harness.router, get_request("/api/v1/admin/stats", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing bearer token");

    let (status, _) = send(
        &harness.router,
        get_request("/api/v1/admin/stats", Some("forged")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &harness.router,
        get_request("/api/v1/admin/stats", Some(MEMBER_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &harness.router,
        get_request("/api/v1/admin/stats", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["talent"]["pending"], 1);
    assert_eq!(body["talent"]["approved"], 1);
}

#[tokio::test]
async fn lists_apply_search_and_status() {
    let harness = seeded().await;

    let (status, body) = send(
        &harness.router,
        get_request("/api/v1/admin/talent?status=pending", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["id"], "t1");

    let (status, body) = send(
        &harness.router,
        get_request("/api/v1/admin/talent?search=T2&status=all", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["id"], "t2");

    let (status, _) = send(
        &harness.router,
        get_request("/api/v1/admin/contacts?status=shredded", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_actions_write_once_and_reject_bad_transitions() {
    let harness = seeded().await;

    let (status, body) = send(
        &harness.router,
        json_request(
            Method::POST,
            "/api/v1/admin/talent/t1/review",
            json!({ "action": "approve" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "pending");
    assert_eq!(body["to"], "approved");
    assert_eq!(harness.remote.calls(Operation::Update), 1);

    let (status, _) = send(
        &harness.router,
        json_request(
            Method::POST,
            "/api/v1/admin/talent/t2/review",
            json!({ "action": "reject" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &harness.router,
        json_request(
            Method::POST,
            "/api/v1/admin/contacts/c1/triage",
            json!({ "action": "mark-read" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to"], "read");

    let (status, _) = send(
        &harness.router,
        json_request(
            Method::POST,
            "/api/v1/admin/sponsors/missing/review",
            json!({ "action": "approve" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(harness.remote.calls(Operation::Update), 2);
}

#[tokio::test]
async fn failed_review_surfaces_the_banner_until_dismissed() {
    let harness = seeded().await;
    harness.remote.fail_on(Operation::Update, "talent_profiles");

    let (status, _) = send(
        &harness.router,
        json_request(
            Method::POST,
            "/api/v1/admin/talent/t1/review",
            json!({ "action": "approve" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, overview) = send(
        &harness.router,
        get_request("/api/v1/admin/dashboard", Some(ADMIN_TOKEN)),
    )
    .await;
    let message = overview["banner"]["message"].as_str().expect("banner set");
    assert!(message.starts_with("Failed to update talent t1"));
    assert_eq!(overview["stats"]["talent"]["pending"], 1);

    let request = axum::http::Request::delete("/api/v1/admin/banner")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(axum::body::Body::empty())
        .expect("request builds");
    let (status, _) = send(&harness.router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(harness.context.dashboard.banner().is_none());
}

#[tokio::test]
async fn export_returns_csv_or_no_content() {
    let harness = seeded().await;

    let response = respond(
        &harness.router,
        get_request("/api/v1/admin/export/talent?status=all", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"talent-"));
    let content = String::from_utf8(body_bytes(response).await).expect("utf-8 csv");
    assert_eq!(content.lines().count(), 3);

    let (status, body) = send(
        &harness.router,
        get_request("/api/v1/admin/export/sponsors", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(
        &harness.router,
        get_request("/api/v1/admin/export/invoices", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cv_link_and_auto_refresh_toggle() {
    let harness = seeded().await;
    harness
        .remote
        .upload(CV_BUCKET, "t1/cv.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
        .await
        .expect("upload");

    let (status, body) = send(
        &harness.router,
        get_request("/api/v1/admin/talent/t1/cv", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "memory://cvs/t1/cv.pdf?expires_in=300");

    let (status, _) = send(
        &harness.router,
        get_request("/api/v1/admin/talent/t2/cv", Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &harness.router,
        json_request(
            Method::PUT,
            "/api/v1/admin/auto-refresh",
            json!({ "enabled": true }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auto_refresh"], true);
    assert!(harness.context.dashboard.auto_refresh());
}
