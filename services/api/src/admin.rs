use crate::infra::AppContext;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use talent_bridge::dashboard::{
    CollectionFilter, DashboardAggregator, DashboardOverview, DashboardStats, RefreshOutcome,
    RefreshTrigger,
};
use talent_bridge::domain::{
    ContactSubmission, SponsorProfile, Table, TalentProfile, UnknownStatus,
};
use talent_bridge::error::AppError;
use talent_bridge::export::{export_csv, CsvExport};
use talent_bridge::remote::RemoteError;
use talent_bridge::review::{ContactAction, ReviewAction, ReviewOutcome, CV_LINK_TTL};
use tracing::warn;

pub(crate) fn admin_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/v1/admin/dashboard", get(dashboard_overview))
        .route("/api/v1/admin/stats", get(dashboard_stats))
        .route("/api/v1/admin/refresh", post(refresh_dashboard))
        .route("/api/v1/admin/auto-refresh", put(set_auto_refresh))
        .route("/api/v1/admin/banner", delete(dismiss_banner))
        .route("/api/v1/admin/talent", get(list_talent))
        .route("/api/v1/admin/talent/:id/review", post(review_talent))
        .route("/api/v1/admin/talent/:id/cv", get(talent_cv_link))
        .route("/api/v1/admin/sponsors", get(list_sponsors))
        .route("/api/v1/admin/sponsors/:id/review", post(review_sponsor))
        .route("/api/v1/admin/contacts", get(list_contacts))
        .route("/api/v1/admin/contacts/:id/triage", post(triage_contact))
        .route("/api/v1/admin/export/:collection", get(export_endpoint))
        .route_layer(middleware::from_fn_with_state(
            context.clone(),
            require_admin,
        ))
        .with_state(context)
}

/// Admin routes need a bearer token the data service resolves to an admin.
pub(crate) async fn require_admin(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let user = context
        .remote
        .authenticate(&token)
        .await
        .map_err(|err| match err {
            RemoteError::Unauthorized => {
                AppError::Unauthorized("access token rejected".to_string())
            }
            other => AppError::Remote(other),
        })?;
    if !user.is_admin() {
        warn!(user = %user.id, "non-admin user attempted an admin route");
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

impl ListParams {
    fn filter<S>(self) -> Result<CollectionFilter<S>, AppError>
    where
        S: FromStr<Err = UnknownStatus>,
    {
        CollectionFilter::parse(self.search, self.status.as_deref())
            .map_err(|err| AppError::BadRequest(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    action: ReviewAction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriageRequest {
    action: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutoRefreshRequest {
    enabled: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RowsView<T> {
    total: usize,
    rows: Vec<T>,
}

impl<T> From<Vec<T>> for RowsView<T> {
    fn from(rows: Vec<T>) -> Self {
        Self {
            total: rows.len(),
            rows,
        }
    }
}

pub(crate) async fn dashboard_overview(
    State(context): State<Arc<AppContext>>,
) -> Json<DashboardOverview> {
    Json(context.dashboard.overview(Utc::now()))
}

pub(crate) async fn dashboard_stats(State(context): State<Arc<AppContext>>) -> Json<DashboardStats> {
    Json(context.dashboard.stats(Utc::now()))
}

pub(crate) async fn refresh_dashboard(
    State(context): State<Arc<AppContext>>,
) -> Json<RefreshOutcome> {
    Json(context.dashboard.refresh(RefreshTrigger::Manual).await)
}

pub(crate) async fn set_auto_refresh(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<AutoRefreshRequest>,
) -> Json<Value> {
    context.dashboard.set_auto_refresh(request.enabled);
    Json(json!({ "auto_refresh": request.enabled }))
}

pub(crate) async fn dismiss_banner(State(context): State<Arc<AppContext>>) -> StatusCode {
    context.dashboard.dismiss_banner();
    StatusCode::NO_CONTENT
}

pub(crate) async fn list_talent(
    State(context): State<Arc<AppContext>>,
    Query(params): Query<ListParams>,
) -> Result<Json<RowsView<TalentProfile>>, AppError> {
    let rows = context.dashboard.talent(&params.filter()?);
    Ok(Json(RowsView::from(rows)))
}

pub(crate) async fn list_sponsors(
    State(context): State<Arc<AppContext>>,
    Query(params): Query<ListParams>,
) -> Result<Json<RowsView<SponsorProfile>>, AppError> {
    let rows = context.dashboard.sponsors(&params.filter()?);
    Ok(Json(RowsView::from(rows)))
}

pub(crate) async fn list_contacts(
    State(context): State<Arc<AppContext>>,
    Query(params): Query<ListParams>,
) -> Result<Json<RowsView<ContactSubmission>>, AppError> {
    let rows = context.dashboard.contacts(&params.filter()?);
    Ok(Json(RowsView::from(rows)))
}

pub(crate) async fn review_talent(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let outcome = context.reviews.review_talent(&id, request.action).await?;
    Ok(Json(outcome))
}

pub(crate) async fn review_sponsor(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let outcome = context.reviews.review_sponsor(&id, request.action).await?;
    Ok(Json(outcome))
}

pub(crate) async fn triage_contact(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(request): Json<TriageRequest>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let action: ContactAction = request.action.parse().map_err(AppError::BadRequest)?;
    let outcome = context.reviews.triage_contact(&id, action).await?;
    Ok(Json(outcome))
}

pub(crate) async fn talent_cv_link(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    match context.reviews.cv_link(&id).await? {
        Some(url) => Ok(Json(json!({
            "url": url,
            "expires_in": CV_LINK_TTL.as_secs(),
        }))),
        None => Err(AppError::NotFound(format!("talent {id} has no CV on file"))),
    }
}

pub(crate) async fn export_endpoint(
    State(context): State<Arc<AppContext>>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let export = export_collection(&context.dashboard, &collection, params)?;
    Ok(csv_response(export))
}

/// CSV of the rows the dashboard currently shows for `collection` under the
/// given filter.
pub(crate) fn export_collection(
    dashboard: &DashboardAggregator,
    collection: &str,
    params: ListParams,
) -> Result<Option<CsvExport>, AppError> {
    let table = Table::ALL
        .into_iter()
        .find(|table| table.label() == collection)
        .ok_or_else(|| AppError::NotFound(format!("unknown collection '{collection}'")))?;
    let today = Utc::now().date_naive();

    let export = match table {
        Table::TalentProfiles => {
            export_csv(&dashboard.talent(&params.filter()?), table.label(), today)?
        }
        Table::SponsorProfiles => {
            export_csv(&dashboard.sponsors(&params.filter()?), table.label(), today)?
        }
        Table::ContactSubmissions => {
            export_csv(&dashboard.contacts(&params.filter()?), table.label(), today)?
        }
    };
    Ok(export)
}

fn csv_response(export: Option<CsvExport>) -> Response {
    let Some(export) = export else {
        return StatusCode::NO_CONTENT.into_response();
    };
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.content,
    )
        .into_response()
}
