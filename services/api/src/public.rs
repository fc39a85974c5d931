use crate::infra::AppContext;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use talent_bridge::directory::{DirectoryEntry, DirectoryFilter};
use talent_bridge::error::AppError;
use talent_bridge::forms::{
    validate_field, Attachment, ContactForm, FormKind, SponsorForm, TalentForm, ATTACHMENT_FIELD,
    MAX_ATTACHMENT_BYTES,
};
use talent_bridge::remote::{WebhookPayload, WEBHOOK_SECRET_HEADER};
use tracing::{debug, warn};

/// Room for the JSON payload part on top of the largest accepted CV.
const FORM_BODY_LIMIT: usize = MAX_ATTACHMENT_BYTES + 256 * 1024;

pub(crate) fn public_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/v1/forms/:kind/validate", post(validate_form_field))
        .route(
            "/api/v1/forms/:kind",
            post(submit_form).layer(DefaultBodyLimit::max(FORM_BODY_LIMIT)),
        )
        .route(
            "/api/v1/drafts/:kind/:draft_id",
            put(save_draft).get(restore_draft).delete(clear_draft),
        )
        .route("/api/v1/directory/unlock", post(unlock_directory))
        .route("/api/v1/realtime/webhook", post(realtime_webhook))
        .with_state(context)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldCheck {
    field: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmitParams {
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Deserialize)]
struct FormEnvelope {
    form: Value,
    #[serde(default)]
    draft_id: Option<String>,
}

/// Form body as posted, before it is decoded into a concrete form.
#[derive(Debug, Default)]
struct SubmissionBody {
    form: Option<Value>,
    draft_id: Option<String>,
    attachment: Option<Attachment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnlockRequest {
    credential: String,
    #[serde(flatten)]
    filter: DirectoryFilter,
}

#[derive(Debug, Serialize)]
struct DirectoryView<'a> {
    total: usize,
    industries: &'a [String],
    entries: Vec<&'a DirectoryEntry>,
}

fn parse_kind(raw: &str) -> Result<FormKind, AppError> {
    raw.parse().map_err(AppError::NotFound)
}

pub(crate) async fn validate_form_field(
    Path(kind): Path<String>,
    Json(check): Json<FieldCheck>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&kind)?;
    validate_field(kind, &check.field, &check.value)?;
    Ok(Json(json!({ "field": check.field, "valid": true })))
}

/// Without `confirm` the validated form comes back as a review summary and
/// nothing is written. With `confirm=true` it is submitted.
pub(crate) async fn submit_form(
    State(context): State<Arc<AppContext>>,
    Path(kind): Path<String>,
    Query(params): Query<SubmitParams>,
    request: Request,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let body = read_submission(request).await?;
    if kind != FormKind::Talent && body.attachment.is_some() {
        return Err(AppError::BadRequest(format!(
            "the {kind} form does not accept attachments"
        )));
    }
    let submissions = &context.submissions;

    match kind {
        FormKind::Talent => {
            let form: TalentForm = decode_form(body.form)?;
            let review = submissions
                .prepare_talent(&form, body.attachment)?
                .with_draft(body.draft_id);
            if !params.confirm {
                return Ok(Json(review.summary()).into_response());
            }
            let receipt = submissions.confirm_talent(review).await?;
            Ok((StatusCode::CREATED, Json(receipt)).into_response())
        }
        FormKind::Sponsor => {
            let form: SponsorForm = decode_form(body.form)?;
            let review = submissions.prepare_sponsor(&form)?.with_draft(body.draft_id);
            if !params.confirm {
                return Ok(Json(review.summary()).into_response());
            }
            let receipt = submissions.confirm_sponsor(review).await?;
            Ok((StatusCode::CREATED, Json(receipt)).into_response())
        }
        FormKind::Contact => {
            let form: ContactForm = decode_form(body.form)?;
            let review = submissions.prepare_contact(&form)?.with_draft(body.draft_id);
            if !params.confirm {
                return Ok(Json(review.summary()).into_response());
            }
            let receipt = submissions.confirm_contact(review).await?;
            Ok((StatusCode::CREATED, Json(receipt)).into_response())
        }
    }
}

/// Accepts `{form, draft_id}` JSON, or multipart with a `payload` JSON part
/// plus optional `draft_id` and `cv` parts.
async fn read_submission(request: Request) -> Result<SubmissionBody, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(envelope) = Json::<FormEnvelope>::from_request(request, &())
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        return Ok(SubmissionBody {
            form: Some(envelope.form),
            draft_id: envelope.draft_id,
            attachment: None,
        });
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let mut body = SubmissionBody::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "payload" => {
                let text = field.text().await.map_err(bad_part)?;
                let value = serde_json::from_str(&text).map_err(|err| {
                    AppError::BadRequest(format!("payload is not valid JSON: {err}"))
                })?;
                body.form = Some(value);
            }
            "draft_id" => {
                let text = field.text().await.map_err(bad_part)?;
                body.draft_id = Some(text.trim().to_string()).filter(|id| !id.is_empty());
            }
            ATTACHMENT_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_part)?;
                // Browsers post an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                body.attachment = Some(Attachment::new(file_name, content_type, bytes.to_vec()));
            }
            other => debug!(part = other, "ignoring unexpected multipart part"),
        }
    }
    Ok(body)
}

fn bad_part(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("malformed multipart body: {err}"))
}

fn decode_form<F: DeserializeOwned>(value: Option<Value>) -> Result<F, AppError> {
    let value = value.ok_or_else(|| AppError::BadRequest("missing form payload".to_string()))?;
    serde_json::from_value(value)
        .map_err(|err| AppError::BadRequest(format!("form payload has the wrong shape: {err}")))
}

pub(crate) async fn save_draft(
    State(context): State<Arc<AppContext>>,
    Path((kind, draft_id)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Result<StatusCode, AppError> {
    context.drafts.save(parse_kind(&kind)?, &draft_id, value).await?;
    Ok(StatusCode::ACCEPTED)
}

pub(crate) async fn restore_draft(
    State(context): State<Arc<AppContext>>,
    Path((kind, draft_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&kind)?;
    match context.drafts.restore(kind, &draft_id).await? {
        Some(value) => Ok(Json(value)),
        None => Err(AppError::NotFound(format!("no saved {kind} draft {draft_id}"))),
    }
}

pub(crate) async fn clear_draft(
    State(context): State<Arc<AppContext>>,
    Path((kind, draft_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    context.drafts.clear(parse_kind(&kind)?, &draft_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Each unlock re-checks the credential; nothing about the session is kept.
pub(crate) async fn unlock_directory(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<UnlockRequest>,
) -> Result<Response, AppError> {
    let session = context.directory.unlock(&request.credential).await?;
    let view = DirectoryView {
        total: session.entries().len(),
        industries: session.industries(),
        entries: session.filter(&request.filter),
    };
    Ok(Json(view).into_response())
}

/// The secret header is checked before the body is parsed.
pub(crate) async fn realtime_webhook(
    State(context): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    let authorized = match (&context.webhook_secret, presented) {
        (Some(secret), Some(presented)) => secret.matches(presented),
        _ => false,
    };
    if !authorized {
        warn!("realtime webhook call rejected");
        return Err(AppError::Unauthorized(
            "missing or invalid webhook secret".to_string(),
        ));
    }

    let Json(payload) = Json::<WebhookPayload>::from_bytes(&body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let change = payload.into_change()?;
    debug!(
        table = change.table.name(),
        kind = change.kind.label(),
        "webhook change accepted"
    );
    let delivered = context.feed.publish(change);
    Ok((StatusCode::ACCEPTED, Json(json!({ "delivered": delivered }))))
}
