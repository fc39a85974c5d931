use crate::config::ConfigError;
use crate::directory::GateError;
use crate::drafts::DraftError;
use crate::export::ExportError;
use crate::forms::{SubmissionError, ValidationErrors};
use crate::remote::{FeedError, RemoteError};
use crate::review::ReviewError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Remote(RemoteError),
    Validation(ValidationErrors),
    Submission(SubmissionError),
    Review(ReviewError),
    Gate(GateError),
    Draft(DraftError),
    Export(ExportError),
    Feed(FeedError),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Remote(err) => write!(f, "remote error: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::Submission(err) => write!(f, "{}", err),
            AppError::Review(err) => write!(f, "{}", err),
            AppError::Gate(err) => write!(f, "{}", err),
            AppError::Draft(err) => write!(f, "{}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Feed(err) => write!(f, "realtime payload rejected: {}", err),
            AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message)
            | AppError::BadRequest(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Remote(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Submission(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::Gate(err) => Some(err),
            AppError::Draft(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Feed(err) => Some(err),
            AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::NotFound(_)
            | AppError::BadRequest(_) => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Submission(SubmissionError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Remote(err)
            | AppError::Submission(SubmissionError::Remote(err))
            | AppError::Review(ReviewError::Remote(err))
            | AppError::Gate(GateError::Remote(err)) => remote_status(err),
            AppError::Review(ReviewError::UnknownRecord { .. }) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Review(ReviewError::Transition(_)) => StatusCode::CONFLICT,
            AppError::Gate(GateError::Denied) | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Gate(GateError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Draft(DraftError::InvalidId) | AppError::Feed(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Submission(SubmissionError::Encode(_))
            | AppError::Gate(GateError::InvalidHash(_))
            | AppError::Draft(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn remote_status(err: &RemoteError) -> StatusCode {
    match err {
        RemoteError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let fields = match &self {
            AppError::Validation(errors)
            | AppError::Submission(SubmissionError::Validation(errors)) => Some(errors.clone()),
            _ => None,
        };

        let body = match fields {
            Some(fields) => json!({ "error": self.to_string(), "fields": fields }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RemoteError> for AppError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<SubmissionError> for AppError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

impl From<ReviewError> for AppError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<GateError> for AppError {
    fn from(value: GateError) -> Self {
        Self::Gate(value)
    }
}

impl From<DraftError> for AppError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<FeedError> for AppError {
    fn from(value: FeedError) -> Self {
        Self::Feed(value)
    }
}
