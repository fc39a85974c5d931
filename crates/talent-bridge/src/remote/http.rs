use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::query::SelectQuery;
use super::{AuthUser, RemoteDataService, RemoteError, StoredObject};
use crate::config::RemoteConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Client for the hosted service's REST, storage and auth endpoints.
#[derive(Clone)]
pub struct RestDataService {
    client: Client,
    base_url: String,
    api_key: String,
    service_key: Option<String>,
}

impl std::fmt::Debug for RestDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDataService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestDataService {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        service_key: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_key,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| RemoteError::Unavailable("no remote URL configured".to_string()))?;
        Self::new(url, config.anon_key.clone(), config.service_key.clone())
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the project key and the strongest bearer we hold.
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self.service_key.as_deref().unwrap_or(&self.api_key);
        builder
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

/// Convert non-success replies into [`RemoteError`].
pub(crate) async fn check_response(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized);
    }
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(response.text().await.unwrap_or_default()),
    })
}

/// Error bodies are JSON with a `message` (REST) or `error_description` (auth) field.
fn error_message(body: String) -> String {
    let parsed: Option<Value> = serde_json::from_str(&body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["message", "error_description", "error", "msg"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or(body)
}

async fn read_json(response: Response) -> Result<Value, RemoteError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

fn first_row(value: Value) -> Result<Value, RemoteError> {
    match value {
        Value::Array(rows) => rows.into_iter().next().ok_or(RemoteError::NotFound),
        Value::Null => Err(RemoteError::NotFound),
        row => Ok(row),
    }
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
    #[serde(default)]
    app_metadata: Value,
}

#[async_trait]
impl RemoteDataService for RestDataService {
    async fn select(&self, source: &str, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        let mut request = self
            .authorized(self.client.get(self.endpoint(&format!("rest/v1/{source}"))))
            .query(&query.to_params());
        if let Some(range) = query.range_header() {
            request = request.header("Range", range);
        }

        let response = check_response(request.send().await?).await?;
        match read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(RemoteError::Decode(format!(
                "expected a list of rows from {source}, got {other}"
            ))),
        }
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        let request = self
            .authorized(self.client.post(self.endpoint(&format!("rest/v1/{table}"))))
            .headers(Self::representation_headers())
            .json(&row);
        let response = check_response(request.send().await?).await?;
        first_row(read_json(response).await?)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, RemoteError> {
        let request = self
            .authorized(self.client.patch(self.endpoint(&format!("rest/v1/{table}"))))
            .query(&[("id", format!("eq.{id}"))])
            .headers(Self::representation_headers())
            .json(&patch);
        let response = check_response(request.send().await?).await?;
        first_row(read_json(response).await?)
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, RemoteError> {
        let request = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("rest/v1/rpc/{function}"))),
            )
            .json(&args);
        let response = check_response(request.send().await?).await?;
        read_json(response).await
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, RemoteError> {
        let request = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("storage/v1/object/{bucket}/{path}"))),
            )
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        check_response(request.send().await?).await?;
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
        let request = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("storage/v1/object/sign/{bucket}/{path}"))),
            )
            .json(&json!({ "expiresIn": expires_in.as_secs() }));
        let response = check_response(request.send().await?).await?;
        let signed: SignedUrlResponse = serde_json::from_value(read_json(response).await?)?;
        Ok(self.endpoint(&format!(
            "storage/v1/{}",
            signed.signed_url.trim_start_matches('/')
        )))
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, RemoteError> {
        let request = self
            .client
            .get(self.endpoint("auth/v1/user"))
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, format!("Bearer {access_token}"));
        let response = check_response(request.send().await?).await?;
        let user: UserResponse = serde_json::from_value(read_json(response).await?)?;
        let role = user
            .app_metadata
            .get("role")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role,
        })
    }
}
