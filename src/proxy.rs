//! Authenticated read-only calls to Google APIs on behalf of a session.
//!
//! Every call follows the same path: attach the bearer token, send one GET
//! (no retry), pass non-2xx answers through verbatim, decode 2xx bodies into
//! the endpoint's shape and render them as text.
use std::sync::Arc;

use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::{
    config::Config,
    error::Error,
    executer::{Executer, HttpExecuter},
    token::AccessToken,
};

/// A bearer-authenticated GET against a Google API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    endpoint: String,
    access_token: AccessToken,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(endpoint: &str, access_token: &AccessToken) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            access_token: access_token.clone(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

/// Status and raw body of an upstream answer.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the body of a 2xx answer, or the answer itself as `Error::UpstreamError`.
    pub fn into_success_body(self) -> Result<String, Error> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            warn!("Google api answered {}", self.status);
            Err(Error::UpstreamError {
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// User fields returned by the userinfo endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveFile {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct ProxyService {
    config: Arc<Config>,
    executer: HttpExecuter,
}

impl ProxyService {
    pub fn new(config: Arc<Config>, executer: HttpExecuter) -> Self {
        Self { config, executer }
    }

    pub async fn profile(&self, token: &AccessToken) -> Result<UserProfile, Error> {
        let req = ApiRequest::new(&self.config.userinfo_endpoint, token);
        let body = self.send(&req).await?;
        serde_json::from_str::<UserProfile>(&body).map_err(|e| {
            error!("Failed to decode profile: {}", e);
            Error::UnexpectedUpstreamShape
        })
    }

    pub async fn token_info(&self, token: &AccessToken) -> Result<Value, Error> {
        let req = ApiRequest::new(&self.config.tokeninfo_endpoint, token)
            .with_query("access_token", token.value_as_str());
        let body = self.send(&req).await?;
        serde_json::from_str::<Value>(&body).map_err(|e| {
            error!("Failed to decode token info: {}", e);
            Error::UnexpectedUpstreamShape
        })
    }

    pub async fn files(&self, token: &AccessToken) -> Result<Vec<DriveFile>, Error> {
        let req = ApiRequest::new(&self.config.files_endpoint, token);
        let body = self.send(&req).await?;
        parse_files(&body)
    }

    async fn send(&self, req: &ApiRequest) -> Result<String, Error> {
        let res = self.executer.execute(req).await.map_err(|e| {
            error!("Failed to reach {}: {}", req.endpoint(), e);
            Error::UpstreamUnreachable
        })?;
        res.into_success_body()
    }
}

/// Extracts `{name, id}` pairs from a Drive `files.list` body, keeping upstream order.
pub fn parse_files(body: &str) -> Result<Vec<DriveFile>, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("Failed to decode file list: {}", e);
        Error::UnexpectedUpstreamShape
    })?;
    let Some(files) = value.get("files").and_then(Value::as_array) else {
        error!("'files' property is missing or not an array");
        return Err(Error::UnexpectedUpstreamShape);
    };
    files
        .iter()
        .map(|file| {
            let Some(info) = file.as_object() else {
                error!("file entry is not an object");
                return Err(Error::UnexpectedUpstreamShape);
            };
            Ok(DriveFile {
                name: field_text(info.get("name")),
                id: field_text(info.get("id")),
            })
        })
        .collect()
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub fn render_profile(profile: &UserProfile) -> String {
    format!(
        "user's info\nName: {}\nEmail: {}\nPicture: {}\n",
        profile.name.as_deref().unwrap_or_default(),
        profile.email.as_deref().unwrap_or_default(),
        profile.picture.as_deref().unwrap_or_default(),
    )
}

pub fn render_token_info(info: &Value) -> String {
    format!("token info: {}\n", info)
}

pub fn render_files(files: &[DriveFile]) -> String {
    files
        .iter()
        .map(|f| format!("name: {} id: {}\n", f.name, f.id))
        .collect()
}
