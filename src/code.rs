//! This module handles the front-channel half of the authorization code flow.
//!
//! It provides the following key functionalities:
//! - Generating the authorization request URL (`AuthorizationRequest`).
//! - Parsing and verifying the query Google sends back to the redirect URI
//!   (`UnCheckedCodeResponse`).
//!
//! # Flow
//! 1. `/login` builds an `AuthorizationRequest` carrying the configured `state`.
//! 2. The browser is redirected to Google's authentication page.
//! 3. Google redirects back with `state` and `code` (`UnCheckedCodeResponse`).
//! 4. `UnCheckedCodeResponse::exchange_with_code` checks `state`; only then a
//!    `Code` is handed out, which can be exchanged for tokens.
//!
//! # Notes
//! - Do not use `UnCheckedCodeResponse` directly without verification.
use itertools::Itertools;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    config::{AuthEndPoint, ClientID, Config, RedirectURI},
    csrf_token::{CSRFToken, UnCheckedCSRFToken},
    error::Error,
};

/// Represents the value of the `code` query parameter sent by Google.
///
/// A `Code` can only be obtained from `UnCheckedCodeResponse::exchange_with_code`,
/// i.e. after the `state` has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl Code {
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Generates the URL the browser is redirected to on `/login`.
///
/// # Example
/// ```rust,no_run
/// use google_oidc_demo::{code::AuthorizationRequest, config::Config};
///
/// let config = Config::builder()
///     .client_id("your_client_id")
///     .client_secret("your_client_secret")
///     .build()
///     .unwrap();
///
/// let url = AuthorizationRequest::new(&config, config.state()).into_url().unwrap();
/// println!("Auth URL: {}", url);
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    response_type: String,
    scope: Vec<String>,
    redirect_uri: RedirectURI,
    access_type: String,
    state: CSRFToken,
}

impl AuthorizationRequest {
    pub fn new(config: &Config, state: &CSRFToken) -> Self {
        Self {
            auth_endpoint: config.auth_endpoint.to_owned(),
            client_id: config.client_id.to_owned(),
            response_type: "code".to_string(),
            scope: config.scopes.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
            access_type: "online".to_string(),
            state: state.to_owned(),
        }
    }

    /// Constructs the URL with the required, percent-encoded parameters.
    pub fn into_url(&self) -> Result<String, Error> {
        let scope = self.scope.iter().join(" ");
        let url = url::Url::parse_with_params(
            &self.auth_endpoint.0,
            &[
                ("response_type", self.response_type.as_str()),
                ("client_id", self.client_id.0.as_str()),
                ("redirect_uri", self.redirect_uri.0.as_str()),
                ("scope", scope.as_str()),
                ("access_type", self.access_type.as_str()),
                ("state", self.state.value()),
            ],
        )
        .map_err(|e| {
            error!("Failed to parse authorization endpoint: {}", e);
            Error::URL
        })?;
        Ok(url.into())
    }
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

/// A response from Google containing an unverified `state` and authorization code.
/// Must be validated against the configured `CSRFToken` before use.
#[derive(Debug, Clone)]
pub struct UnCheckedCodeResponse {
    state: Option<UnCheckedCSRFToken>,
    code: Option<String>,
    error: Option<String>,
}

impl UnCheckedCodeResponse {
    pub fn from_query(query: CallbackQuery) -> Self {
        Self {
            state: query.state.map(Into::into),
            code: query.code,
            error: query.error,
        }
    }

    /// Checks `state` first; a mismatch never reaches the token endpoint.
    pub fn exchange_with_code(self, csrf_token: &CSRFToken) -> Result<Code, Error> {
        match &self.state {
            Some(state) if state.matches(csrf_token) => {}
            _ => {
                warn!("Rejected callback with invalid state");
                return Err(Error::InvalidState);
            }
        }
        if let Some(reason) = self.error {
            warn!("Provider returned an error on callback: {}", reason);
            return Err(Error::AuthorizationDenied(reason));
        }
        match self.code {
            Some(code) if !code.is_empty() => Ok(Code(code)),
            _ => Err(Error::MissingCode),
        }
    }
}
