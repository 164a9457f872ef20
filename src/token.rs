//! Provides the back-channel half of the authorization code flow.
//!
//! This module:
//! - TokenRequest: A data structure for sending requests to the token endpoint.
//! - TokenResponse: A data structure for parsing the response from the token endpoint.
//! - AccessToken: A structure representing an access token used to call Google APIs.

use serde::{Deserialize, Serialize};

use crate::{
    code::Code,
    config::{ClientID, ClientSecret, Config, RedirectURI, TokenEndPoint},
    id_token::IDTokenRaw,
};

/// Represents an OAuth 2.0 access token.
/// This token is used to access Google APIs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Retrieves the access token as a string.
    pub fn value(&self) -> String {
        self.0.clone()
    }

    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

// Keeps tokens out of logs.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// A structure used to exchange a verified `Code` at the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    token_endpoint: TokenEndPoint,
    code: Code,
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: RedirectURI,
    grant_type: String,
}

impl TokenRequest {
    /// Creates a new request using parameters from Config.
    pub fn new(config: &Config, code: Code) -> Self {
        Self {
            token_endpoint: config.token_endpoint.to_owned(),
            code,
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
            grant_type: "authorization_code".to_string(),
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint.0
    }

    pub fn code(&self) -> &str {
        &self.code.0
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }
}

/// Represents the response from the token endpoint.
///
/// Only `access_token` is guaranteed; Google adds `id_token` whenever the
/// `openid` scope was requested.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    access_token: AccessToken,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<u64>,
    id_token: Option<IDTokenRaw>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn id_token(&self) -> Option<&IDTokenRaw> {
        self.id_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}
