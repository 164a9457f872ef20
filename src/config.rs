//! Defines structures and builders related to the OAuth2/OIDC client configuration.
//!
//! Provides a structured way to handle credentials, endpoints and scopes
//! required for the login flow and the Google API calls made afterwards.
//!
//! ## Structures
//! - `Config`: Stores all the necessary authentication information.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//!
//! # Example
//! ```rust,no_run
//! use google_oidc_demo::config::Config;
//!
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("http://localhost:8080/callback")
//!     .build()
//!     .expect("invalid config");
//! ```
//!
//! Every endpoint defaults to Google's production URL, so only the
//! credentials are mandatory.
use std::{path::Path, time::Duration};

use itertools::Itertools;
use tracing::error;

use crate::{csrf_token::CSRFToken, discovery::ProviderMetadata, error::Error};

pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const GOOGLE_TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";
pub const GOOGLE_DRIVE_FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";
pub const GOOGLE_JWKS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scopes requested at login.
pub const DEFAULT_SCOPES: [&str; 5] = [
    "openid",
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/userinfo.profile",
    "profile",
    "email",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AuthEndPoint(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientID(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientSecret(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TokenEndPoint(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RedirectURI(pub String);

/// Holds everything the login flow and the API proxies need.
///
/// It is immutable once constructed; the server shares it behind an `Arc`.
///
/// # Fields
/// - `auth_endpoint`: The authorization endpoint URL.
/// - `client_id`: The client ID obtained from Google Cloud Console.
/// - `client_secret`: The client secret linked to the client ID.
/// - `token_endpoint`: The token exchange endpoint URL.
/// - `redirect_uri`: The redirect URI registered in Google Cloud Console.
/// - `scopes`: Requested scopes, without duplicates, in insertion order.
/// - `state`: The anti-CSRF value round-tripped through the redirect.
/// - `userinfo_endpoint`, `tokeninfo_endpoint`, `files_endpoint`: Proxied Google APIs.
/// - `jwks_uri`, `issuers`, `verify_id_token`: ID token verification settings.
/// - `request_timeout`: Deadline applied to every outbound request.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) auth_endpoint: AuthEndPoint,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) token_endpoint: TokenEndPoint,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) scopes: Vec<String>,
    pub(crate) state: CSRFToken,
    pub(crate) userinfo_endpoint: String,
    pub(crate) tokeninfo_endpoint: String,
    pub(crate) files_endpoint: String,
    pub(crate) jwks_uri: String,
    pub(crate) issuers: Vec<String>,
    pub(crate) verify_id_token: bool,
    pub(crate) oidc_discovery: bool,
    pub(crate) request_timeout: Duration,
}

// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` instance to create a `Config` object.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reads the configuration from the process environment (and `.env`, if loaded).
    ///
    /// `CLIENT_ID` and `CLIENT_SECRET` are mandatory and must not be blank.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigBuilder::new()
            .client_id(&lookup("CLIENT_ID").unwrap_or_default())
            .client_secret(&lookup("CLIENT_SECRET").unwrap_or_default());

        if let Some(redirect_uri) = lookup("REDIRECT_URI") {
            builder = builder.redirect_uri(&redirect_uri);
        }
        if let Some(state) = lookup("OAUTH_STATE").filter(|v| !v.trim().is_empty()) {
            builder = builder.state(&state);
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                error!("Failed to parse REQUEST_TIMEOUT_SECS: {}", e);
                Error::MissingConfiguration("REQUEST_TIMEOUT_SECS".to_string())
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(flag) = lookup("VERIFY_ID_TOKEN") {
            builder = builder.verify_id_token(parse_flag("VERIFY_ID_TOKEN", &flag)?);
        }
        if let Some(flag) = lookup("OIDC_DISCOVERY") {
            builder = builder.oidc_discovery(parse_flag("OIDC_DISCOVERY", &flag)?);
        }
        builder.build()
    }

    /// Replaces the provider endpoints with the ones advertised by the discovery document.
    pub fn with_provider_metadata(mut self, metadata: &ProviderMetadata) -> Self {
        self.auth_endpoint = AuthEndPoint(metadata.authorization_endpoint.clone());
        self.token_endpoint = TokenEndPoint(metadata.token_endpoint.clone());
        if let Some(userinfo) = &metadata.userinfo_endpoint {
            self.userinfo_endpoint = userinfo.clone();
        }
        self.jwks_uri = metadata.jwks_uri.clone();
        if !self.issuers.contains(&metadata.issuer) {
            self.issuers.push(metadata.issuer.clone());
        }
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn state(&self) -> &CSRFToken {
        &self.state
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn verify_id_token(&self) -> bool {
        self.verify_id_token
    }

    pub fn oidc_discovery(&self) -> bool {
        self.oidc_discovery
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => {
            error!("Failed to parse {} as a flag: {:?}", key, value);
            Err(Error::MissingConfiguration(key.to_string()))
        }
    }
}

/// Provides a convenient way to create a `Config` instance step by step.
///
/// # Example
/// ```rust,no_run
/// use google_oidc_demo::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .client_id("your-client-id")
///     .client_secret("your-client-secret")
///     .scopes(["openid", "email"])
///     .state("fixed-state")
///     .build()
///     .expect("invalid config");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    client_secret: ClientSecret,
    token_endpoint: TokenEndPoint,
    redirect_uri: RedirectURI,
    scopes: Vec<String>,
    state: Option<CSRFToken>,
    userinfo_endpoint: String,
    tokeninfo_endpoint: String,
    files_endpoint: String,
    jwks_uri: String,
    issuers: Vec<String>,
    verify_id_token: bool,
    oidc_discovery: bool,
    request_timeout: Duration,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            auth_endpoint: AuthEndPoint(GOOGLE_AUTH_ENDPOINT.to_string()),
            client_id: ClientID(String::new()),
            client_secret: ClientSecret(String::new()),
            token_endpoint: TokenEndPoint(GOOGLE_TOKEN_ENDPOINT.to_string()),
            redirect_uri: RedirectURI(DEFAULT_REDIRECT_URI.to_string()),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            state: None,
            userinfo_endpoint: GOOGLE_USERINFO_ENDPOINT.to_string(),
            tokeninfo_endpoint: GOOGLE_TOKENINFO_ENDPOINT.to_string(),
            files_endpoint: GOOGLE_DRIVE_FILES_ENDPOINT.to_string(),
            jwks_uri: GOOGLE_JWKS_URI.to_string(),
            issuers: vec![
                GOOGLE_ISSUER.to_string(),
                "accounts.google.com".to_string(),
            ],
            verify_id_token: true,
            oidc_discovery: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with Google's endpoints.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Sets the authorization endpoint URL.
    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.auth_endpoint = AuthEndPoint(auth_endpoint.to_string());
        self
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.to_string());
        self
    }

    /// Sets the client secret associated with the client ID.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.to_string());
        self
    }

    /// Sets the token exchange endpoint URL.
    pub fn token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.token_endpoint = TokenEndPoint(token_endpoint.to_string());
        self
    }

    /// Sets the redirect URI registered in Google Cloud Console.
    pub fn redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = RedirectURI(redirect_uri.to_string());
        self
    }

    /// Replaces the requested scopes. Duplicates are dropped, first occurrence wins.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::<String>::into).unique().collect();
        self
    }

    /// Fixes the anti-CSRF state. When unset, `build` generates a random one.
    pub fn state(mut self, state: &str) -> Self {
        self.state = Some(CSRFToken(state.to_string()));
        self
    }

    pub fn userinfo_endpoint(mut self, endpoint: &str) -> Self {
        self.userinfo_endpoint = endpoint.to_string();
        self
    }

    pub fn tokeninfo_endpoint(mut self, endpoint: &str) -> Self {
        self.tokeninfo_endpoint = endpoint.to_string();
        self
    }

    pub fn files_endpoint(mut self, endpoint: &str) -> Self {
        self.files_endpoint = endpoint.to_string();
        self
    }

    pub fn jwks_uri(mut self, jwks_uri: &str) -> Self {
        self.jwks_uri = jwks_uri.to_string();
        self
    }

    /// Replaces the accepted `iss` values of ID tokens.
    pub fn issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Turns ID token verification on the callback on or off.
    pub fn verify_id_token(mut self, verify: bool) -> Self {
        self.verify_id_token = verify;
        self
    }

    /// Turns OIDC discovery at startup on or off.
    pub fn oidc_discovery(mut self, discovery: bool) -> Self {
        self.oidc_discovery = discovery;
        self
    }

    /// Sets the deadline for every outbound request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Constructs a `Config` instance with the provided values.
    ///
    /// Fails with `Error::MissingConfiguration` if the client id or secret is blank.
    pub fn build(self) -> Result<Config, Error> {
        if self.client_id.0.trim().is_empty() {
            error!("CLIENT_ID is mandatory");
            return Err(Error::MissingConfiguration("CLIENT_ID".to_string()));
        }
        if self.client_secret.0.trim().is_empty() {
            error!("CLIENT_SECRET is mandatory");
            return Err(Error::MissingConfiguration("CLIENT_SECRET".to_string()));
        }
        let state = match self.state {
            Some(state) => state,
            None => CSRFToken::new()?,
        };
        Ok(Config {
            auth_endpoint: self.auth_endpoint,
            client_id: self.client_id,
            client_secret: self.client_secret,
            token_endpoint: self.token_endpoint,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes,
            state,
            userinfo_endpoint: self.userinfo_endpoint,
            tokeninfo_endpoint: self.tokeninfo_endpoint,
            files_endpoint: self.files_endpoint,
            jwks_uri: self.jwks_uri,
            issuers: self.issuers,
            verify_id_token: self.verify_id_token,
            oidc_discovery: self.oidc_discovery,
            request_timeout: self.request_timeout,
        })
    }
}

/// Loads the `.env` file at `path` into the process environment.
///
/// Returns `Ok(false)` when there is no such file. A file that exists but
/// does not parse is an error.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => {
            error!("Failed to parse .env file: {}", e);
            Err(e)
        }
    }
}
