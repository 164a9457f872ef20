//! Provides verification of the ID token returned by the token endpoint.
//!
//! This module:
//! IDTokenRaw: The encoded ID token as received, before verification.
//! IdentityClaims: The few claims the greeting page needs.
//! IdTokenVerifier: Checks signature (against the provider JWKS), audience,
//! issuer and expiry, caching the key set between logins.

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    jwk::{Jwk, JwkSet},
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::{
    config::Config,
    error::Error,
    executer::{Executer, HttpExecuter},
};

/// Represents an encoded ID token, which must be verified before use.
#[derive(Clone, PartialEq, Deserialize)]
pub struct IDTokenRaw(pub(crate) String);

impl IDTokenRaw {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IDTokenRaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IDTokenRaw(..)")
    }
}

/// Identity decoded from a verified ID token. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

impl From<Claims> for IdentityClaims {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// A request for the provider's JSON Web Key Set.
#[derive(Debug, Clone)]
pub struct JwksRequest {
    jwks_uri: String,
}

impl JwksRequest {
    pub fn new(jwks_uri: &str) -> Self {
        Self {
            jwks_uri: jwks_uri.to_string(),
        }
    }

    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }
}

#[derive(Debug)]
pub struct IdTokenVerifier {
    client_id: String,
    issuers: Vec<String>,
    jwks_request: JwksRequest,
    keys: RwLock<Option<JwkSet>>,
}

impl IdTokenVerifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.client_id.0.clone(),
            issuers: config.issuers.clone(),
            jwks_request: JwksRequest::new(&config.jwks_uri),
            keys: RwLock::new(None),
        }
    }

    /// Verifies `raw` and returns its identity claims.
    ///
    /// Any failure, including an unreachable JWKS endpoint, is `Error::InvalidIdToken`.
    pub async fn verify(
        &self,
        executer: &HttpExecuter,
        raw: &IDTokenRaw,
    ) -> Result<IdentityClaims, Error> {
        let header = decode_header(raw.value()).map_err(|e| {
            error!("Failed to decode id_token header: {}", e);
            Error::InvalidIdToken
        })?;
        let kid = header.kid.ok_or_else(|| {
            warn!("id_token header carries no kid");
            Error::InvalidIdToken
        })?;
        let jwk = self.find_key(executer, &kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            error!("Unusable JWK {}: {}", kid, e);
            Error::InvalidIdToken
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(self.issuers.as_slice());

        let data = decode::<Claims>(raw.value(), &key, &validation).map_err(|e| {
            warn!("id_token rejected: {}", e);
            Error::InvalidIdToken
        })?;
        Ok(data.claims.into())
    }

    // Google rotates keys, so an unknown kid triggers one refetch.
    async fn find_key(&self, executer: &HttpExecuter, kid: &str) -> Result<Jwk, Error> {
        if let Some(jwk) = self
            .keys
            .read()
            .await
            .as_ref()
            .and_then(|set| set.find(kid))
        {
            return Ok(jwk.clone());
        }

        let fetched = executer.execute(&self.jwks_request).await.map_err(|e| {
            error!("Failed to fetch JWKS: {}", e);
            Error::InvalidIdToken
        })?;
        let jwk = fetched.find(kid).cloned();
        *self.keys.write().await = Some(fetched);
        jwk.ok_or_else(|| {
            warn!("No JWK matches kid {}", kid);
            Error::InvalidIdToken
        })
    }
}
