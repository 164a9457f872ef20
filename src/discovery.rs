//! OpenID Connect discovery.
//!
//! At startup the server may read `<issuer>/.well-known/openid-configuration`
//! and take the endpoints from there instead of the built-in Google defaults.
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::Error,
    executer::{Executer, HttpExecuter},
};

/// The subset of the discovery document this server uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    issuer: String,
}

impl DiscoveryRequest {
    pub fn new(issuer: &str) -> Self {
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.issuer)
    }
}

impl ProviderMetadata {
    /// Fetches the discovery document and checks it was issued for `issuer`.
    pub async fn discover(executer: &HttpExecuter, issuer: &str) -> Result<Self, Error> {
        let req = DiscoveryRequest::new(issuer);
        let metadata = executer.execute(&req).await.map_err(|e| {
            error!("Failed to fetch discovery document: {}", e);
            Error::Discovery
        })?;
        if metadata.issuer.trim_end_matches('/') != req.issuer {
            error!(
                "Discovery issuer mismatch: expected {}, got {}",
                req.issuer, metadata.issuer
            );
            return Err(Error::Discovery);
        }
        info!("Discovered provider metadata for {}", metadata.issuer);
        Ok(metadata)
    }
}
