//! Provides an asynchronous execution framework for sending HTTP requests to Google.
//!
//! This module:
//! - Defines the Executer trait, which provides a unified interface for making HTTP requests.
//! - Implements `HttpExecuter` for token exchange, API calls, JWKS and discovery requests.
//!
//! Every request goes through one shared `reqwest::Client` built with a
//! deadline, so a stalled upstream fails the request instead of the worker.
//! Dropping the returned future (e.g. when the inbound connection goes away)
//! cancels the outbound request.

use std::{collections::HashMap, error::Error, pin::Pin, time::Duration};

use jsonwebtoken::jwk::JwkSet;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use crate::{
    discovery::{DiscoveryRequest, ProviderMetadata},
    id_token::JwksRequest,
    proxy::{ApiRequest, ApiResponse},
    token::{TokenRequest, TokenResponse},
};

/// generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error("Failed to build http client")]
    Build,
    #[error("Failed to parse data")]
    Parse,
    #[error("Failed to send request")]
    Send,
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse url")]
    URL,
}

impl From<reqwest::Error> for ExecuteError {
    fn from(e: reqwest::Error) -> Self {
        // urls may carry an access token in the query
        let e = e.without_url();
        if e.is_timeout() {
            error!("Request timed out: {:?}", e);
            ExecuteError::Timeout
        } else {
            error!("Failed to send request: {:?}", e);
            ExecuteError::Send
        }
    }
}

type ExecuteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ExecuteError>> + Send + 'a>>;

/// Sends requests through a shared `reqwest::Client` with a per-request deadline.
#[derive(Debug, Clone)]
pub struct HttpExecuter {
    client: Client,
}

impl HttpExecuter {
    pub fn new(timeout: Duration) -> Result<Self, ExecuteError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!("Failed to build http client: {:?}", e);
            ExecuteError::Build
        })?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ExecuteError> {
        let url = parse_url(endpoint)?;
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await?;
            error!("Unexpected status {} from {}: {}", status, endpoint, body);
            return Err(ExecuteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        res.json::<T>().await.map_err(|e| {
            error!("Failed to parse JSON: {:?}", e.without_url());
            ExecuteError::Parse
        })
    }
}

fn parse_url(endpoint: &str) -> Result<Url, ExecuteError> {
    Url::parse(endpoint).map_err(|e| {
        error!("Failed to parse url: {:?}", e);
        ExecuteError::URL
    })
}

/// Request Workflow
/// 1. Parse the token endpoint URL.
/// 2. Prepare the form parameters.
/// 3. Send an HTTP POST request.
/// 4. Reject non-2xx answers, parse the rest as TokenResponse.
impl<'a> Executer<'a, TokenRequest> for HttpExecuter {
    type Response = TokenResponse;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, Self::Response>;

    fn execute(&'a self, req: &'a TokenRequest) -> Self::Future {
        Box::pin(async move {
            let url = parse_url(req.token_endpoint())?;

            let mut params = HashMap::new();
            params.insert("code", req.code());
            params.insert("client_id", req.client_id());
            params.insert("client_secret", req.client_secret());
            params.insert("redirect_uri", req.redirect_uri());
            params.insert("grant_type", req.grant_type());

            let res = self.client.post(url).form(&params).send().await?;
            let status = res.status();
            if !status.is_success() {
                let body = res.text().await?;
                error!("Token endpoint answered {}: {}", status, body);
                return Err(ExecuteError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let res_json = res.json::<TokenResponse>().await.map_err(|e| {
                error!("Failed to parse JSON: {:?}", e.without_url());
                ExecuteError::Parse
            })?;
            Ok(res_json)
        })
    }
}

/// Request Workflow
/// 1. Parse the API URL and append query parameters.
/// 2. Send an HTTP GET request with the bearer token.
/// 3. Return status and body as-is; the caller decides what a failure means.
impl<'a> Executer<'a, ApiRequest> for HttpExecuter {
    type Response = ApiResponse;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, Self::Response>;

    fn execute(&'a self, req: &'a ApiRequest) -> Self::Future {
        Box::pin(async move {
            let mut url = parse_url(req.endpoint())?;
            if !req.query().is_empty() {
                url.query_pairs_mut().extend_pairs(req.query());
            }

            let res = self
                .client
                .get(url)
                .bearer_auth(req.access_token().value())
                .send()
                .await?;
            let status = res.status();
            let body = res.text().await?;
            Ok(ApiResponse::new(status, body))
        })
    }
}

/// Fetches the provider's JSON Web Key Set.
impl<'a> Executer<'a, JwksRequest> for HttpExecuter {
    type Response = JwkSet;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, Self::Response>;

    fn execute(&'a self, req: &'a JwksRequest) -> Self::Future {
        Box::pin(async move { self.get_json::<JwkSet>(req.jwks_uri()).await })
    }
}

/// Fetches the OpenID Connect discovery document.
impl<'a> Executer<'a, DiscoveryRequest> for HttpExecuter {
    type Response = ProviderMetadata;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, Self::Response>;

    fn execute(&'a self, req: &'a DiscoveryRequest) -> Self::Future {
        Box::pin(async move { self.get_json::<ProviderMetadata>(&req.url()).await })
    }
}
