//! Demo server for Google's OpenID Connect.
//!
//! Logs a browser in with the authorization code flow, keeps the resulting
//! access token in an in-memory session and proxies three read-only Google
//! API calls with it.
//! [google document](https://developers.google.com/identity/openid-connect/openid-connect)
//! # Feature
//! - Build the authorization request URL with an anti-CSRF `state`
//! - Verify `state` on the callback and exchange the code for tokens (using reqwest)
//! - Verify the `id_token` against Google's JWKS (using jsonwebtoken)
//! - Per-browser sessions keyed by an opaque cookie
//! - Proxy userinfo, tokeninfo and Drive `files.list`, passing upstream errors through
//! # Caution
//! - This is a diagnostic tool. Upstream error bodies are shown verbatim and
//!   sessions live in memory only.
pub mod auth;
pub mod code;
pub mod config;
pub mod csrf_token;
pub mod discovery;
pub mod error;
pub mod executer;
pub mod id_token;
pub mod pages;
pub mod proxy;
pub mod server;
pub mod session;
pub mod token;
