//! In-memory session state.
//!
//! Each browser gets an opaque `SessionId` (UUIDv4, carried in a cookie) and
//! at most one `SessionToken`. The store is shared across request tasks;
//! the callback is the only writer.
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    id_token::IDTokenRaw,
    token::{AccessToken, TokenResponse},
};

pub static SESSION_COOKIE_KEY: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts only well-formed UUIDs so arbitrary cookie values never become keys.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(|id| Self(id.to_string()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// The token obtained by the most recent successful login of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionToken {
    pub access_token: AccessToken,
    pub token_type: String,
    pub id_token: Option<IDTokenRaw>,
    pub refresh_token: Option<String>,
    pub expiry: Option<SystemTime>,
}

impl SessionToken {
    pub fn from_response(res: &TokenResponse, now: SystemTime) -> Self {
        Self {
            access_token: res.access_token().clone(),
            token_type: res.token_type().to_string(),
            id_token: res.id_token().cloned(),
            refresh_token: res.refresh_token().map(str::to_string),
            expiry: res
                .expires_in()
                .and_then(|secs| now.checked_add(Duration::from_secs(secs))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionToken>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `token` for `id`, replacing any previous one.
    pub async fn store(&self, id: SessionId, token: SessionToken) {
        self.sessions.write().await.insert(id, token);
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionToken> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
