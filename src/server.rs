//! HTTP surface of the demo.
//!
//! Routing
//! - "/" landing page with a login link
//! - "/login" redirects to Google's consent page
//! - "/callback" is the redirect URI registered in Google Cloud Console
//! - "/profile", "/token", "/files" proxy Google APIs for the current session
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use http::{StatusCode, header::LOCATION};

use crate::{
    auth::LoginService,
    code::CallbackQuery,
    config::Config,
    error::Error,
    executer::HttpExecuter,
    pages,
    proxy::{self, ProxyService},
    session::{SESSION_COOKIE_KEY, SessionId, SessionStore, SessionToken},
};

/// Application state shared by all handlers.
#[derive(Debug)]
pub struct AppState {
    login: LoginService,
    proxy: ProxyService,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, executer: HttpExecuter) -> Self {
        let config = Arc::new(config);
        let sessions = SessionStore::new();
        Self {
            login: LoginService::new(config.clone(), executer.clone(), sessions.clone()),
            proxy: ProxyService::new(config, executer),
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn session_token(&self, jar: &CookieJar) -> Result<SessionToken, Error> {
        let Some(id) = jar
            .get(SESSION_COOKIE_KEY)
            .and_then(|cookie| SessionId::parse(cookie.value()))
        else {
            return Err(Error::Unauthenticated);
        };
        self.sessions.get(&id).await.ok_or(Error::Unauthenticated)
    }
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/profile", get(profile))
        .route("/token", get(token_info))
        .route("/files", get(files))
        .with_state(app_state)
}

// Reuses the browser's session id, or mints one and sets the cookie.
fn session_from_jar(jar: CookieJar) -> (CookieJar, SessionId) {
    if let Some(id) = jar
        .get(SESSION_COOKIE_KEY)
        .and_then(|cookie| SessionId::parse(cookie.value()))
    {
        return (jar, id);
    }
    let id = SessionId::new();
    let cookie = Cookie::build((SESSION_COOKIE_KEY, id.value().to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");
    (jar.add(cookie), id)
}

async fn index() -> Html<&'static str> {
    Html(pages::LANDING)
}

async fn login(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, Error> {
    let url = app_state.login.authorization_url()?;
    let (jar, _) = session_from_jar(jar);
    Ok((StatusCode::FOUND, jar, [(LOCATION, url)]))
}

async fn callback(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, Error> {
    let (jar, session) = session_from_jar(jar);
    let claims = app_state.login.callback(session, query).await?;
    Ok((jar, Html(pages::greeting(claims.as_ref()))))
}

async fn profile(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<String, Error> {
    let token = app_state.session_token(&jar).await?;
    let profile = app_state.proxy.profile(&token.access_token).await?;
    Ok(proxy::render_profile(&profile))
}

async fn token_info(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<String, Error> {
    let token = app_state.session_token(&jar).await?;
    let info = app_state.proxy.token_info(&token.access_token).await?;
    Ok(proxy::render_token_info(&info))
}

async fn files(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<String, Error> {
    let token = app_state.session_token(&jar).await?;
    let files = app_state.proxy.files(&token.access_token).await?;
    Ok(proxy::render_files(&files))
}
