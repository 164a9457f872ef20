#![allow(dead_code)]

use std::{
    io,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    response::Response,
};
use google_oidc_demo::{
    config::ConfigBuilder,
    executer::HttpExecuter,
    server::{AppState, router},
};
use http::{
    Request,
    header::{COOKIE, SET_COOKIE},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "test-client.apps.googleusercontent.com";
pub const STATE: &str = "random-state";
pub const ISSUER: &str = "https://accounts.google.com";
pub const KID: &str = "test-key";

const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/id_token_key.pem");
const MODULUS: &str = "znGbxBhzLyQJE5NWA3f9qtHZ6zftSg859ek4gRUlQCf1dmxvYfoDH_WvEvcT5ZKfRS1ZicF9gyz4-6u1NOkznVJlwucrHyR874v73t_iUcT9voLDQhiwzbr2unufaeqz9zbXAODWn7-7FiwAOvgl029xHx0NmmkK9m9jIeh1pzsT3CTaU22ZbCxFwcT0k3WxjP09NEC9FJBs2hSahxClwV2wGSpBVMcDgJjJIue0xyki667nIe1-REkeaX0gMpRTdDgoAY0a5pmH0Id2fjC2iXVdMQX4faFOlp0BdR8P3ivnCuBzBn1ZBUxXDjo72Ips-7AtJQl5IKYMsx85h5lcTw";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub async fn new(server: &MockServer, verify_id_token: bool) -> Self {
        Self::with_timeout(server, verify_id_token, Duration::from_secs(5)).await
    }

    pub async fn with_timeout(
        server: &MockServer,
        verify_id_token: bool,
        timeout: Duration,
    ) -> Self {
        let uri = server.uri();
        let config = ConfigBuilder::new()
            .client_id(CLIENT_ID)
            .client_secret("test-secret")
            .auth_endpoint(&format!("{}/auth", uri))
            .token_endpoint(&format!("{}/token", uri))
            .redirect_uri("http://localhost:8080/callback")
            .userinfo_endpoint(&format!("{}/userinfo", uri))
            .tokeninfo_endpoint(&format!("{}/tokeninfo", uri))
            .files_endpoint(&format!("{}/drive/v3/files", uri))
            .jwks_uri(&format!("{}/certs", uri))
            .issuers([ISSUER])
            .state(STATE)
            .verify_id_token(verify_id_token)
            .oidc_discovery(false)
            .request_timeout(timeout)
            .build()
            .unwrap();
        let executer = HttpExecuter::new(timeout).unwrap();
        let state = Arc::new(AppState::new(config, executer));
        Self {
            router: router(state.clone()),
            state,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

pub async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Returns the `session=<id>` pair of a Set-Cookie header.
pub fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn token_response(access_token: &str, id_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "expires_in": 3599,
        "scope": "openid email profile",
        "token_type": "Bearer"
    });
    if let Some(id_token) = id_token {
        body["id_token"] = json!(id_token);
    }
    body
}

pub fn jwks() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": KID,
            "n": MODULUS,
            "e": "AQAB"
        }]
    })
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Claims of a valid Google ID token for `CLIENT_ID`.
pub fn id_token_claims() -> Value {
    json!({
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "sub": "110169484474386276334",
        "email": "ada@example.com",
        "email_verified": true,
        "name": "Ada Lovelace",
        "iat": now(),
        "exp": now() + 3600
    })
}

pub fn sign_id_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// In-memory sink for the crate's log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records every event of this crate on the current thread until the guard drops.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("google_oidc_demo=trace"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
