mod common;

use common::{
    STATE, TestApp, body_text, id_token_claims, jwks, session_cookie, sign_id_token,
    token_response,
};
use http::StatusCode;
use serde_json::Value;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mount_provider(server: &MockServer, id_token: Option<&str>, jwks_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("token-1", id_token)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
        .expect(jwks_calls)
        .mount(server)
        .await;
}

async fn callback(app: &TestApp) -> axum::response::Response {
    app.get(&format!("/callback?state={}&code=c0de", STATE), None)
        .await
}

#[tokio::test]
async fn verified_login_greets_user() {
    let server = MockServer::start().await;
    let id_token = sign_id_token(&id_token_claims());
    mount_provider(&server, Some(&id_token), 1).await;
    let app = TestApp::new(&server, true).await;

    let res = callback(&app).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_cookie(&res).is_some());

    let body = body_text(res).await;
    assert!(body.contains("Welcome back, Ada</p>"));
    assert!(body.contains("Your email is: ada*********@******"));
    assert_eq!(app.state.sessions().len().await, 1);
}

#[tokio::test]
async fn jwks_is_cached_between_logins() {
    let server = MockServer::start().await;
    let id_token = sign_id_token(&id_token_claims());
    mount_provider(&server, Some(&id_token), 1).await;
    let app = TestApp::new(&server, true).await;

    for _ in 0..3 {
        assert_eq!(callback(&app).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn wrong_audience_is_rejected() {
    let server = MockServer::start().await;
    let mut claims = id_token_claims();
    claims["aud"] = Value::from("someone-else.apps.googleusercontent.com");
    let id_token = sign_id_token(&claims);
    mount_provider(&server, Some(&id_token), 1).await;
    let app = TestApp::new(&server, true).await;

    let res = callback(&app).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.state.sessions().is_empty().await);
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let server = MockServer::start().await;
    let mut claims = id_token_claims();
    claims["iss"] = Value::from("https://evil.example.com");
    let id_token = sign_id_token(&claims);
    mount_provider(&server, Some(&id_token), 1).await;
    let app = TestApp::new(&server, true).await;

    assert_eq!(callback(&app).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.state.sessions().is_empty().await);
}

#[tokio::test]
async fn expired_id_token_is_rejected() {
    let server = MockServer::start().await;
    let mut claims = id_token_claims();
    claims["iat"] = Value::from(common::now() - 7200);
    claims["exp"] = Value::from(common::now() - 3600);
    let id_token = sign_id_token(&claims);
    mount_provider(&server, Some(&id_token), 1).await;
    let app = TestApp::new(&server, true).await;

    assert_eq!(callback(&app).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.state.sessions().is_empty().await);
}

#[tokio::test]
async fn tampered_id_token_is_rejected() {
    let server = MockServer::start().await;
    let id_token = sign_id_token(&id_token_claims());
    let mut parts: Vec<&str> = id_token.split('.').collect();
    let forged_payload = {
        use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
        let mut claims = id_token_claims();
        claims["sub"] = Value::from("attacker");
        BASE64_URL_SAFE_NO_PAD.encode(claims.to_string())
    };
    parts[1] = &forged_payload;
    let forged = parts.join(".");
    mount_provider(&server, Some(&forged), 1).await;
    let app = TestApp::new(&server, true).await;

    assert_eq!(callback(&app).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.state.sessions().is_empty().await);
}

#[tokio::test]
async fn missing_id_token_is_rejected() {
    let server = MockServer::start().await;
    mount_provider(&server, None, 0).await;
    let app = TestApp::new(&server, true).await;

    let res = callback(&app).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(res).await.contains("invalid id_token"));
    assert!(app.state.sessions().is_empty().await);
}
