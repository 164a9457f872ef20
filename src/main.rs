// In Google Cloud console
// Set
// - Redirect_url: http://localhost:8080/callback
// - Host: http://localhost:8080
// And then set a .env file (or plain environment variables)
// ```.env
// CLIENT_ID="your_client_id"
// CLIENT_SECRET="your_client_secret"
// ```
// finally ```cargo run```
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use google_oidc_demo::{
    config::{Config, GOOGLE_ISSUER, load_env_file},
    discovery::ProviderMetadata,
    executer::HttpExecuter,
    server::{AppState, router},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

static DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // A missing .env is fine, variables may come from the environment
    if !load_env_file(".env").context("Failed to load .env")? {
        info!("No .env file found, reading the environment only");
    }

    let config = Config::from_env().context("Failed to read configuration")?;
    let executer =
        HttpExecuter::new(config.request_timeout()).context("Failed to build http client")?;

    let config = if config.oidc_discovery() {
        let metadata = ProviderMetadata::discover(&executer, GOOGLE_ISSUER)
            .await
            .context("Failed to discover OIDC provider")?;
        config.with_provider_metadata(&metadata)
    } else {
        config
    };

    let addr: SocketAddr = dotenvy::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .context("Failed to parse BIND_ADDR")?;

    let app = router(Arc::new(AppState::new(config, executer)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind tcp listener")?;

    info!("server running at http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    anyhow::Ok(())
}
