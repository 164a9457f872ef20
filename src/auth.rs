//! The login flow: authorization redirect and callback handling.
//!
//! The callback is the only place that writes session state, and it does so
//! last: state check, code exchange and ID token verification all have to
//! succeed before the token replaces whatever the session held.
use std::{sync::Arc, time::SystemTime};

use tracing::{error, info, warn};

use crate::{
    code::{AuthorizationRequest, CallbackQuery, UnCheckedCodeResponse},
    config::Config,
    error::Error,
    executer::{Executer, HttpExecuter},
    id_token::{IdTokenVerifier, IdentityClaims},
    session::{SessionId, SessionStore, SessionToken},
    token::TokenRequest,
};

#[derive(Debug, Clone)]
pub struct LoginService {
    config: Arc<Config>,
    executer: HttpExecuter,
    verifier: Option<Arc<IdTokenVerifier>>,
    sessions: SessionStore,
}

impl LoginService {
    pub fn new(config: Arc<Config>, executer: HttpExecuter, sessions: SessionStore) -> Self {
        let verifier = config
            .verify_id_token()
            .then(|| Arc::new(IdTokenVerifier::new(&config)));
        Self {
            config,
            executer,
            verifier,
            sessions,
        }
    }

    /// URL of the provider's consent page, carrying the configured `state`.
    pub fn authorization_url(&self) -> Result<String, Error> {
        AuthorizationRequest::new(&self.config, self.config.state()).into_url()
    }

    /// Validates the callback, exchanges the code and stores the token for `session`.
    ///
    /// Returns the verified identity when ID token verification is enabled.
    pub async fn callback(
        &self,
        session: SessionId,
        query: CallbackQuery,
    ) -> Result<Option<IdentityClaims>, Error> {
        let code = UnCheckedCodeResponse::from_query(query).exchange_with_code(self.config.state())?;

        let res = self
            .executer
            .execute(&TokenRequest::new(&self.config, code))
            .await
            .map_err(|e| {
                error!("error when trying to exchange code for token: {}", e);
                Error::TokenExchangeFailed
            })?;

        let claims = match &self.verifier {
            Some(verifier) => {
                let raw = res.id_token().ok_or_else(|| {
                    warn!("id_token not found in token response");
                    Error::InvalidIdToken
                })?;
                Some(verifier.verify(&self.executer, raw).await?)
            }
            None => None,
        };

        self.sessions
            .store(session, SessionToken::from_response(&res, SystemTime::now()))
            .await;
        info!(
            "Login completed for {}",
            claims.as_ref().map_or("unverified user", |c| c.subject.as_str())
        );
        Ok(claims)
    }
}
