use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};

use crate::{
    config::AuthSettings,
    error::{Result, TriviaError},
    http::HttpClient,
    management::store::{
        CredentialStore, KEY_ACCESS_TOKEN, KEY_CODE_VERIFIER, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN,
    },
    spotify::auth::{
        InteractiveAuthorizer, authorization_request, exchange_code_pkce, refresh_token,
    },
    types::{AuthState, Credential},
    utils, warning,
};

#[derive(Default)]
struct Session {
    credential: Option<Credential>,
    restored: bool,
    /// Why the latest interactive login failed, until one succeeds.
    login_failure: Option<String>,
}

/// Owns the OAuth credential: PKCE login, persistence, and refresh before expiry.
///
/// The session sits behind a single async mutex that is held for the whole
/// check → refresh → login sequence, so concurrent callers share one in-flight
/// refresh or login and then observe its result. That includes a failed login:
/// callers that queued behind it get its error instead of a second prompt.
pub struct TokenManager {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn CredentialStore>,
    authorizer: Arc<dyn InteractiveAuthorizer>,
    settings: AuthSettings,
    session: Mutex<Session>,
    /// Interactive logins finished so far, successful or not.
    logins: AtomicU64,
    state: watch::Sender<AuthState>,
}

impl TokenManager {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
        authorizer: Arc<dyn InteractiveAuthorizer>,
        settings: AuthSettings,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        TokenManager {
            http,
            store,
            authorizer,
            settings,
            session: Mutex::new(Session::default()),
            logins: AtomicU64::new(0),
            state,
        }
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub async fn current_credential(&self) -> Option<Credential> {
        self.session.lock().await.credential.clone()
    }

    /// Loads the persisted credential, refreshing it right away if it expired.
    pub async fn restore(&self) -> Result<AuthState> {
        let mut session = self.session.lock().await;
        self.restore_locked(&mut session).await?;
        Ok(self.state())
    }

    /// Returns a usable credential, refreshing or logging in as needed.
    ///
    /// A refresh failure purges the stored credential and falls through to one
    /// interactive login. Failures of that login are terminal for this call.
    pub async fn ensure_valid_credential(&self) -> Result<Credential> {
        let logins_seen = self.logins.load(Ordering::SeqCst);
        let mut session = self.session.lock().await;
        if let Some(e) = self.login_failed_since(&session, logins_seen) {
            return Err(e);
        }
        self.ensure_locked(&mut session).await
    }

    /// Runs the interactive PKCE login unconditionally.
    pub async fn authenticate(&self) -> Result<Credential> {
        let mut session = self.session.lock().await;
        session.restored = true;
        self.authenticate_locked(&mut session).await
    }

    pub async fn refresh_access_token(&self) -> Result<Credential> {
        let mut session = self.session.lock().await;
        if !session.restored {
            self.restore_locked(&mut session).await?;
        }
        if let Some(credential) = session.credential.as_ref().filter(|c| c.is_usable()) {
            if credential.refresh_token.is_none() {
                return Ok(credential.clone());
            }
        }
        self.refresh_locked(&mut session).await
    }

    /// Called when the catalog answered `401` for `rejected_access_token`.
    ///
    /// If another caller already replaced that token the fresh one is returned
    /// as is, and if another caller already failed to replace it that failure
    /// is returned. Otherwise the token is treated as expired and the usual
    /// refresh then login sequence runs.
    pub async fn reauthorize_after_rejection(
        &self,
        rejected_access_token: &str,
    ) -> Result<Credential> {
        let logins_seen = self.logins.load(Ordering::SeqCst);
        let mut session = self.session.lock().await;
        if let Some(e) = self.login_failed_since(&session, logins_seen) {
            return Err(e);
        }

        let holds_rejected = session
            .credential
            .as_ref()
            .is_some_and(|c| c.access_token == rejected_access_token);
        if !holds_rejected {
            if let Some(credential) = session.credential.as_ref().filter(|c| c.is_usable()) {
                return Ok(credential.clone());
            }
            if let Some(reason) = session.login_failure.as_deref() {
                return Err(login_failed(reason));
            }
        }

        if let Some(credential) = session.credential.as_mut() {
            credential.expires_at = DateTime::<Utc>::UNIX_EPOCH;
        }
        self.ensure_locked(&mut session).await
    }

    /// Forgets the credential in memory and in the store.
    pub async fn logout(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.credential = None;
        session.restored = true;
        self.set_state(AuthState::Unauthenticated);
        self.purge().await
    }

    async fn restore_locked(&self, session: &mut Session) -> Result<()> {
        session.restored = true;

        let Some(credential) = self.load_persisted().await? else {
            self.set_state(AuthState::Unauthenticated);
            return Ok(());
        };

        let usable = credential.is_usable();
        let refreshable = credential.refresh_token.is_some();
        session.credential = Some(credential);

        if usable {
            self.set_state(AuthState::Authenticated);
        } else if refreshable {
            if let Err(e) = self.refresh_locked(session).await {
                if matches!(e, TriviaError::Storage(_)) {
                    return Err(e);
                }
                warning!("Stored token could not be refreshed: {}", e);
            }
        } else {
            session.credential = None;
            self.set_state(AuthState::Unauthenticated);
            self.purge().await?;
        }
        Ok(())
    }

    async fn ensure_locked(&self, session: &mut Session) -> Result<Credential> {
        if !session.restored {
            self.restore_locked(session).await?;
        }

        if let Some(credential) = session.credential.as_ref().filter(|c| c.is_usable()) {
            return Ok(credential.clone());
        }

        let refreshable = session
            .credential
            .as_ref()
            .is_some_and(|c| c.refresh_token.is_some());
        if refreshable {
            match self.refresh_locked(session).await {
                Ok(credential) => return Ok(credential),
                Err(e @ TriviaError::Storage(_)) => return Err(e),
                Err(e) => warning!("Token refresh failed, starting a new login: {}", e),
            }
        }

        self.authenticate_locked(session).await
    }

    async fn refresh_locked(&self, session: &mut Session) -> Result<Credential> {
        let Some(stored_refresh) = session
            .credential
            .as_ref()
            .and_then(|c| c.refresh_token.clone())
        else {
            return Err(TriviaError::AuthUnavailable(
                "no refresh token available".to_string(),
            ));
        };

        self.set_state(AuthState::Refreshing);
        let refreshed = refresh_token(self.http.as_ref(), &self.settings, &stored_refresh)
            .await
            .and_then(|token| Credential::issued(&token, Utc::now()));
        match refreshed {
            Ok(mut credential) => {
                if credential.refresh_token.is_none() {
                    credential.refresh_token = Some(stored_refresh);
                }
                self.persist(&credential).await?;
                session.credential = Some(credential.clone());
                self.set_state(AuthState::Authenticated);
                Ok(credential)
            }
            Err(e) => {
                session.credential = None;
                if let Err(purge_err) = self.purge().await {
                    warning!("Failed to purge stored credentials: {}", purge_err);
                }
                self.set_state(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    async fn authenticate_locked(&self, session: &mut Session) -> Result<Credential> {
        self.set_state(AuthState::Authenticating);

        let result = self.run_authorization().await;
        if let Err(e) = self.store.delete(KEY_CODE_VERIFIER).await {
            warning!("Failed to delete the PKCE verifier: {}", e);
        }
        self.logins.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(credential) => {
                session.login_failure = None;
                session.credential = Some(credential.clone());
                self.set_state(AuthState::Authenticated);
                Ok(credential)
            }
            Err(e) => {
                if matches!(e, TriviaError::TokenExchangeFailed { .. }) {
                    session.credential = None;
                    if let Err(purge_err) = self.purge().await {
                        warning!("Failed to purge stored credentials: {}", purge_err);
                    }
                }
                session.login_failure = Some(e.to_string());
                self.set_state(AuthState::Failed);
                Err(e)
            }
        }
    }

    async fn run_authorization(&self) -> Result<Credential> {
        let pkce = utils::generate_pkce_challenge();
        self.store
            .set(KEY_CODE_VERIFIER, &pkce.code_verifier)
            .await?;

        let request = authorization_request(&self.settings, &pkce.code_challenge)?;
        let code = self.authorizer.authorize(&request).await?;

        let verifier = self
            .store
            .get(KEY_CODE_VERIFIER)
            .await?
            .ok_or(TriviaError::MissingVerifier)?;

        let token = exchange_code_pkce(self.http.as_ref(), &self.settings, &code, &verifier).await?;
        let credential = Credential::issued(&token, Utc::now())?;
        self.persist(&credential).await?;
        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) -> Result<()> {
        self.store
            .set(KEY_ACCESS_TOKEN, &credential.access_token)
            .await?;
        match &credential.refresh_token {
            Some(token) => self.store.set(KEY_REFRESH_TOKEN, token).await?,
            None => self.store.delete(KEY_REFRESH_TOKEN).await?,
        }
        self.store
            .set(KEY_EXPIRES_AT, &credential.expires_at.timestamp().to_string())
            .await
    }

    async fn load_persisted(&self) -> Result<Option<Credential>> {
        let Some(access_token) = self.store.get(KEY_ACCESS_TOKEN).await? else {
            return Ok(None);
        };
        let expires_at = self
            .store
            .get(KEY_EXPIRES_AT)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        let Some(expires_at) = expires_at else {
            return Ok(None);
        };

        Ok(Some(Credential {
            access_token,
            refresh_token: self.store.get(KEY_REFRESH_TOKEN).await?,
            expires_at,
        }))
    }

    async fn purge(&self) -> Result<()> {
        self.store.delete(KEY_ACCESS_TOKEN).await?;
        self.store.delete(KEY_REFRESH_TOKEN).await?;
        self.store.delete(KEY_EXPIRES_AT).await
    }

    /// The error of a login that finished while this caller waited for the
    /// session and left no usable credential behind.
    fn login_failed_since(&self, session: &Session, logins_seen: u64) -> Option<TriviaError> {
        if self.logins.load(Ordering::SeqCst) == logins_seen {
            return None;
        }
        if session.credential.as_ref().is_some_and(|c| c.is_usable()) {
            return None;
        }
        session.login_failure.as_deref().map(login_failed)
    }

    fn set_state(&self, state: AuthState) {
        self.state.send_replace(state);
    }
}

fn login_failed(reason: &str) -> TriviaError {
    TriviaError::AuthUnavailable(format!("login already failed: {}", reason))
}
