use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::TimeDelta;
use reqwest::Url;
use tokio::sync::Mutex;

use crate::{
    config::AuthSettings,
    error::{Result, TriviaError},
    http::{HttpClient, HttpRequest, HttpResponse},
    info,
    server::start_api_server,
    types::{CallbackOutcome, TokenResponse},
    warning,
};

/// Everything an [`InteractiveAuthorizer`] needs to present the login page.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Fully assembled authorization URL, ready to open in a browser.
    pub url: String,
    pub client_id: String,
    pub code_challenge: String,
    pub scope: String,
    pub redirect_uri: String,
}

/// Presents the login UI and hands back the authorization code.
///
/// Implementations return [`TriviaError::AuthUnavailable`] when the user
/// declines, the login times out, or the UI cannot be shown at all.
#[async_trait]
pub trait InteractiveAuthorizer: Send + Sync {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<String>;
}

/// Builds the authorization request for one PKCE attempt.
///
/// The URL carries `client_id`, `scope`, `redirect_uri`, `response_type=code`,
/// `code_challenge` and `code_challenge_method=S256`, all form-encoded.
///
/// # Errors
///
/// Returns [`TriviaError::Config`] if the configured authorization endpoint is
/// not a valid URL.
pub fn authorization_request(
    settings: &AuthSettings,
    code_challenge: &str,
) -> Result<AuthorizationRequest> {
    let url = Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("scope", settings.scope.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("response_type", "code"),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| {
        TriviaError::Config(format!(
            "invalid authorization url '{}': {}",
            settings.auth_url, e
        ))
    })?;

    Ok(AuthorizationRequest {
        url: url.to_string(),
        client_id: settings.client_id.clone(),
        code_challenge: code_challenge.to_string(),
        scope: settings.scope.clone(),
        redirect_uri: settings.redirect_uri.clone(),
    })
}

/// Exchanges an authorization code for tokens using PKCE.
///
/// Completes the OAuth 2.0 PKCE flow by posting the authorization code together
/// with the code verifier that was generated at the start of the attempt. The
/// verifier proves that the client completing the flow is the one that started
/// it, so no client secret is involved.
///
/// # Arguments
///
/// * `http` - Transport used for the token endpoint call
/// * `settings` - Client id, redirect URI and token endpoint
/// * `code` - Authorization code received from the OAuth callback
/// * `verifier` - PKCE code verifier persisted for this attempt
///
/// # Errors
///
/// - [`TriviaError::TokenExchangeFailed`] for any non-2xx answer
/// - [`TriviaError::Parse`] when the body lacks `access_token` or `expires_in`
/// - [`TriviaError::Transport`] when the endpoint cannot be reached
pub async fn exchange_code_pkce(
    http: &dyn HttpClient,
    settings: &AuthSettings,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let request = HttpRequest::post_form(
        &settings.token_url,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &settings.redirect_uri),
            ("client_id", &settings.client_id),
            ("code_verifier", verifier),
        ],
    );

    token_response(http.send(request).await?)
}

/// Refreshes an expired access token using a refresh token.
///
/// The answer may or may not rotate the refresh token; callers keep the old one
/// when `refresh_token` is absent from the response.
///
/// # Errors
///
/// Same as [`exchange_code_pkce`]. Callers treat every error as a reason to
/// purge the stored credential.
pub async fn refresh_token(
    http: &dyn HttpClient,
    settings: &AuthSettings,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let request = HttpRequest::post_form(
        &settings.token_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &settings.client_id),
        ],
    );

    token_response(http.send(request).await?)
}

fn token_response(response: HttpResponse) -> Result<TokenResponse> {
    if !response.is_success() {
        return Err(TriviaError::TokenExchangeFailed {
            status: response.status,
            body: response.body,
        });
    }

    let token: TokenResponse = response.json()?;
    if token.access_token.is_empty() {
        return Err(TriviaError::Parse(
            "token response carries an empty access_token".to_string(),
        ));
    }
    if token.expires_in < 0 || TimeDelta::try_seconds(token.expires_in).is_none() {
        return Err(TriviaError::Parse(format!(
            "token response carries an invalid expires_in: {}",
            token.expires_in
        )));
    }
    Ok(token)
}

/// Logs in through the system browser and a local callback server.
///
/// 1. **Server Start**: binds the callback listener on the configured address
/// 2. **Browser Launch**: opens the authorization URL, printing it when no
///    browser can be launched
/// 3. **Callback Wait**: polls the shared callback state until the redirect
///    arrives or the timeout elapses
/// 4. **Teardown**: stops the listener whatever the outcome
pub struct BrowserAuthorizer {
    server_address: String,
    timeout: Duration,
}

impl BrowserAuthorizer {
    pub fn new(server_address: &str, timeout: Duration) -> Self {
        Self {
            server_address: server_address.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl InteractiveAuthorizer for BrowserAuthorizer {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<String> {
        let shared_state: Arc<Mutex<Option<CallbackOutcome>>> = Arc::new(Mutex::new(None));
        let server = start_api_server(&self.server_address, Arc::clone(&shared_state)).await?;

        if webbrowser::open(&request.url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                request.url
            )
        } else {
            info!("Waiting for the Spotify login to complete in your browser...");
        }

        let outcome = wait_for_callback(shared_state, self.timeout).await;
        server.abort();

        match outcome {
            Some(CallbackOutcome::Code(code)) => Ok(code),
            Some(CallbackOutcome::Denied(reason)) => Err(TriviaError::AuthUnavailable(format!(
                "authorization was refused: {}",
                reason
            ))),
            None => Err(TriviaError::AuthUnavailable(
                "authentication timed out".to_string(),
            )),
        }
    }
}

/// Polls the callback state once per second until the redirect arrives.
async fn wait_for_callback(
    shared_state: Arc<Mutex<Option<CallbackOutcome>>>,
    max_wait: Duration,
) -> Option<CallbackOutcome> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(outcome) = lock.as_ref() {
            return Some(outcome.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
