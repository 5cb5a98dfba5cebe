//! Error taxonomy shared by the credential lifecycle, the catalog client and the
//! discovery engine.
//!
//! Errors fall into two groups. Transient errors (transport failures, non-2xx
//! catalog responses other than `401`, undecodable bodies) are absorbed by the
//! discovery cascade and treated as an empty candidate set for the step that
//! produced them. Every other variant is a hard failure that propagates to the
//! caller, who is expected to prompt for a new login or fix its configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriviaError {
    /// The interactive login was declined, timed out or could not be completed.
    #[error("authorization unavailable: {0}")]
    AuthUnavailable(String),

    /// The token endpoint answered with a non-2xx status.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("missing PKCE code verifier for the authorization code exchange")]
    MissingVerifier,

    /// A catalog call was rejected again after one re-authentication.
    #[error("catalog rejected the access token after re-authentication")]
    Unauthorized,

    #[error("network error: {0}")]
    Transport(String),

    #[error("request to {url} failed with status {status}")]
    Http { status: u16, url: String },

    #[error("unable to decode response: {0}")]
    Parse(String),

    #[error("credential store error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl TriviaError {
    /// Whether a discovery step may swallow this error and move on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TriviaError::Transport(_) | TriviaError::Http { .. } | TriviaError::Parse(_)
        )
    }

    /// Whether the caller should ask the user to log in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            TriviaError::AuthUnavailable(_)
                | TriviaError::TokenExchangeFailed { .. }
                | TriviaError::MissingVerifier
                | TriviaError::Unauthorized
        )
    }
}

impl From<reqwest::Error> for TriviaError {
    fn from(err: reqwest::Error) -> Self {
        TriviaError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for TriviaError {
    fn from(err: serde_json::Error) -> Self {
        TriviaError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for TriviaError {
    fn from(err: std::io::Error) -> Self {
        TriviaError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TriviaError>;
