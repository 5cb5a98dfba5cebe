//! Configuration management for tunetrivia.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, endpoint locations, the local
//! callback server and discovery tuning.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (everything except the client id)

use std::{env, path::PathBuf, time::Duration};

use crate::error::{Result, TriviaError};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_GENRE_CACHE_CAPACITY: usize = 2048;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from a `.env` file located in the platform-specific
/// local data directory under `tunetrivia/.env`.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/tunetrivia/.env`
/// - macOS: `~/Library/Application Support/tunetrivia/.env`
/// - Windows: `%LOCALAPPDATA%/tunetrivia/.env`
///
/// A missing file is fine: variables exported in the shell still apply.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or if an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| TriviaError::Config(e.to_string()))?;
    }
    Ok(())
}

/// Root of everything tunetrivia keeps on disk.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tunetrivia");
    path
}

/// Everything the token lifecycle needs to talk to the accounts service.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
}

impl AuthSettings {
    /// Settings pointing at the public Spotify accounts service.
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub auth: AuthSettings,
    pub api_url: String,
    pub server_address: String,
    pub auth_timeout: Duration,
    pub genre_cache_capacity: usize,
}

impl Settings {
    /// Builds the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `SPOTIFY_API_AUTH_CLIENT_ID` - required, the registered application id
    /// - `SPOTIFY_API_REDIRECT_URI` - callback URL registered with Spotify
    /// - `SPOTIFY_API_AUTH_SCOPE` - space separated scopes
    /// - `SPOTIFY_API_AUTH_URL` - authorization endpoint
    /// - `SPOTIFY_API_TOKEN_URL` - token endpoint
    /// - `SPOTIFY_API_URL` - catalog host, paths such as `/v1/search` are appended
    /// - `SERVER_ADDRESS` - bind address of the local callback server
    /// - `TUNETRIVIA_AUTH_TIMEOUT_SECS` - how long to wait for the login callback
    /// - `TUNETRIVIA_GENRE_CACHE_CAPACITY` - entries kept per genre cache
    ///
    /// # Errors
    ///
    /// Returns [`TriviaError::Config`] when the client id is missing or a numeric
    /// variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID").map_err(|_| {
            TriviaError::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string())
        })?;

        Ok(Self {
            auth: AuthSettings {
                client_id,
                redirect_uri: var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
                scope: var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
                auth_url: var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
                token_url: var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            },
            api_url: var_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            server_address: var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            auth_timeout: Duration::from_secs(parse_var(
                "TUNETRIVIA_AUTH_TIMEOUT_SECS",
                DEFAULT_AUTH_TIMEOUT_SECS,
            )?),
            genre_cache_capacity: parse_var(
                "TUNETRIVIA_GENRE_CACHE_CAPACITY",
                DEFAULT_GENRE_CACHE_CAPACITY,
            )?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| TriviaError::Config(format!("{} has an invalid value '{}'", key, raw))),
        _ => Ok(default),
    }
}
