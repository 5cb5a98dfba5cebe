//! # CLI Module
//!
//! Command-line layer of tunetrivia. It wires the production collaborators
//! (reqwest, the file credential store and the browser login) into the token
//! manager and the discovery engine, and turns their results into console
//! output.
//!
//! ## Commands
//!
//! - [`auth`] - Runs the Spotify OAuth 2.0 PKCE login and stores the credential
//! - [`logout`] - Forgets the stored credential
//! - [`track`] - Picks one random track for the given filters
//! - [`genres`] - Lists the genres the catalog accepts as filters
//!
//! ## Outcomes of `track`
//!
//! The command distinguishes the three outcomes of a discovery call and never
//! conflates them:
//!
//! 1. **Track** - printed as a table together with its preview URL
//! 2. **No tracks found** - a hint to loosen the filters or pass `--relax`
//! 3. **Authorization failure** - a hint to run `tunetrivia auth` again
//!
//! ## Usage Patterns
//!
//! ```bash
//! tunetrivia auth
//! tunetrivia track --genre pop --decade 1990s --difficulty easy
//! tunetrivia track --genre "hip hop" --relax
//! tunetrivia genres --search rock
//! ```

mod auth;
mod genres;
mod track;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::Settings,
    discovery::{DiscoveryEngine, DiscoveryOptions},
    http::{HttpClient, ReqwestHttpClient},
    management::{CredentialStore, FileCredentialStore, TokenManager},
    spotify::{
        auth::{BrowserAuthorizer, InteractiveAuthorizer},
        catalog::CatalogClient,
        genres::GenreCatalog,
    },
};

pub use auth::auth;
pub use auth::logout;
pub use genres::genres;
pub use track::track;

/// The component graph behind every command.
pub struct Services {
    pub tokens: Arc<TokenManager>,
    pub catalog: Arc<CatalogClient>,
    pub genres: Arc<GenreCatalog>,
    pub engine: DiscoveryEngine,
}

impl Services {
    pub fn from_settings(settings: Settings) -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new());
        let authorizer: Arc<dyn InteractiveAuthorizer> = Arc::new(BrowserAuthorizer::new(
            &settings.server_address,
            settings.auth_timeout,
        ));
        Self::with_collaborators(settings, http, store, authorizer)
    }

    pub fn with_collaborators(
        settings: Settings,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
        authorizer: Arc<dyn InteractiveAuthorizer>,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&http),
            store,
            authorizer,
            settings.auth.clone(),
        ));
        let catalog = Arc::new(CatalogClient::new(
            http,
            Arc::clone(&tokens),
            &settings.api_url,
        ));
        let genres = Arc::new(GenreCatalog::new(
            Arc::clone(&catalog),
            settings.genre_cache_capacity,
        ));
        let engine = DiscoveryEngine::new(
            Arc::clone(&catalog),
            Arc::clone(&genres),
            DiscoveryOptions::default(),
        );

        Self {
            tokens,
            catalog,
            genres,
            engine,
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
