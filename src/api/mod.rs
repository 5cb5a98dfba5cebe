//! # API Module
//!
//! HTTP endpoints served by the short-lived local listener that receives the
//! Spotify OAuth redirect during an interactive login.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the redirect from Spotify's authorization server and
//!   records either the authorization code or the reason the login was refused.
//!   The code exchange itself happens in the token lifecycle manager, so this
//!   handler never sees the PKCE verifier.
//! - [`health`] - Reports that the listener is up, which is handy when a
//!   redirect URI seems misconfigured.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use tunetrivia::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
