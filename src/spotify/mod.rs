//! # Spotify Integration Module
//!
//! This module is the integration layer between tunetrivia and the Spotify Web
//! API: the OAuth 2.0 PKCE token endpoints, the bearer-authenticated catalog
//! endpoints used to find candidate tracks, and the genre vocabulary used to
//! validate genre filters.
//!
//! ## Architecture
//!
//! ```text
//! Discovery Engine (cascade of filter variants)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (PKCE token endpoint, interactive login)
//!     ├── Catalog (recommendations, search, artists, albums)
//!     └── Genres (seed vocabulary, memoized genre lookups)
//!          ↓
//! HTTP capability (reqwest in production, fakes in tests)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - Stateless pieces of the OAuth 2.0 PKCE flow:
//! - **Authorization Request**: Builds the `/authorize` URL from the code challenge
//! - **Token Exchange**: `grant_type=authorization_code` with the code verifier
//! - **Token Refresh**: `grant_type=refresh_token`
//! - **Interactive Login**: The [`auth::InteractiveAuthorizer`] seam and the
//!   browser-plus-local-callback implementation
//!
//! The stateful side (persistence, expiry tracking, refresh before expiry) lives
//! in [`crate::management::TokenManager`].
//!
//! ### Catalog Module
//!
//! [`catalog`] - Typed wrappers over the catalog endpoints. Every call carries
//! `Authorization: Bearer`, and a `401` answer leads to exactly one
//! re-authentication and one retry.
//!
//! ### Genres Module
//!
//! [`genres`] - Resolves requested genres against the seed vocabulary and
//! verifies candidate tracks against their artists' and album's genres. Lookups
//! are memoized per artist id and per album id in a bounded LRU cache.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - Token exchange and refresh
//! - `GET /v1/recommendations/available-genre-seeds` - Genre vocabulary
//! - `GET /v1/recommendations` - Genre-seeded candidates in a popularity window
//! - `GET /v1/search` - Broad track search
//! - `GET /v1/artists/{id}`, `GET /v1/artists?ids=` - Artist genres
//! - `GET /v1/albums/{id}` - Album genres
//!
//! ## Error Types
//!
//! All functions return [`crate::error::Result`]. Catalog failures other than
//! authorization problems are transient and are absorbed by the discovery
//! cascade.

pub mod auth;
pub mod catalog;
pub mod genres;
