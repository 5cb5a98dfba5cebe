use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    error::{Result, TriviaError},
    http::{HttpClient, HttpRequest},
    management::TokenManager,
    types::{
        Album, Artist, GenreSeedsResponse, RecommendationsResponse, SearchResponse,
        SeveralArtistsResponse, Track,
    },
    warning,
};

/// Most seed genres the recommendations endpoint accepts.
pub const MAX_SEED_GENRES: usize = 5;
/// Most ids the several-artists endpoint accepts.
pub const MAX_ARTIST_IDS: usize = 50;

/// Bearer-authenticated access to the catalog endpoints.
///
/// Every call obtains its credential from the [`TokenManager`]. A `401` answer
/// triggers exactly one re-authentication followed by one retry of the same
/// request; a second `401` fails with [`TriviaError::Unauthorized`].
pub struct CatalogClient {
    http: Arc<dyn HttpClient>,
    tokens: Arc<TokenManager>,
    api_url: String,
}

impl CatalogClient {
    pub fn new(http: Arc<dyn HttpClient>, tokens: Arc<TokenManager>, api_url: &str) -> Self {
        Self {
            http,
            tokens,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// `GET /v1/recommendations/available-genre-seeds`
    pub async fn available_genre_seeds(&self) -> Result<Vec<String>> {
        let res: GenreSeedsResponse = self
            .get_json(HttpRequest::get(self.url("/v1/recommendations/available-genre-seeds")))
            .await?;
        Ok(res.genres)
    }

    /// `GET /v1/recommendations` seeded by at most five genres.
    pub async fn recommendations(
        &self,
        seed_genres: &[String],
        min_popularity: u32,
        max_popularity: u32,
        limit: u32,
    ) -> Result<Vec<Track>> {
        let seeds = seed_genres
            .iter()
            .take(MAX_SEED_GENRES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let request = HttpRequest::get(self.url("/v1/recommendations"))
            .query("seed_genres", seeds)
            .query("min_popularity", min_popularity)
            .query("max_popularity", max_popularity)
            .query("limit", limit);

        let res: RecommendationsResponse = self.get_json(request).await?;
        Ok(res.tracks)
    }

    /// `GET /v1/search?type=track`
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        let request = HttpRequest::get(self.url("/v1/search"))
            .query("q", query)
            .query("type", "track")
            .query("limit", limit);

        let res: SearchResponse = self.get_json(request).await?;
        Ok(res.tracks.items)
    }

    /// `GET /v1/artists/{id}`
    pub async fn artist(&self, artist_id: &str) -> Result<Artist> {
        self.get_json(HttpRequest::get(
            self.url(&format!("/v1/artists/{}", artist_id)),
        ))
        .await
    }

    /// `GET /v1/artists?ids=` for at most fifty ids. Unknown ids are skipped.
    pub async fn artists(&self, artist_ids: &[String]) -> Result<Vec<Artist>> {
        if artist_ids.len() > MAX_ARTIST_IDS {
            warning!(
                "Requested {} artists at once, only the first {} are fetched",
                artist_ids.len(),
                MAX_ARTIST_IDS
            );
        }
        let ids = artist_ids
            .iter()
            .take(MAX_ARTIST_IDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let res: SeveralArtistsResponse = self
            .get_json(HttpRequest::get(self.url("/v1/artists")).query("ids", ids))
            .await?;
        Ok(res.artists.into_iter().flatten().collect())
    }

    /// `GET /v1/albums/{id}`
    pub async fn album(&self, album_id: &str) -> Result<Album> {
        self.get_json(HttpRequest::get(
            self.url(&format!("/v1/albums/{}", album_id)),
        ))
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let credential = self.tokens.ensure_valid_credential().await?;
        let response = self
            .http
            .send(request.clone().bearer_auth(&credential.access_token))
            .await?;

        let response = if response.status == 401 {
            warning!("Catalog rejected the access token, re-authenticating...");
            let renewed = self
                .tokens
                .reauthorize_after_rejection(&credential.access_token)
                .await?;
            let retried = self
                .http
                .send(request.clone().bearer_auth(&renewed.access_token))
                .await?;
            if retried.status == 401 {
                return Err(TriviaError::Unauthorized);
            }
            retried
        } else {
            response
        };

        if !response.is_success() {
            return Err(TriviaError::Http {
                status: response.status,
                url: request.url,
            });
        }
        response.json()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
