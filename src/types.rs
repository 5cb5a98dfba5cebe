use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::{self, TriviaError};

/// Refresh this long before the advertised expiry.
pub const REFRESH_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Builds a credential from a token response issued at `issued_at`.
    ///
    /// Fails with [`TriviaError::Parse`] when `expires_in` is negative or puts
    /// the expiry outside the representable date range.
    pub fn issued(token: &TokenResponse, issued_at: DateTime<Utc>) -> error::Result<Self> {
        let expires_at = TimeDelta::try_seconds(token.expires_in)
            .filter(|lifetime| *lifetime >= TimeDelta::zero())
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                TriviaError::Parse(format!("invalid token lifetime: {}", token.expires_in))
            })?;

        Ok(Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at,
        })
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(TimeDelta::seconds(REFRESH_SKEW_SECS))
            .is_some_and(|deadline| now < deadline)
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }
}

#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Refreshing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub popularity: u32,
}

impl Track {
    pub fn external_url(&self) -> &str {
        &self.external_urls.spotify
    }

    pub fn has_preview(&self) -> bool {
        self.preview_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreSeedsResponse {
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralArtistsResponse {
    pub artists: Vec<Option<Artist>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decade {
    #[serde(rename = "1960s")]
    Sixties,
    #[serde(rename = "1970s")]
    Seventies,
    #[serde(rename = "1980s")]
    Eighties,
    #[serde(rename = "1990s")]
    Nineties,
    #[serde(rename = "2000s")]
    Noughties,
    #[serde(rename = "2010s")]
    Tens,
    #[serde(rename = "2020s")]
    Twenties,
}

impl Decade {
    pub const ALL: [Decade; 7] = [
        Decade::Sixties,
        Decade::Seventies,
        Decade::Eighties,
        Decade::Nineties,
        Decade::Noughties,
        Decade::Tens,
        Decade::Twenties,
    ];

    pub fn start_year(self) -> i32 {
        match self {
            Decade::Sixties => 1960,
            Decade::Seventies => 1970,
            Decade::Eighties => 1980,
            Decade::Nineties => 1990,
            Decade::Noughties => 2000,
            Decade::Tens => 2010,
            Decade::Twenties => 2020,
        }
    }

    pub fn end_year(self) -> i32 {
        self.start_year() + 9
    }

    pub fn contains(self, year: i32) -> bool {
        (self.start_year()..=self.end_year()).contains(&year)
    }
}

impl fmt::Display for Decade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.start_year())
    }
}

impl FromStr for Decade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        Decade::ALL
            .into_iter()
            .find(|d| d.to_string() == norm)
            .ok_or_else(|| {
                format!(
                    "invalid decade '{}'; expected one of 1960s, 1970s, 1980s, 1990s, 2000s, 2010s, 2020s",
                    s.trim()
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!(
                "invalid difficulty '{}'; expected easy, medium, hard or expert",
                other
            )),
        }
    }
}

/// Per-round constraints supplied by the game loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub genres: BTreeSet<String>,
    pub decades: BTreeSet<Decade>,
    pub difficulty: BTreeSet<Difficulty>,
    pub relax_filters: bool,
}

impl Filters {
    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genres.insert(genre.to_string());
        self
    }

    pub fn with_decade(mut self, decade: Decade) -> Self {
        self.decades.insert(decade);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty.insert(difficulty);
        self
    }

    pub fn relaxed(mut self, relax: bool) -> Self {
        self.relax_filters = relax;
        self
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub released: String,
    pub popularity: u32,
    pub preview: String,
}

impl From<&Track> for TrackTableRow {
    fn from(track: &Track) -> Self {
        TrackTableRow {
            name: track.name.clone(),
            artists: track
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: track.album.name.clone(),
            released: track.album.release_date.clone().unwrap_or_default(),
            popularity: track.popularity,
            preview: track.preview_url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct GenreTableRow {
    pub genre: String,
}

/// What the OAuth redirect delivered to the local callback server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
}
