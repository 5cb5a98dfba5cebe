use std::collections::{BTreeSet, HashSet};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, seq::IndexedRandom};
use sha2::{Digest, Sha256};

use crate::types::{PkceChallenge, Track};

/// RFC 7636 unreserved characters.
const PKCE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

pub const CODE_VERIFIER_LEN: usize = 128;

pub fn generate_code_verifier() -> String {
    let mut rng = rand::rng();
    (0..CODE_VERIFIER_LEN)
        .map(|_| PKCE_ALPHABET[rng.random_range(0..PKCE_ALPHABET.len())] as char)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn generate_pkce_challenge() -> PkceChallenge {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    PkceChallenge {
        code_verifier,
        code_challenge,
    }
}

/// Lowercases and hyphenates a genre so "Hip Hop" and "hip-hop" compare equal.
pub fn normalize_genre(genre: &str) -> String {
    genre
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// True when any track genre contains a requested genre or the other way round.
pub fn genre_matches(track_genres: &BTreeSet<String>, requested: &BTreeSet<String>) -> bool {
    let requested: Vec<String> = requested.iter().map(|g| normalize_genre(g)).collect();

    track_genres.iter().any(|genre| {
        let genre = normalize_genre(genre);
        requested
            .iter()
            .any(|wanted| genre.contains(wanted.as_str()) || wanted.contains(genre.as_str()))
    })
}

/// Year component of a catalog release date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
pub fn release_year(release_date: &str) -> Option<i32> {
    let year = release_date.trim().split('-').next()?;
    if year.len() != 4 {
        return None;
    }
    year.parse().ok()
}

pub fn remove_duplicate_tracks(tracks: &mut Vec<Track>) {
    let mut seen_ids = HashSet::new();
    tracks.retain(|track| seen_ids.insert(track.id.clone()));
}

pub fn pick_random(tracks: &[Track]) -> Option<Track> {
    tracks.choose(&mut rand::rng()).cloned()
}

/// A one-letter wildcard query for broad catalog searches.
pub fn random_search_letter() -> char {
    let mut rng = rand::rng();
    (b'a' + rng.random_range(0..26u8)) as char
}
