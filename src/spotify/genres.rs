use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::{
    error::{Result, TriviaError},
    management::GenreCache,
    spotify::catalog::{CatalogClient, MAX_ARTIST_IDS},
    types::Track,
    utils, warning,
};

/// The catalog's genre-seed vocabulary plus memoized genre lookups for tracks.
pub struct GenreCatalog {
    catalog: Arc<CatalogClient>,
    vocabulary: Mutex<Option<Arc<BTreeSet<String>>>>,
    cache: GenreCache,
}

impl GenreCatalog {
    pub fn new(catalog: Arc<CatalogClient>, cache_capacity: usize) -> Self {
        Self {
            catalog,
            vocabulary: Mutex::new(None),
            cache: GenreCache::new(cache_capacity),
        }
    }

    pub fn cache(&self) -> &GenreCache {
        &self.cache
    }

    /// The genre seeds the recommendations endpoint understands.
    ///
    /// Fetched once; the list is static for the lifetime of the process. A failed
    /// fetch is not cached, the next call tries again.
    pub async fn available_genres(&self) -> Result<Arc<BTreeSet<String>>> {
        let mut vocabulary = self.vocabulary.lock().await;
        if let Some(genres) = vocabulary.as_ref() {
            return Ok(Arc::clone(genres));
        }

        let genres: BTreeSet<String> = self
            .catalog
            .available_genre_seeds()
            .await?
            .iter()
            .map(|g| utils::normalize_genre(g))
            .collect();
        let genres = Arc::new(genres);
        *vocabulary = Some(Arc::clone(&genres));
        Ok(genres)
    }

    /// Normalizes the requested genres and keeps those known to the catalog.
    ///
    /// An empty result means "no usable genre constraint", not an error.
    pub async fn resolve_seeds(&self, requested: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        let vocabulary = self.available_genres().await?;
        Ok(requested
            .iter()
            .map(|g| utils::normalize_genre(g))
            .filter(|g| vocabulary.contains(g))
            .collect())
    }

    /// Union of the track's artist genres and album genres.
    pub async fn genres_for_track(&self, track: &Track) -> Result<BTreeSet<String>> {
        let (lookup, failure) = self.look_up(std::slice::from_ref(track)).await;
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(lookup.genres_for(track).unwrap_or_default())
    }

    /// Keeps the tracks whose genres match `requested`, `batch_size` tracks at a time.
    ///
    /// Lookups inside one batch run concurrently; batches run one after another.
    /// A track whose genres could not be looked up because of a network or
    /// decoding error is kept. Any other lookup error, such as a failed
    /// re-authentication, ends verification and is returned.
    pub async fn verify_tracks(
        &self,
        tracks: Vec<Track>,
        requested: &BTreeSet<String>,
        batch_size: usize,
    ) -> Result<Vec<Track>> {
        let mut kept = Vec::with_capacity(tracks.len());

        for batch in tracks.chunks(batch_size.max(1)) {
            let (lookup, failure) = self.look_up(batch).await;
            if let Some(e) = failure {
                if !e.is_transient() {
                    return Err(e);
                }
                warning!("Genre lookup failed, keeping unverified tracks: {}", e);
            }

            for track in batch {
                match lookup.genres_for(track) {
                    Some(genres) => {
                        if utils::genre_matches(&genres, requested) {
                            kept.push(track.clone());
                        }
                    }
                    None => kept.push(track.clone()),
                }
            }
        }

        Ok(kept)
    }

    /// Genres of every artist and album of `tracks`, from the cache or the catalog.
    ///
    /// Each uncached id is requested once no matter how many tracks share it.
    /// Successful lookups are kept even if others fail. The reported failure is
    /// the first hard one, or the first transient one when all are transient.
    async fn look_up(&self, tracks: &[Track]) -> (BatchLookup, Option<TriviaError>) {
        let mut lookup = BatchLookup::default();
        let mut missing_artists: Vec<String> = Vec::new();
        let mut missing_albums: Vec<String> = Vec::new();

        for artist_id in unique_ids(
            tracks
                .iter()
                .flat_map(|t| t.artists.iter().map(|a| a.id.as_str())),
        ) {
            match self.cache.artist(&artist_id).await {
                Some(genres) => {
                    lookup.artists.insert(artist_id, genres);
                }
                None => missing_artists.push(artist_id),
            }
        }
        for album_id in unique_ids(tracks.iter().map(|t| t.album.id.as_str())) {
            match self.cache.album(&album_id).await {
                Some(genres) => {
                    lookup.albums.insert(album_id, genres);
                }
                None => missing_albums.push(album_id),
            }
        }

        let artist_lookups = missing_artists
            .chunks(MAX_ARTIST_IDS)
            .map(|chunk| self.fetch_artists(chunk));
        let album_lookups = missing_albums.iter().map(|id| self.fetch_album(id));

        let (artist_results, album_results) =
            futures::join!(join_all(artist_lookups), join_all(album_lookups));

        let mut failures = Vec::new();
        for result in artist_results {
            match result {
                Ok(artists) => lookup.artists.extend(artists),
                Err(e) => failures.push(e),
            }
        }
        for result in album_results {
            match result {
                Ok((album_id, genres)) => {
                    lookup.albums.insert(album_id, genres);
                }
                Err(e) => failures.push(e),
            }
        }

        let failure = match failures.iter().position(|e| !e.is_transient()) {
            Some(hard) => Some(failures.swap_remove(hard)),
            None => failures.into_iter().next(),
        };
        (lookup, failure)
    }

    async fn fetch_artists(&self, artist_ids: &[String]) -> Result<Vec<(String, Vec<String>)>> {
        if let [artist_id] = artist_ids {
            let artist = self.catalog.artist(artist_id).await?;
            self.cache.insert_artist(artist_id, artist.genres.clone()).await;
            return Ok(vec![(artist_id.clone(), artist.genres)]);
        }

        let artists = self.catalog.artists(artist_ids).await?;
        let mut fetched = Vec::with_capacity(artist_ids.len());
        for artist_id in artist_ids {
            let genres = artists
                .iter()
                .find(|a| &a.id == artist_id)
                .map(|a| a.genres.clone())
                .unwrap_or_default();
            self.cache.insert_artist(artist_id, genres.clone()).await;
            fetched.push((artist_id.clone(), genres));
        }
        Ok(fetched)
    }

    async fn fetch_album(&self, album_id: &str) -> Result<(String, Vec<String>)> {
        let album = self.catalog.album(album_id).await?;
        self.cache.insert_album(album_id, album.genres.clone()).await;
        Ok((album_id.to_string(), album.genres))
    }
}

/// Non-empty ids in first-seen order, without duplicates.
fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for id in ids {
        if !id.is_empty() && !unique.iter().any(|u| u == id) {
            unique.push(id.to_string());
        }
    }
    unique
}

/// Genres resolved for one batch. The cache may evict entries while a batch is
/// still being evaluated, so evaluation reads from here instead.
#[derive(Default)]
struct BatchLookup {
    artists: HashMap<String, Vec<String>>,
    albums: HashMap<String, Vec<String>>,
}

impl BatchLookup {
    /// `None` when any of the track's artists or its album could not be looked up.
    fn genres_for(&self, track: &Track) -> Option<BTreeSet<String>> {
        let mut genres = BTreeSet::new();

        for artist in track.artists.iter().filter(|a| !a.id.is_empty()) {
            genres.extend(self.artists.get(&artist.id)?.iter().cloned());
        }
        if !track.album.id.is_empty() {
            genres.extend(self.albums.get(&track.album.id)?.iter().cloned());
        }

        Some(genres)
    }
}
