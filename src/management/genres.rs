use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::config::DEFAULT_GENRE_CACHE_CAPACITY;

/// Genre lists per artist id and per album id, bounded by least-recent use.
pub struct GenreCache {
    artists: Mutex<LruCache<String, Vec<String>>>,
    albums: Mutex<LruCache<String, Vec<String>>>,
}

impl GenreCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            artists: Mutex::new(LruCache::new(cap)),
            albums: Mutex::new(LruCache::new(cap)),
        }
    }

    pub async fn artist(&self, artist_id: &str) -> Option<Vec<String>> {
        self.artists.lock().await.get(artist_id).cloned()
    }

    pub async fn album(&self, album_id: &str) -> Option<Vec<String>> {
        self.albums.lock().await.get(album_id).cloned()
    }

    pub async fn insert_artist(&self, artist_id: &str, genres: Vec<String>) {
        self.artists.lock().await.put(artist_id.to_string(), genres);
    }

    pub async fn insert_album(&self, album_id: &str, genres: Vec<String>) {
        self.albums.lock().await.put(album_id.to_string(), genres);
    }

    pub async fn entry_counts(&self) -> (usize, usize) {
        (
            self.artists.lock().await.len(),
            self.albums.lock().await.len(),
        )
    }
}

impl Default for GenreCache {
    fn default() -> Self {
        Self::new(DEFAULT_GENRE_CACHE_CAPACITY)
    }
}
