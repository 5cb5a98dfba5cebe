//! Random track discovery.
//!
//! [`DiscoveryEngine::get_random_track`] runs a cascade of filter variants
//! through one shared pipeline:
//!
//! ```text
//! genre resolve → catalog query → decade filter → genre re-verify
//!               → difficulty filter → playback filter → random pick
//! ```
//!
//! Variants run strictly in order and the first one that leaves at least one
//! playable track wins. Transient catalog errors count as an empty step; only
//! authorization failures abort the cascade.

pub mod difficulty;
pub mod filters;

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    error::Result,
    info,
    spotify::{
        catalog::{CatalogClient, MAX_SEED_GENRES},
        genres::GenreCatalog,
    },
    types::{Decade, Filters, Track},
    utils, warning,
};

use filters::{FilterVariant, VariantKind};

/// Outcome of one discovery call.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Track(Track),
    /// Nothing matched, even after relaxing. Carries the filters as requested.
    NoTracksFound { attempted_filters: Filters },
}

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub recommendation_limit: u32,
    pub search_limit: u32,
    pub verify_batch_size: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            recommendation_limit: 100,
            search_limit: 50,
            verify_batch_size: 10,
        }
    }
}

#[derive(Debug)]
struct SearchAttempt {
    kind: VariantKind,
    filters: Filters,
    eligible: usize,
}

impl SearchAttempt {
    fn summary(&self) -> String {
        format!(
            "{} (genres {:?}, decades {:?}, difficulty {:?}) -> {} eligible",
            self.kind.describe(),
            self.filters.genres,
            self.filters.decades,
            self.filters.difficulty,
            self.eligible
        )
    }
}

pub struct DiscoveryEngine {
    catalog: Arc<CatalogClient>,
    genres: Arc<GenreCatalog>,
    options: DiscoveryOptions,
}

impl DiscoveryEngine {
    pub fn new(
        catalog: Arc<CatalogClient>,
        genres: Arc<GenreCatalog>,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            catalog,
            genres,
            options,
        }
    }

    /// Picks one playable track matching `filters`, relaxing them if allowed.
    ///
    /// # Returns
    ///
    /// - `Ok(Discovery::Track)` - a uniformly random pick among eligible tracks
    /// - `Ok(Discovery::NoTracksFound)` - every variant came up empty
    /// - `Err(_)` - no credential could be obtained, or the catalog kept
    ///   rejecting it
    pub async fn get_random_track(&self, filters: &Filters) -> Result<Discovery> {
        self.catalog.tokens().ensure_valid_credential().await?;

        let mut attempts: Vec<SearchAttempt> = Vec::new();
        for variant in filters::variants_for(filters) {
            if !attempts.is_empty() {
                info!("No track found, retrying {}", variant.kind.describe());
            }

            let eligible = match self.run_variant(&variant).await {
                Ok(tracks) => tracks,
                Err(e) if e.is_transient() => {
                    warning!(
                        "Search with {} failed: {}",
                        variant.kind.describe(),
                        e
                    );
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            attempts.push(SearchAttempt {
                kind: variant.kind,
                filters: variant.filters,
                eligible: eligible.len(),
            });

            if let Some(track) = utils::pick_random(&eligible) {
                return Ok(Discovery::Track(track));
            }
        }

        warning!(
            "No playable track after {} attempt(s): {}",
            attempts.len(),
            attempts
                .iter()
                .map(SearchAttempt::summary)
                .collect::<Vec<_>>()
                .join("; ")
        );
        Ok(Discovery::NoTracksFound {
            attempted_filters: filters.clone(),
        })
    }

    async fn run_variant(&self, variant: &FilterVariant) -> Result<Vec<Track>> {
        let filters = &variant.filters;

        let mut candidates = if filters.genres.is_empty() {
            let query = broad_query(&filters.decades);
            self.catalog
                .search_tracks(&query, self.options.search_limit)
                .await?
        } else {
            let seeds = self.genres.resolve_seeds(&filters.genres).await?;
            if seeds.is_empty() {
                info!(
                    "None of the genres {:?} is known to the catalog",
                    filters.genres
                );
                return Ok(Vec::new());
            }

            let seeds: Vec<String> = seeds.into_iter().take(MAX_SEED_GENRES).collect();
            let window = difficulty::query_window(&filters.difficulty);
            self.catalog
                .recommendations(
                    &seeds,
                    window.min,
                    window.max,
                    self.options.recommendation_limit,
                )
                .await?
        };
        utils::remove_duplicate_tracks(&mut candidates);

        let candidates = filters::filter_by_decades(candidates, &filters.decades);
        let candidates = if filters.genres.is_empty() {
            candidates
        } else {
            self.genres
                .verify_tracks(candidates, &filters.genres, self.options.verify_batch_size)
                .await?
        };
        let candidates = filters::filter_by_difficulty(candidates, &filters.difficulty);

        Ok(filters::playable_only(candidates))
    }
}

/// Wildcard search text, narrowed to the requested decades' year span.
fn broad_query(decades: &BTreeSet<Decade>) -> String {
    let letter = utils::random_search_letter();
    match filters::year_envelope(decades) {
        Some((from, to)) => format!("{} year:{}-{}", letter, from, to),
        None => letter.to_string(),
    }
}
