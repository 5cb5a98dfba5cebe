use std::collections::BTreeSet;

use crate::{
    discovery::difficulty::{self, PercentileCuts},
    types::{Decade, Difficulty, Filters, Track},
    utils,
};

/// Which relaxation step a variant represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Original,
    WithoutGenres,
    WithoutGenresOrDecades,
    DifficultyOnly,
}

impl VariantKind {
    pub fn describe(self) -> &'static str {
        match self {
            VariantKind::Original => "requested filters",
            VariantKind::WithoutGenres => "without genres",
            VariantKind::WithoutGenresOrDecades => "without genres or decades",
            VariantKind::DifficultyOnly => "difficulty only",
        }
    }
}

/// One step of the cascade: the effective filters and why they look like that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterVariant {
    pub kind: VariantKind,
    pub filters: Filters,
}

/// The ordered, monotonically loosening list of variants to try.
pub fn variants_for(filters: &Filters) -> Vec<FilterVariant> {
    let original = FilterVariant {
        kind: VariantKind::Original,
        filters: filters.clone(),
    };
    if !filters.relax_filters {
        return vec![original];
    }

    let without_genres = Filters {
        genres: BTreeSet::new(),
        ..filters.clone()
    };
    let without_genres_or_decades = Filters {
        decades: BTreeSet::new(),
        ..without_genres.clone()
    };
    let difficulty_only = Filters {
        difficulty: filters.difficulty.clone(),
        ..Filters::default()
    };

    vec![
        original,
        FilterVariant {
            kind: VariantKind::WithoutGenres,
            filters: without_genres,
        },
        FilterVariant {
            kind: VariantKind::WithoutGenresOrDecades,
            filters: without_genres_or_decades,
        },
        FilterVariant {
            kind: VariantKind::DifficultyOnly,
            filters: difficulty_only,
        },
    ]
}

/// Keeps tracks released in one of `decades`; no decades keeps everything.
pub fn filter_by_decades(tracks: Vec<Track>, decades: &BTreeSet<Decade>) -> Vec<Track> {
    if decades.is_empty() {
        return tracks;
    }

    tracks
        .into_iter()
        .filter(|track| {
            track
                .album
                .release_date
                .as_deref()
                .and_then(utils::release_year)
                .is_some_and(|year| decades.iter().any(|d| d.contains(year)))
        })
        .collect()
}

/// Fixed bands when labels are given, percentile cuts over `tracks` otherwise.
pub fn filter_by_difficulty(tracks: Vec<Track>, labels: &BTreeSet<Difficulty>) -> Vec<Track> {
    if tracks.is_empty() {
        return tracks;
    }

    match difficulty::window_for(labels) {
        Some(window) => tracks
            .into_iter()
            .filter(|t| window.contains(t.popularity))
            .collect(),
        None => {
            let popularities: Vec<u32> = tracks.iter().map(|t| t.popularity).collect();
            let cuts = PercentileCuts::from_popularities(&popularities);
            tracks
                .into_iter()
                .filter(|t| cuts.contains(t.popularity))
                .collect()
        }
    }
}

/// Tracks with a preview clip; empty when none has one.
pub fn playable_only(tracks: Vec<Track>) -> Vec<Track> {
    tracks.into_iter().filter(Track::has_preview).collect()
}

/// Inclusive year span covering every requested decade.
pub fn year_envelope(decades: &BTreeSet<Decade>) -> Option<(i32, i32)> {
    let from = decades.iter().map(|d| d.start_year()).min()?;
    let to = decades.iter().map(|d| d.end_year()).max()?;
    Some((from, to))
}
