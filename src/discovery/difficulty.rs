//! Maps difficulty labels to popularity ranges.
//!
//! With explicit labels every label owns a fixed popularity band and several
//! labels merge into the envelope `[min(lows), max(highs)]`. The envelope keeps
//! the query expressible as one min/max pair, at the price of admitting values
//! between non-adjacent bands (`{easy, hard}` covers the whole 0..=100 range).
//!
//! Without labels the cascade falls back to percentile cuts computed over the
//! candidates it already fetched.

use std::collections::BTreeSet;

use crate::types::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularityWindow {
    pub min: u32,
    pub max: u32,
}

impl PopularityWindow {
    pub const FULL: PopularityWindow = PopularityWindow { min: 0, max: 100 };

    pub fn contains(&self, popularity: u32) -> bool {
        popularity >= self.min && popularity <= self.max
    }
}

pub fn band(difficulty: Difficulty) -> PopularityWindow {
    match difficulty {
        Difficulty::Easy => PopularityWindow { min: 70, max: 100 },
        Difficulty::Medium => PopularityWindow { min: 40, max: 80 },
        Difficulty::Hard => PopularityWindow { min: 0, max: 50 },
        Difficulty::Expert => PopularityWindow { min: 0, max: 30 },
    }
}

/// Envelope of the selected bands, or `None` when nothing is selected.
pub fn window_for(labels: &BTreeSet<Difficulty>) -> Option<PopularityWindow> {
    let min = labels.iter().map(|d| band(*d).min).min()?;
    let max = labels.iter().map(|d| band(*d).max).max()?;
    Some(PopularityWindow { min, max })
}

/// Window for a recommendations query; no labels means the full range.
pub fn query_window(labels: &BTreeSet<Difficulty>) -> PopularityWindow {
    window_for(labels).unwrap_or(PopularityWindow::FULL)
}

/// Nearest-rank percentile of an ascending slice; `0` for an empty one.
pub fn percentile(sorted: &[u32], p: u32) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let index = (p as usize * sorted.len()) / 100;
    sorted[index.min(sorted.len() - 1)]
}

/// 25th and 75th percentile of a candidate set's popularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentileCuts {
    pub hard_cut: u32,
    pub easy_cut: u32,
}

impl PercentileCuts {
    pub fn from_popularities(popularities: &[u32]) -> Self {
        let mut sorted = popularities.to_vec();
        sorted.sort_unstable();
        Self {
            hard_cut: percentile(&sorted, 25),
            easy_cut: percentile(&sorted, 75),
        }
    }

    pub fn classify(&self, popularity: u32) -> Difficulty {
        if popularity >= self.easy_cut {
            Difficulty::Easy
        } else if popularity <= self.hard_cut {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    }

    /// Whether `popularity` lies within `[hard_cut, easy_cut]`.
    pub fn contains(&self, popularity: u32) -> bool {
        popularity >= self.hard_cut && popularity <= self.easy_cut
    }
}
