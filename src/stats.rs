//! Emotion Statistics
//!
//! Computes a `StatisticsSummary` for one user's entries inside a selection
//! window. The summary is a pure function of the entry list, the selection
//! and the reference instant; nothing here holds state.
//!
//! # Example
//!
//! ```rust
//! use emotrack::emotion::{EmotionCategory, EmotionEntry, TimeSelection, UserId};
//! use emotrack::stats::compute_summary;
//!
//! let entry = EmotionEntry::new(UserId::from("kid-1"), EmotionCategory::Happy, 4).unwrap();
//! let selection = TimeSelection::Day(entry.timestamp.date_naive());
//!
//! let summary = compute_summary(&[entry], &selection);
//! assert_eq!(summary.count, 1);
//! assert_eq!(summary.average_rating, 4.0);
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::emotion::{EmotionCategory, EmotionEntry, TimeSelection};

/// Maximum number of ratings in the trend series
pub const TREND_LEN: usize = 7;

/// Width of the trailing window counted by `trailing_week_count`
pub const TRAILING_WINDOW_DAYS: i64 = 7;

/// Derived statistics for a selection window (never persisted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    /// Number of entries in the window
    pub count: usize,
    /// Mean rating in the window, 0 when empty
    pub average_rating: f64,
    /// Fraction of entries per category present in the window
    pub distribution: BTreeMap<EmotionCategory, f64>,
    /// Entries of the whole history newer than now minus seven days
    pub trailing_week_count: usize,
    /// Most frequent category in the window
    #[serde(serialize_with = "serialize_modal")]
    pub modal_category: Option<EmotionCategory>,
    /// Ratings of the latest entries in the window, oldest first
    pub recent_trend: Vec<u8>,
}

fn serialize_modal<S>(modal: &Option<EmotionCategory>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(modal.map(|c| c.label()).unwrap_or(""))
}

impl StatisticsSummary {
    /// The zero-valued summary
    pub fn empty() -> Self {
        Self {
            count: 0,
            average_rating: 0.0,
            distribution: BTreeMap::new(),
            trailing_week_count: 0,
            modal_category: None,
            recent_trend: Vec::new(),
        }
    }

    /// Modal category label, or the empty string when the window is empty
    pub fn modal_label(&self) -> &'static str {
        self.modal_category.map(|c| c.label()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for StatisticsSummary {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for StatisticsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "count={}, avg={:.2}, modal={}, last_7_days={}",
            self.count,
            self.average_rating,
            if self.modal_label().is_empty() { "-" } else { self.modal_label() },
            self.trailing_week_count
        )
    }
}

/// Entries inside the selection window, sorted by timestamp ascending
///
/// The sort is stable: entries sharing a timestamp keep their input order.
pub fn filter_entries<'a>(
    entries: &'a [EmotionEntry],
    selection: &TimeSelection,
) -> Vec<&'a EmotionEntry> {
    let mut filtered: Vec<&EmotionEntry> = entries
        .iter()
        .filter(|e| selection.contains(&e.timestamp))
        .collect();
    filtered.sort_by_key(|e| e.timestamp);
    filtered
}

/// Compute the summary relative to the current time
pub fn compute_summary(entries: &[EmotionEntry], selection: &TimeSelection) -> StatisticsSummary {
    compute_summary_at(entries, selection, Utc::now())
}

/// Compute the summary relative to `now`
///
/// Only `trailing_week_count` depends on `now`, and it is counted over the
/// whole `entries` slice rather than the selection window.
pub fn compute_summary_at(
    entries: &[EmotionEntry],
    selection: &TimeSelection,
    now: DateTime<Utc>,
) -> StatisticsSummary {
    let cutoff = now - Duration::days(TRAILING_WINDOW_DAYS);
    let trailing_week_count = entries.iter().filter(|e| e.timestamp > cutoff).count();

    let filtered = filter_entries(entries, selection);
    if filtered.is_empty() {
        return StatisticsSummary {
            trailing_week_count,
            ..StatisticsSummary::empty()
        };
    }

    let count = filtered.len();
    let total: u64 = filtered.iter().map(|e| e.rating as u64).sum();
    let average_rating = total as f64 / count as f64;

    // Per-category counts in order of first occurrence
    let mut counts: Vec<(EmotionCategory, usize)> = Vec::new();
    for entry in &filtered {
        match counts.iter_mut().find(|(c, _)| *c == entry.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.category, 1)),
        }
    }

    let distribution = counts
        .iter()
        .map(|&(category, n)| (category, n as f64 / count as f64))
        .collect();

    // Strict comparison keeps the earliest category on ties
    let mut modal: Option<(EmotionCategory, usize)> = None;
    for &(category, n) in &counts {
        if modal.map_or(true, |(_, best)| n > best) {
            modal = Some((category, n));
        }
    }

    let recent_trend = filtered
        .iter()
        .skip(count.saturating_sub(TREND_LEN))
        .map(|e| e.rating)
        .collect();

    StatisticsSummary {
        count,
        average_rating,
        distribution,
        trailing_week_count,
        modal_category: modal.map(|(c, _)| c),
        recent_trend,
    }
}
