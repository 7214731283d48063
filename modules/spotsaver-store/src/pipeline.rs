//! Search, tag filtering and sorting for the spot list.
//!
//! Pure functions over the full in-memory collection. Nothing is cached: the
//! display list is derived from scratch on every read.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use icu_collator::{Collator, CollatorOptions};
use serde::{Deserialize, Serialize};

use spotsaver_common::{SortKey, Spot};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The list view's inputs: free-text search, selected tags, sort key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotQuery {
    pub search: String,
    pub tags: Vec<String>,
    pub sort: SortKey,
}

impl SpotQuery {
    pub fn new(search: impl Into<String>, tags: Vec<String>, sort: SortKey) -> Self {
        Self {
            search: search.into(),
            tags,
            sort,
        }
    }

    /// Select the tag if it is not selected, deselect it otherwise.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = SpotQuery::default();
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || !self.tags.is_empty() || self.sort != SortKey::Recent
    }
}

/// Header counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpotStats {
    pub total: usize,
    pub visited: usize,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Case-insensitive substring match on name, location or notes.
pub fn matches_search(spot: &Spot, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    spot.name.to_lowercase().contains(&needle)
        || spot.location.to_lowercase().contains(&needle)
        || spot.notes_or_empty().to_lowercase().contains(&needle)
}

/// True when no tags are selected or the spot carries at least one of them.
pub fn matches_tags(spot: &Spot, selected: &[String]) -> bool {
    selected.is_empty() || selected.iter().any(|t| spot.tags.contains(t))
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

thread_local! {
    static COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// CLDR root collation at tertiary strength: accents and case only break
/// ties, and lowercase sorts before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a)),
        })
        .then_with(|| a.cmp(b))
}

fn compare(sort: SortKey, a: &Spot, b: &Spot) -> Ordering {
    match sort {
        SortKey::Name => locale_cmp(&a.name, &b.name),
        SortKey::Location => locale_cmp(&a.location, &b.location),
        SortKey::Rating => {
            let ra = a.rating.map(|r| r.value()).unwrap_or(0);
            let rb = b.rating.map(|r| r.value()).unwrap_or(0);
            rb.cmp(&ra)
        }
        SortKey::Recent => b.created_at.cmp(&a.created_at),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Filter by search and tags, then sort. The sort is stable, so ties keep
/// the collection's own (most-recent-first) order.
pub fn filter_spots<'a, I>(spots: I, query: &SpotQuery) -> Vec<&'a Spot>
where
    I: IntoIterator<Item = &'a Spot>,
{
    let mut filtered: Vec<&Spot> = spots
        .into_iter()
        .filter(|s| matches_search(s, &query.search) && matches_tags(s, &query.tags))
        .collect();

    filtered.sort_by(|a, b| compare(query.sort, a, b));
    filtered
}

/// Every tag in use, deduplicated, in ascending order.
pub fn available_tags<'a, I>(spots: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Spot>,
{
    spots
        .into_iter()
        .flat_map(|s| s.tags.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

pub fn stats<'a, I>(spots: I) -> SpotStats
where
    I: IntoIterator<Item = &'a Spot>,
{
    spots.into_iter().fold(SpotStats::default(), |mut acc, s| {
        acc.total += 1;
        if s.is_visited() {
            acc.visited += 1;
        }
        acc
    })
}
