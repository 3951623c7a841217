#![forbid(unsafe_code)]

//! Active-section resolution.
//!
//! [`resolve_active`] is a pure function of the registry, the visibility
//! snapshot, and the previous answer. It never allocates state between calls.
//!
//! # Policy
//!
//! 1. Each observed section gets a rank: its top offset when it starts at or
//!    below the activation line, `0` when its span crosses the line, and no
//!    rank (+∞) when it has been scrolled past entirely.
//! 2. Lowest rank wins; [`TieBreak`] decides how the intersection ratio
//!    participates.
//! 3. Remaining ties go to the section that comes first in registry order.
//! 4. With no ranked section the previous id is kept. With no previous id the
//!    fragment's section (if registered) or the first section is returned.
//!
//! # Invariants
//!
//! The result is always a registered id, and equals `previous` whenever no
//! section has a finite rank.

use crate::section::{SectionId, SectionRegistry};
use crate::visibility::{VisibilityMetric, VisibilitySnapshot};

/// Ordering between distance to the activation line and intersection ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TieBreak {
    /// Rank ascending, then ratio descending.
    #[default]
    DistanceFirst,
    /// Ratio descending, then rank ascending, among ranked sections.
    RatioFirst,
}

/// Rank of one metric, or `None` when the section is fully above the line.
#[inline]
#[must_use]
pub fn rank(metric: &VisibilityMetric) -> Option<f64> {
    if metric.top_offset.is_nan() {
        return None;
    }
    if metric.top_offset >= 0.0 {
        Some(metric.top_offset)
    } else if metric.straddles_line() {
        Some(0.0)
    } else {
        None
    }
}

struct Candidate<'a> {
    id: &'a SectionId,
    order: usize,
    rank: f64,
    ratio: f64,
}

impl Candidate<'_> {
    fn beats(&self, other: &Self, tie_break: TieBreak) -> bool {
        use std::cmp::Ordering;

        let by_rank = self.rank.total_cmp(&other.rank);
        // Higher ratio first.
        let by_ratio = other.ratio.total_cmp(&self.ratio);
        let primary = match tie_break {
            TieBreak::DistanceFirst => by_rank.then(by_ratio),
            TieBreak::RatioFirst => by_ratio.then(by_rank),
        };
        primary.then(self.order.cmp(&other.order)) == Ordering::Less
    }
}

/// Pick the active section for `snapshot`.
///
/// `previous` is the currently active id; `fragment_hint` is consulted only
/// when there is no previous id yet (first measurement).
#[must_use]
pub fn resolve_active(
    registry: &SectionRegistry,
    snapshot: &VisibilitySnapshot,
    previous: Option<&SectionId>,
    fragment_hint: Option<&str>,
    tie_break: TieBreak,
) -> SectionId {
    let mut best: Option<Candidate<'_>> = None;
    for metric in snapshot.iter() {
        let Some(order) = registry.index_of(metric.section_id.as_str()) else {
            continue;
        };
        let Some(rank) = rank(metric) else {
            continue;
        };
        let candidate = Candidate {
            id: &metric.section_id,
            order,
            rank,
            ratio: metric.intersection_ratio,
        };
        match &best {
            Some(current) if !candidate.beats(current, tie_break) => {}
            _ => best = Some(candidate),
        }
    }

    if let Some(winner) = best {
        return winner.id.clone();
    }

    match previous {
        Some(prev) if registry.contains(prev.as_str()) => prev.clone(),
        _ => registry.initial_section(fragment_hint).id.clone(),
    }
}
