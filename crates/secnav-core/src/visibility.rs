#![forbid(unsafe_code)]

//! Visibility metrics, batches, and the sparse snapshot.
//!
//! The environment reports visibility in batches that name only the sections
//! whose state changed. [`VisibilitySnapshot::merge`] applies a batch
//! sparsely and reports whether anything actually changed, which is what
//! makes duplicate delivery harmless.

use ahash::AHashMap;

use crate::geometry::ElementBounds;
use crate::section::{SectionId, SectionRegistry};

/// Latest visibility reading for one section.
///
/// Offsets are signed distances from the activation line: positive values lie
/// below it, negative values above it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityMetric {
    pub section_id: SectionId,
    /// Fraction of the element visible in the observer root, in `[0, 1]`.
    pub intersection_ratio: f64,
    /// Element top relative to the activation line.
    pub top_offset: f64,
    /// Element bottom relative to the activation line.
    pub bottom_offset: f64,
}

impl VisibilityMetric {
    /// Build a metric; the ratio is clamped to `[0, 1]` and NaN becomes `0`.
    #[must_use]
    pub fn new(
        section_id: impl Into<SectionId>,
        intersection_ratio: f64,
        top_offset: f64,
        bottom_offset: f64,
    ) -> Self {
        let ratio = if intersection_ratio.is_nan() {
            0.0
        } else {
            intersection_ratio.clamp(0.0, 1.0)
        };
        Self {
            section_id: section_id.into(),
            intersection_ratio: ratio,
            top_offset,
            bottom_offset: bottom_offset.max(top_offset),
        }
    }

    /// Convert viewport-relative bounds into offsets from `activation_line`.
    #[must_use]
    pub fn from_bounds(
        section_id: impl Into<SectionId>,
        intersection_ratio: f64,
        bounds: ElementBounds,
        activation_line: f64,
    ) -> Self {
        Self::new(
            section_id,
            intersection_ratio,
            bounds.top - activation_line,
            bounds.bottom() - activation_line,
        )
    }

    /// The element's span crosses the activation line.
    #[inline]
    #[must_use]
    pub fn straddles_line(&self) -> bool {
        self.top_offset < 0.0 && self.bottom_offset > 0.0
    }
}

/// Entries delivered by one environment callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibilityBatch {
    pub entries: Vec<VisibilityMetric>,
}

impl VisibilityBatch {
    #[must_use]
    pub fn new(entries: Vec<VisibilityMetric>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<VisibilityMetric> for VisibilityBatch {
    fn from_iter<I: IntoIterator<Item = VisibilityMetric>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Sparse map of the latest metric per observed section.
#[derive(Debug, Clone, Default)]
pub struct VisibilitySnapshot {
    metrics: AHashMap<SectionId, VisibilityMetric>,
}

impl VisibilitySnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `batch`, touching only the named entries.
    ///
    /// Entries for ids outside `registry` are dropped. When one batch names
    /// the same section twice the later entry wins. Returns `true` only if
    /// the snapshot changed.
    pub fn merge(&mut self, batch: &VisibilityBatch, registry: &SectionRegistry) -> bool {
        let mut changed = false;
        for metric in &batch.entries {
            if !registry.contains(metric.section_id.as_str()) {
                continue;
            }
            match self.metrics.get_mut(metric.section_id.as_str()) {
                Some(existing) if existing == metric => {}
                Some(existing) => {
                    *existing = metric.clone();
                    changed = true;
                }
                None => {
                    self.metrics
                        .insert(metric.section_id.clone(), metric.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Forget a section, e.g. when its element detaches.
    pub fn remove(&mut self, id: &str) -> Option<VisibilityMetric> {
        self.metrics.remove(id)
    }

    pub fn clear(&mut self) {
        self.metrics.clear();
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&VisibilityMetric> {
        self.metrics.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisibilityMetric> + '_ {
        self.metrics.values()
    }
}

/// Options handed to the environment's visibility observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Pixels trimmed from the top of the observer root.
    pub root_margin_top: f64,
    /// Fraction of the viewport height trimmed from the bottom of the root.
    pub root_margin_bottom_fraction: f64,
    /// Ratios at which the environment should report a crossing.
    pub thresholds: Vec<f64>,
    /// Distance of the activation line from the viewport top.
    pub activation_line: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin_top: 48.0,
            root_margin_bottom_fraction: 0.6,
            thresholds: vec![0.0, 0.1, 0.25, 0.5, 0.75, 1.0],
            activation_line: 68.0,
        }
    }
}

impl ObserverOptions {
    /// CSS `rootMargin` string, e.g. `"-48px 0px -60% 0px"`.
    #[must_use]
    pub fn root_margin_css(&self) -> String {
        format!(
            "-{}px 0px -{}% 0px",
            self.root_margin_top.max(0.0),
            (self.root_margin_bottom_fraction.clamp(0.0, 1.0) * 100.0).round()
        )
    }

    /// Observer root `[top, bottom)` for a viewport of `viewport_height`.
    #[must_use]
    pub fn root_span(&self, viewport_height: f64) -> (f64, f64) {
        let top = self.root_margin_top.max(0.0);
        let bottom = viewport_height
            * (1.0 - self.root_margin_bottom_fraction.clamp(0.0, 1.0));
        (top, bottom.max(top))
    }

    /// Index of the highest threshold at or below `ratio`, if any.
    #[must_use]
    pub fn threshold_bucket(&self, ratio: f64) -> Option<usize> {
        self.thresholds.iter().rposition(|&t| ratio >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SectionRegistry {
        SectionRegistry::from_pairs([("ch1", "a"), ("ch2", "b"), ("ch3", "c")]).expect("registry")
    }

    #[test]
    fn metric_clamps_ratio() {
        assert_eq!(VisibilityMetric::new("a", 1.7, 0.0, 1.0).intersection_ratio, 1.0);
        assert_eq!(VisibilityMetric::new("a", -0.2, 0.0, 1.0).intersection_ratio, 0.0);
        assert_eq!(VisibilityMetric::new("a", f64::NAN, 0.0, 1.0).intersection_ratio, 0.0);
    }

    #[test]
    fn from_bounds_offsets_against_line() {
        let m = VisibilityMetric::from_bounds("ch2", 0.5, ElementBounds::new(60.0, 400.0), 68.0);
        assert_eq!(m.top_offset, -8.0);
        assert_eq!(m.bottom_offset, 392.0);
        assert!(m.straddles_line());
    }

    #[test]
    fn merge_is_sparse_and_idempotent() {
        let reg = registry();
        let mut snap = VisibilitySnapshot::new();
        let batch = VisibilityBatch::new(vec![
            VisibilityMetric::new("ch1", 0.2, -100.0, 50.0),
            VisibilityMetric::new("ch2", 0.8, 50.0, 600.0),
        ]);
        assert!(snap.merge(&batch, &reg));
        assert!(!snap.merge(&batch, &reg));

        let partial = VisibilityBatch::new(vec![VisibilityMetric::new("ch2", 0.9, 40.0, 590.0)]);
        assert!(snap.merge(&partial, &reg));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("ch1").map(|m| m.intersection_ratio), Some(0.2));
        assert_eq!(snap.get("ch2").map(|m| m.top_offset), Some(40.0));
    }

    #[test]
    fn merge_ignores_unknown_ids() {
        let reg = registry();
        let mut snap = VisibilitySnapshot::new();
        let batch = VisibilityBatch::new(vec![VisibilityMetric::new("footer", 1.0, 0.0, 10.0)]);
        assert!(!snap.merge(&batch, &reg));
        assert!(snap.is_empty());
    }

    #[test]
    fn root_margin_matches_css() {
        let opts = ObserverOptions::default();
        assert_eq!(opts.root_margin_css(), "-48px 0px -60% 0px");
        assert_eq!(opts.root_span(1000.0), (48.0, 400.0));
    }

    #[test]
    fn threshold_bucket() {
        let opts = ObserverOptions::default();
        assert_eq!(opts.threshold_bucket(0.0), Some(0));
        assert_eq!(opts.threshold_bucket(0.3), Some(2));
        assert_eq!(opts.threshold_bucket(1.0), Some(5));
    }
}
