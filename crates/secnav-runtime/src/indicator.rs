#![forbid(unsafe_code)]

//! Sliding-highlight geometry.
//!
//! Purely advisory: nothing here feeds back into navigation state. A failed
//! measurement skips the tick and keeps the last good geometry, so the next
//! successful recompute recovers on its own.

use secnav_core::{IndicatorGeometry, SectionId};

use crate::host::TabStrip;

/// What prompted a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    ActiveChanged,
    Resize,
    LayoutChanged,
}

impl RecomputeReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActiveChanged => "active_changed",
            Self::Resize => "resize",
            Self::LayoutChanged => "layout_changed",
        }
    }
}

/// Derives indicator geometry for the active tab.
#[derive(Debug, Clone)]
pub struct IndicatorPositioner {
    inset: f64,
    current: Option<IndicatorGeometry>,
    skipped: u64,
}

impl IndicatorPositioner {
    #[must_use]
    pub fn new(inset: f64) -> Self {
        Self {
            inset: inset.max(0.0),
            current: None,
            skipped: 0,
        }
    }

    /// Measure the tab for `active`.
    ///
    /// Returns the new geometry only when it differs from the last one
    /// emitted.
    pub fn recompute<S: TabStrip + ?Sized>(
        &mut self,
        active: &SectionId,
        strip: &S,
        reason: RecomputeReason,
    ) -> Option<IndicatorGeometry> {
        let tab = match strip.measure_tab(active) {
            Ok(tab) => tab,
            Err(err) => {
                self.skipped += 1;
                tracing::debug!(
                    message = "indicator.skip",
                    section = %active,
                    reason = reason.as_str(),
                    error = %err,
                );
                return None;
            }
        };
        let geometry = IndicatorGeometry::for_tab(&tab, self.inset);
        if self.current.is_some_and(|current| current.approx_eq(&geometry)) {
            return None;
        }
        tracing::trace!(
            message = "indicator.move",
            section = %active,
            reason = reason.as_str(),
            left = geometry.left,
            width = geometry.width,
        );
        self.current = Some(geometry);
        Some(geometry)
    }

    /// Last geometry emitted.
    #[must_use]
    pub fn current(&self) -> Option<IndicatorGeometry> {
        self.current
    }

    /// Measurements skipped because the tab could not be measured.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
