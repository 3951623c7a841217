#![forbid(unsafe_code)]

//! Visibility tracking.
//!
//! [`VisibilityTracker`] owns the observer lifecycle and the visibility
//! snapshot. `start` acquires the environment's observer and `stop` releases
//! it; any failure part-way through `start` releases what was acquired before
//! returning, so no callback can outlive the tracker.

use secnav_core::{ObserverOptions, SectionRegistry, VisibilitySnapshot};

use crate::feed::BatchFeed;
use crate::host::{ObserveError, VisibilityObserver};

/// Observer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Never started.
    Idle,
    /// Observing; batches flow through the feed.
    Tracking,
    /// The environment has no observer; tracking is disabled.
    Unsupported,
    /// Stopped after having been started.
    Stopped,
}

/// Result of draining the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ingest {
    pub batches: usize,
    /// At least one batch changed the snapshot.
    pub changed: bool,
}

/// Observes section visibility and keeps the sparse snapshot current.
#[derive(Debug)]
pub struct VisibilityTracker {
    state: TrackerState,
    feed: Option<BatchFeed>,
    snapshot: VisibilitySnapshot,
    observed: usize,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            feed: None,
            snapshot: VisibilitySnapshot::new(),
            observed: 0,
        }
    }

    /// Begin observing every registered section.
    ///
    /// Sections without an element are skipped. Returns the number of
    /// sections actually observed. Restarting stops the previous observation
    /// first; each start gets a fresh feed.
    pub fn start<O: VisibilityObserver + ?Sized>(
        &mut self,
        registry: &SectionRegistry,
        options: &ObserverOptions,
        observer: &mut O,
    ) -> Result<usize, ObserveError> {
        if self.state == TrackerState::Tracking {
            self.stop(observer);
        }
        if !observer.is_supported() {
            self.state = TrackerState::Unsupported;
            tracing::warn!(message = "tracker.unsupported", tracking = false);
            return Err(ObserveError::Unsupported);
        }

        let feed = BatchFeed::new();
        if let Err(err) = observer.connect(options, feed.sender()) {
            feed.close();
            self.state = if err == ObserveError::Unsupported {
                TrackerState::Unsupported
            } else {
                TrackerState::Stopped
            };
            tracing::warn!(message = "tracker.connect_failed", error = %err);
            return Err(err);
        }

        let mut observed = 0usize;
        for id in registry.ids() {
            match observer.observe(id) {
                Ok(()) => observed += 1,
                Err(ObserveError::MissingElement(missing)) => {
                    tracing::debug!(message = "tracker.skip_missing", section = %missing);
                }
                Err(err) => {
                    // Release everything acquired so far.
                    observer.disconnect();
                    feed.close();
                    self.state = TrackerState::Stopped;
                    tracing::warn!(message = "tracker.observe_failed", section = %id, error = %err);
                    return Err(err);
                }
            }
        }

        tracing::debug!(message = "tracker.start", observed, total = registry.len());
        self.feed = Some(feed);
        self.observed = observed;
        self.state = TrackerState::Tracking;
        Ok(observed)
    }

    /// Release the observer and forget all metrics. Idempotent.
    pub fn stop<O: VisibilityObserver + ?Sized>(&mut self, observer: &mut O) {
        if let Some(feed) = self.feed.take() {
            feed.close();
            observer.disconnect();
            tracing::debug!(message = "tracker.stop", dropped = feed.dropped());
        }
        self.snapshot.clear();
        self.observed = 0;
        if self.state == TrackerState::Tracking {
            self.state = TrackerState::Stopped;
        }
    }

    /// Merge the next queued batch.
    ///
    /// Returns `None` when no batch is waiting, otherwise whether the batch
    /// changed the snapshot.
    pub fn ingest_next(&mut self, registry: &SectionRegistry) -> Option<bool> {
        let batch = self.feed.as_mut()?.next()?;
        let changed = self.snapshot.merge(&batch, registry);
        tracing::trace!(message = "tracker.batch", entries = batch.len(), changed);
        Some(changed)
    }

    /// Drain every queued batch.
    pub fn ingest(&mut self, registry: &SectionRegistry) -> Ingest {
        let mut summary = Ingest::default();
        while let Some(changed) = self.ingest_next(registry) {
            summary.batches += 1;
            summary.changed |= changed;
        }
        summary
    }

    /// Forget the metric for a section whose element went away.
    pub fn forget(&mut self, id: &str) -> bool {
        self.snapshot.remove(id).is_some()
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.state == TrackerState::Tracking
    }

    #[must_use]
    pub fn snapshot(&self) -> &VisibilitySnapshot {
        &self.snapshot
    }

    /// Number of sections observed by the current `start`.
    #[must_use]
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Batches queued but not yet merged.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.feed.as_ref().map_or(0, BatchFeed::pending)
    }
}
