#![forbid(unsafe_code)]

//! Host capabilities.
//!
//! The navigator never touches a page directly. Everything it needs from the
//! embedding environment is expressed as one of these small traits, and
//! [`Host`] is their union. Implementations exist for a live DOM shell
//! (`secnav-web`), a simulated page (`secnav-harness`), and `&mut H` so a
//! session can borrow a host it does not own.

use core::fmt;

use secnav_core::{ObserverOptions, SectionId, TabBounds, TimerToken};
use web_time::Duration;

use crate::feed::BatchSender;

/// How a scroll request should animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Failure to observe a section element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The environment has no visibility observer.
    Unsupported,
    /// No element carries this section's id.
    MissingElement(SectionId),
    /// The observer rejected the request.
    Rejected(String),
}

impl fmt::Display for ObserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "visibility observer unavailable"),
            Self::MissingElement(id) => write!(f, "no element for section {id}"),
            Self::Rejected(reason) => write!(f, "observer rejected request: {reason}"),
        }
    }
}

impl std::error::Error for ObserveError {}

/// Failure to measure a tab control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureError {
    /// The tab element is not attached to the document.
    Detached(SectionId),
    /// No tab exists for this section.
    Missing(SectionId),
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached(id) => write!(f, "tab for {id} is detached"),
            Self::Missing(id) => write!(f, "no tab for {id}"),
        }
    }
}

impl std::error::Error for MeasureError {}

/// Document scrolling.
pub trait Viewport {
    /// Document-relative top of the section element, `None` if absent.
    fn section_top(&self, id: &SectionId) -> Option<f64>;

    /// Current document scroll offset.
    fn scroll_offset(&self) -> f64;

    /// Start scrolling the document to `offset`.
    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior);
}

/// The address fragment and session history.
pub trait Location {
    /// Current fragment without the leading `#`, `None` when absent.
    fn fragment(&self) -> Option<String>;

    /// Rewrite the fragment in place (no history entry, no scroll).
    fn replace_fragment(&mut self, id: &SectionId);

    /// Add a history entry carrying the fragment (no scroll).
    fn push_fragment(&mut self, id: &SectionId);
}

/// The tab controls rendered for each section.
pub trait TabStrip {
    /// Geometry of the tab for `id`.
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError>;

    /// Scroll the strip so the tab for `id` is visible. Optional.
    fn reveal_tab(&mut self, _id: &SectionId) {}
}

/// The environment's visibility observer.
pub trait VisibilityObserver {
    /// Whether visibility observation is available at all.
    fn is_supported(&self) -> bool;

    /// Create the observer; batches must be delivered through `sender`.
    fn connect(&mut self, options: &ObserverOptions, sender: BatchSender)
    -> Result<(), ObserveError>;

    /// Start observing the element for `id`.
    fn observe(&mut self, id: &SectionId) -> Result<(), ObserveError>;

    /// Stop observing everything and drop the sender.
    fn disconnect(&mut self);
}

/// One-shot wake-ups.
pub trait Timers {
    /// Ask the host to deliver `NavEvent::Wake(token)` after `after`.
    fn schedule_wake(&mut self, after: Duration) -> TimerToken;

    /// Cancel a pending wake-up. Unknown or fired tokens are ignored.
    fn cancel_wake(&mut self, token: TimerToken);
}

/// Everything a navigator needs from its environment.
pub trait Host: Viewport + Location + TabStrip + VisibilityObserver + Timers {}

impl<T> Host for T where T: Viewport + Location + TabStrip + VisibilityObserver + Timers {}

impl<T: Viewport + ?Sized> Viewport for &mut T {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        (**self).section_top(id)
    }

    fn scroll_offset(&self) -> f64 {
        (**self).scroll_offset()
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        (**self).scroll_to(offset, behavior);
    }
}

impl<T: Location + ?Sized> Location for &mut T {
    fn fragment(&self) -> Option<String> {
        (**self).fragment()
    }

    fn replace_fragment(&mut self, id: &SectionId) {
        (**self).replace_fragment(id);
    }

    fn push_fragment(&mut self, id: &SectionId) {
        (**self).push_fragment(id);
    }
}

impl<T: TabStrip + ?Sized> TabStrip for &mut T {
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError> {
        (**self).measure_tab(id)
    }

    fn reveal_tab(&mut self, id: &SectionId) {
        (**self).reveal_tab(id);
    }
}

impl<T: VisibilityObserver + ?Sized> VisibilityObserver for &mut T {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn connect(
        &mut self,
        options: &ObserverOptions,
        sender: BatchSender,
    ) -> Result<(), ObserveError> {
        (**self).connect(options, sender)
    }

    fn observe(&mut self, id: &SectionId) -> Result<(), ObserveError> {
        (**self).observe(id)
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

impl<T: Timers + ?Sized> Timers for &mut T {
    fn schedule_wake(&mut self, after: Duration) -> TimerToken {
        (**self).schedule_wake(after)
    }

    fn cancel_wake(&mut self, token: TimerToken) {
        (**self).cancel_wake(token);
    }
}
