#![forbid(unsafe_code)]

//! Canonical navigator input events.
//!
//! Hosts translate whatever their environment emits (DOM events, JSON from a
//! JS shell, a simulated page) into [`NavEvent`] values. Visibility batches
//! are not events: they travel through the runtime's batch feed so they can
//! be consumed lazily.

use crate::section::SectionId;

/// Opaque handle for a wake-up scheduled with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Keyboard movement across the tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Previous,
    First,
    Last,
}

impl NavKey {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" | "Right" => Some(Self::Next),
            "ArrowLeft" | "Left" => Some(Self::Previous),
            "Home" => Some(Self::First),
            "End" => Some(Self::Last),
            _ => None,
        }
    }
}

/// Input to the navigator.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// A tab or button asked to show this section.
    Activate(SectionId),
    /// The address fragment changed outside the navigator (back/forward,
    /// manual edit, deep link). Carries the raw fragment, `#` optional.
    FragmentChanged(String),
    /// The viewport scrolled; `offset` is the new document scroll position.
    Scrolled { offset: f64 },
    /// The environment reported that scrolling stopped.
    ScrollEnd,
    /// The viewport was resized.
    Resize { width: f64, height: f64 },
    /// The tab strip's layout changed (labels, fonts, locale).
    LayoutChanged,
    /// A wake-up scheduled via the host fired.
    Wake(TimerToken),
    /// Keyboard navigation on the tab strip.
    Key(NavKey),
    /// A section's element left the document; its visibility no longer counts.
    SectionDetached(SectionId),
}

impl NavEvent {
    /// Short, stable name for logs and transcripts.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Activate(_) => "activate",
            Self::FragmentChanged(_) => "fragment",
            Self::Scrolled { .. } => "scrolled",
            Self::ScrollEnd => "scroll_end",
            Self::Resize { .. } => "resize",
            Self::LayoutChanged => "layout",
            Self::Wake(_) => "wake",
            Self::Key(_) => "key",
            Self::SectionDetached(_) => "section_detached",
        }
    }
}
