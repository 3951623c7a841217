#![forbid(unsafe_code)]

//! Address-fragment synchronization.
//!
//! Tracker-driven changes rewrite the fragment in place; explicit navigation
//! adds a history entry. Neither path ever scrolls: scrolling belongs to the
//! navigation controller. Writes are skipped when the fragment already shows
//! the id, so repeated syncs are harmless.

use std::borrow::Cow;

use secnav_core::{SectionId, SectionRegistry};

use crate::host::Location;

/// How an externally supplied fragment relates to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentChange {
    /// Names a registered section.
    Section(SectionId),
    /// Non-empty but not a registered id.
    Unknown(String),
    /// No fragment at all (`""` or `"#"`).
    Empty,
}

/// Kind of fragment write performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentWrite {
    Replaced,
    Pushed,
}

/// Mirrors the active id into the address fragment.
#[derive(Debug, Default)]
pub struct HashSynchronizer;

impl HashSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker-driven path: rewrite the fragment without a history entry.
    pub fn sync_tracked<L: Location + ?Sized>(
        &self,
        active: &SectionId,
        location: &mut L,
    ) -> Option<FragmentWrite> {
        if shows(location, active) {
            return None;
        }
        location.replace_fragment(active);
        tracing::trace!(message = "hash.replace", section = %active);
        Some(FragmentWrite::Replaced)
    }

    /// User-driven path: add a history entry for `target`.
    ///
    /// Navigating to the section the fragment already shows adds nothing.
    pub fn sync_navigated<L: Location + ?Sized>(
        &self,
        target: &SectionId,
        location: &mut L,
    ) -> Option<FragmentWrite> {
        if shows(location, target) {
            return None;
        }
        location.push_fragment(target);
        tracing::trace!(message = "hash.push", section = %target);
        Some(FragmentWrite::Pushed)
    }

    /// Classify an externally changed fragment.
    #[must_use]
    pub fn interpret(&self, raw: &str, registry: &SectionRegistry) -> FragmentChange {
        let decoded = decode_fragment(raw);
        if decoded.is_empty() {
            return FragmentChange::Empty;
        }
        match registry.get(&decoded) {
            Some(section) => FragmentChange::Section(section.id.clone()),
            None => FragmentChange::Unknown(decoded.into_owned()),
        }
    }
}

fn shows<L: Location + ?Sized>(location: &L, id: &SectionId) -> bool {
    location
        .fragment()
        .is_some_and(|current| decode_fragment(&current) == id.as_str())
}

/// Strip a leading `#` and percent-decode.
///
/// Malformed escapes are kept verbatim. Escapes that decode to invalid UTF-8
/// leave the whole fragment undecoded.
#[must_use]
pub fn decode_fragment(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.strip_prefix('#').unwrap_or(raw);
    urlencoding::decode(trimmed).unwrap_or(Cow::Borrowed(trimmed))
}
