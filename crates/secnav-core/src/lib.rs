#![forbid(unsafe_code)]

//! Core: section registry, visibility model, and the active-section resolver.
//!
//! # Role in secnav
//! `secnav-core` is the leaf layer. It owns the immutable section ordering,
//! the per-section visibility metrics reported by the environment, the
//! canonical input events, and the pure function that decides which section
//! is active.
//!
//! # Primary responsibilities
//! - **SectionRegistry**: validated, ordered, immutable list of sections.
//! - **VisibilitySnapshot**: sparse map of the latest metric per section.
//! - **resolve_active**: rank/tie-break policy turning a snapshot into one id.
//! - **NavEvent**: normalized inputs (clicks, fragment changes, scroll, resize).
//!
//! # How it fits in the system
//! The runtime (`secnav-runtime`) owns navigation state and host effects and
//! calls into this crate for every decision. Nothing here performs I/O, so
//! every type is usable on `wasm32-unknown-unknown` and in deterministic tests.

pub mod event;
pub mod geometry;
pub mod logging;
pub mod resolver;
pub mod section;
pub mod visibility;

pub use event::{NavEvent, NavKey, TimerToken};
pub use geometry::{ElementBounds, IndicatorGeometry, TabBounds};
pub use resolver::{TieBreak, rank, resolve_active};
pub use section::{RegistryError, SectionDescriptor, SectionId, SectionRegistry};
pub use visibility::{ObserverOptions, VisibilityBatch, VisibilityMetric, VisibilitySnapshot};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, info_span, trace, warn};
