#![forbid(unsafe_code)]

//! secnav runtime
//!
//! The synchronization engine behind an in-page section navigator.
//!
//! # Key Components
//!
//! - [`SectionNavigator`] - one parameterized component owning navigation state
//! - [`NavigatorSession`] - RAII pairing of a navigator and its host
//! - [`VisibilityTracker`] - observer lifecycle and sparse visibility snapshot
//! - [`BatchFeed`] - lazy, non-restartable sequence of visibility batches
//! - [`HashSynchronizer`] - mirrors the active id into the address fragment
//! - [`NavigationController`] - explicit jumps and the suppression window
//! - [`IndicatorPositioner`] - advisory geometry for the sliding highlight
//! - [`Observable`] - change-notifying outputs for renderers
//! - [`NavigatorConfig`] - every tunable, loadable with `nav-config`
//!
//! # Role in secnav
//! `secnav-runtime` is the orchestrator. It consumes [`secnav_core::NavEvent`]s
//! and visibility batches from a [`Host`], calls the pure resolver in
//! `secnav-core`, and performs effects (scrolling, fragment writes, wake-ups)
//! back through the host.
//!
//! # How it fits in the system
//! Hosts live elsewhere: `secnav-web` drives the engine from a browser shell
//! and `secnav-harness` from a simulated page. Nothing here blocks or spawns;
//! time is always passed in by the caller.

pub mod config;
pub mod controller;
pub mod feed;
pub mod hash_sync;
pub mod host;
pub mod indicator;
pub mod navigator;
pub mod observable;
pub mod session;
pub mod tracker;

#[cfg(test)]
mod test_host;

pub use config::{ConfigError, NavigatorConfig, ObserverConfig, ScrollPolicy};
pub use controller::{
    Navigation, NavigationController, NavigationMode, NavigationOrigin, NavigationStarted,
    SettleReason, Settled,
};
pub use feed::{BatchFeed, BatchSender};
pub use hash_sync::{FragmentChange, FragmentWrite, HashSynchronizer, decode_fragment};
pub use host::{
    Host, Location, MeasureError, ObserveError, ScrollBehavior, TabStrip, Timers, Viewport,
    VisibilityObserver,
};
pub use indicator::{IndicatorPositioner, RecomputeReason};
pub use navigator::{NavigationState, NavigatorStats, SectionNavigator, TabLabel};
pub use observable::{Observable, Subscription};
pub use session::NavigatorSession;
pub use tracker::{Ingest, TrackerState, VisibilityTracker};
