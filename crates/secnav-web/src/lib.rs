#![forbid(unsafe_code)]

//! `secnav-web` embeds the navigator in a browser page driven from JS.
//!
//! Design goals:
//! - **Host-driven I/O**: the JS shell pushes section geometry, scroll and
//!   fragment changes, and observer batches; the engine never touches the DOM.
//! - **Command outbox**: every effect (scroll, fragment write, wake-up,
//!   observer wiring) is queued as a [`HostCommand`] for the shell to apply.
//! - **Deterministic time**: the shell advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.

#[cfg(feature = "input-parser")]
pub mod input_parser;
pub mod step;
#[cfg(all(target_arch = "wasm32", feature = "input-parser"))]
pub mod wasm;

use std::collections::{HashMap, HashSet};

use secnav_core::{ObserverOptions, SectionId, TabBounds, TimerToken, VisibilityBatch};
use secnav_runtime::{
    BatchSender, Location, MeasureError, ObserveError, ScrollBehavior, TabStrip, Timers, Viewport,
    VisibilityObserver,
};
use web_time::Duration;

pub use step::{HostInput, StepNavigator, StepResult};

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Time never runs backwards.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

/// An effect the JS shell must perform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "input-parser", derive(serde::Serialize))]
#[cfg_attr(
    feature = "input-parser",
    serde(tag = "op", rename_all = "snake_case")
)]
pub enum HostCommand {
    /// `window.scrollTo({ top, behavior })`.
    ScrollTo { offset: f64, smooth: bool },
    /// `history.replaceState` with `#id`.
    ReplaceFragment { id: String },
    /// `history.pushState` with `#id`.
    PushFragment { id: String },
    /// `tab.scrollIntoView({ inline: "center" })`.
    RevealTab { id: String },
    /// `setTimeout`, reporting back a `wake` input with `token`.
    ScheduleWake { token: u64, after_ms: u64 },
    /// `clearTimeout` for `token`.
    CancelWake { token: u64 },
    /// Create the `IntersectionObserver`.
    Connect {
        root_margin: String,
        thresholds: Vec<f64>,
    },
    /// `observer.observe(document.getElementById(id))`.
    Observe { id: String },
    /// `observer.disconnect()`.
    Disconnect,
}

/// Page state mirrored from the JS shell, plus the command outbox.
#[derive(Debug)]
pub struct WebHost {
    section_tops: HashMap<String, f64>,
    tabs: HashMap<String, TabBounds>,
    detached_tabs: HashSet<String>,
    scroll_offset: f64,
    fragment: Option<String>,
    observer_supported: bool,
    sender: Option<BatchSender>,
    next_token: u64,
    outbox: Vec<HostCommand>,
}

impl Default for WebHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WebHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            section_tops: HashMap::new(),
            tabs: HashMap::new(),
            detached_tabs: HashSet::new(),
            scroll_offset: 0.0,
            fragment: None,
            observer_supported: true,
            sender: None,
            next_token: 0,
            outbox: Vec::new(),
        }
    }

    /// Record a section element's document-relative top.
    pub fn set_section_top(&mut self, id: impl Into<String>, top: f64) {
        self.section_tops.insert(id.into(), top);
    }

    /// Record a tab's measured bounds; clears any detached mark.
    pub fn set_tab(&mut self, id: impl Into<String>, bounds: TabBounds) {
        let id = id.into();
        self.detached_tabs.remove(&id);
        self.tabs.insert(id, bounds);
    }

    /// Mark a tab element as removed from the document.
    pub fn detach_tab(&mut self, id: impl Into<String>) {
        self.detached_tabs.insert(id.into());
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    /// Mirror `location.hash` (with or without `#`).
    pub fn set_fragment(&mut self, fragment: Option<String>) {
        self.fragment = fragment
            .map(|f| f.strip_prefix('#').map(str::to_owned).unwrap_or(f))
            .filter(|f| !f.is_empty());
    }

    /// Whether the page has `IntersectionObserver`.
    pub fn set_observer_supported(&mut self, supported: bool) {
        self.observer_supported = supported;
    }

    /// Forward an observer callback. Returns `false` once disconnected.
    pub fn deliver(&self, batch: VisibilityBatch) -> bool {
        self.sender.as_ref().is_some_and(|tx| tx.send(batch))
    }

    /// Take every queued command in emission order.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.outbox)
    }

    #[must_use]
    pub fn pending_commands(&self) -> &[HostCommand] {
        &self.outbox
    }

    fn emit(&mut self, command: HostCommand) {
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "web.command", command = ?command);
        self.outbox.push(command);
    }
}

impl Viewport for WebHost {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        self.section_tops.get(id.as_str()).copied()
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        self.emit(HostCommand::ScrollTo {
            offset,
            smooth: behavior == ScrollBehavior::Smooth,
        });
    }
}

impl Location for WebHost {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
        self.emit(HostCommand::ReplaceFragment { id: id.to_string() });
    }

    fn push_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
        self.emit(HostCommand::PushFragment { id: id.to_string() });
    }
}

impl TabStrip for WebHost {
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError> {
        if self.detached_tabs.contains(id.as_str()) {
            return Err(MeasureError::Detached(id.clone()));
        }
        self.tabs
            .get(id.as_str())
            .copied()
            .ok_or_else(|| MeasureError::Missing(id.clone()))
    }

    fn reveal_tab(&mut self, id: &SectionId) {
        self.emit(HostCommand::RevealTab { id: id.to_string() });
    }
}

impl VisibilityObserver for WebHost {
    fn is_supported(&self) -> bool {
        self.observer_supported
    }

    fn connect(
        &mut self,
        options: &ObserverOptions,
        sender: BatchSender,
    ) -> Result<(), ObserveError> {
        if !self.observer_supported {
            return Err(ObserveError::Unsupported);
        }
        self.sender = Some(sender);
        self.emit(HostCommand::Connect {
            root_margin: options.root_margin_css(),
            thresholds: options.thresholds.clone(),
        });
        Ok(())
    }

    fn observe(&mut self, id: &SectionId) -> Result<(), ObserveError> {
        if !self.section_tops.contains_key(id.as_str()) {
            return Err(ObserveError::MissingElement(id.clone()));
        }
        self.emit(HostCommand::Observe { id: id.to_string() });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.sender = None;
        self.emit(HostCommand::Disconnect);
    }
}

impl Timers for WebHost {
    fn schedule_wake(&mut self, after: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.emit(HostCommand::ScheduleWake {
            token: token.0,
            after_ms: after.as_millis() as u64,
        });
        token
    }

    fn cancel_wake(&mut self, token: TimerToken) {
        self.emit(HostCommand::CancelWake { token: token.0 });
    }
}
