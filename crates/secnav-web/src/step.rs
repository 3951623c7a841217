#![forbid(unsafe_code)]

//! Step-driven navigator for host-driven shells.
//!
//! The JS shell pushes [`HostInput`]s as they happen, then calls
//! [`StepNavigator::step`] once per animation frame. A step applies queued
//! inputs in order, drains visibility batches, checks the settle deadline,
//! and leaves the resulting effects in the host outbox.
//!
//! ```text
//!   JS: input(json) ─┐
//!   JS: advance(dt) ─┼─▶ step() ─▶ drain_commands() ─▶ JS applies effects
//!   JS: observer cb ─┘
//! ```

use std::collections::VecDeque;

use secnav_core::{
    IndicatorGeometry, NavEvent, SectionId, SectionRegistry, TabBounds, VisibilityBatch,
};
use secnav_i18n::LabelResolver;
use secnav_runtime::{NavigationState, NavigatorConfig, SectionNavigator, TabLabel};
use web_time::Duration;

use crate::{DeterministicClock, HostCommand, WebHost};

/// One input from the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    /// A navigator event.
    Event(NavEvent),
    /// An `IntersectionObserver` callback.
    Visibility(VisibilityBatch),
    /// A section element's document-relative top.
    SectionTop { id: String, top: f64 },
    /// A tab's measured bounds.
    Tab { id: String, bounds: TabBounds },
    /// A tab element left the document.
    TabDetached { id: String },
    /// The observer API is missing in this browser.
    ObserverUnsupported,
}

/// Outcome of a single [`StepNavigator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Inputs applied during this step.
    pub inputs_processed: u32,
    /// The active section changed during this step.
    pub active_changed: bool,
    /// Commands waiting in the outbox after this step.
    pub pending_commands: usize,
}

/// Host-driven navigator with a deterministic clock.
#[derive(Debug)]
pub struct StepNavigator {
    navigator: SectionNavigator,
    host: WebHost,
    clock: DeterministicClock,
    queue: VecDeque<HostInput>,
    steps: u64,
}

impl StepNavigator {
    #[must_use]
    pub fn new(registry: SectionRegistry, config: NavigatorConfig) -> Self {
        Self {
            navigator: SectionNavigator::new(registry, config),
            host: WebHost::new(),
            clock: DeterministicClock::new(),
            queue: VecDeque::new(),
            steps: 0,
        }
    }

    /// Mount once the shell has pushed geometry and the initial fragment.
    ///
    /// Geometry inputs queued so far are applied first so the observer can
    /// find every section.
    pub fn mount(&mut self, fragment: Option<String>) {
        self.host.set_fragment(fragment);
        let pending: Vec<HostInput> = self.queue.drain(..).collect();
        let mut deferred = VecDeque::new();
        for input in pending {
            if input.is_geometry() {
                self.apply(input);
            } else {
                deferred.push_back(input);
            }
        }
        self.queue = deferred;
        self.navigator.mount(&mut self.host, self.clock.now());
    }

    /// Queue an input for the next step.
    pub fn push_input(&mut self, input: HostInput) {
        self.queue.push_back(input);
    }

    /// Queue a navigator event for the next step.
    pub fn push_event(&mut self, event: NavEvent) {
        self.push_input(HostInput::Event(event));
    }

    /// Advance the deterministic clock.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the deterministic clock (never backwards).
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Apply every queued input, then drain batches and check deadlines.
    pub fn step(&mut self) -> StepResult {
        let before = self.navigator.active().version();
        let mut processed = 0u32;
        while let Some(input) = self.queue.pop_front() {
            self.apply(input);
            processed = processed.saturating_add(1);
        }
        self.navigator.pump(&mut self.host, self.clock.now());
        self.steps += 1;
        let result = StepResult {
            inputs_processed: processed,
            active_changed: self.navigator.active().version() != before,
            pending_commands: self.host.pending_commands().len(),
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "web.step",
            step = self.steps,
            inputs = result.inputs_processed,
            active_changed = result.active_changed,
        );
        result
    }

    /// Take the effects the shell must apply.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        self.host.drain_commands()
    }

    /// Tear down; the shell receives the final `disconnect`/`cancel_wake`.
    pub fn unmount(&mut self) {
        self.queue.clear();
        self.navigator.unmount(&mut self.host);
    }

    #[must_use]
    pub fn current_active_id(&self) -> Option<SectionId> {
        self.navigator.current_active_id()
    }

    #[must_use]
    pub fn indicator(&self) -> Option<IndicatorGeometry> {
        self.navigator.indicator().get()
    }

    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.navigator.state()
    }

    #[must_use]
    pub fn tab_labels(&self, labels: &dyn LabelResolver) -> Vec<TabLabel> {
        self.navigator.tab_labels(labels)
    }

    #[must_use]
    pub fn navigator(&self) -> &SectionNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn host(&self) -> &WebHost {
        &self.host
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Steps taken so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn apply(&mut self, input: HostInput) {
        let now = self.clock.now();
        match input {
            HostInput::Event(event) => {
                if let NavEvent::Scrolled { offset } = event {
                    self.host.set_scroll_offset(offset);
                }
                if let NavEvent::FragmentChanged(raw) = &event {
                    self.host.set_fragment(Some(raw.clone()));
                }
                self.navigator.update(event, &mut self.host, now);
            }
            HostInput::Visibility(batch) => {
                if !self.host.deliver(batch) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(message = "web.batch_dropped");
                }
            }
            HostInput::SectionTop { id, top } => self.host.set_section_top(id, top),
            HostInput::Tab { id, bounds } => self.host.set_tab(id, bounds),
            HostInput::TabDetached { id } => self.host.detach_tab(id),
            HostInput::ObserverUnsupported => self.host.set_observer_supported(false),
        }
    }
}

impl HostInput {
    /// Inputs that describe the page rather than something happening on it.
    #[must_use]
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            Self::SectionTop { .. }
                | Self::Tab { .. }
                | Self::TabDetached { .. }
                | Self::ObserverUnsupported
        )
    }
}
