#![forbid(unsafe_code)]

//! Scenario driver.
//!
//! [`Rig`] owns a navigator and a [`SimulatedPage`], runs 16 ms frames, and
//! routes page activity (scroll events, observer batches, wake-ups) into the
//! navigator the way a browser embedding would. Every input and every
//! observable effect is appended to a [`Transcript`].

use secnav_core::{
    NavEvent, NavKey, RegistryError, SectionDescriptor, SectionId, SectionRegistry,
};
use secnav_runtime::{
    Location, NavigationMode, NavigatorConfig, ScrollBehavior, SectionNavigator,
};
use serde_json::{Value, json};
use web_time::Duration;

use crate::page::{SectionSpec, SimulatedPage};
use crate::transcript::Transcript;

/// Frame interval.
pub const FRAME: Duration = Duration::from_millis(16);

/// Upper bound for [`Rig::settle`].
const SETTLE_LIMIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Default)]
struct Seen {
    active: Option<SectionId>,
    mode: &'static str,
    fragment: Option<String>,
    scrolls: usize,
    indicator: Option<(f64, f64)>,
}

/// A navigator mounted on a simulated page.
#[derive(Debug)]
pub struct Rig {
    navigator: SectionNavigator,
    page: SimulatedPage,
    now: Duration,
    transcript: Transcript,
    seen: Seen,
}

impl Rig {
    /// Build a page from `sections` and a navigator over the same ids.
    pub fn new(sections: &[SectionSpec], config: NavigatorConfig) -> Result<Self, RegistryError> {
        Self::with_page(SimulatedPage::new(sections), sections, config)
    }

    /// Like [`Rig::new`] with a pre-configured page.
    pub fn with_page(
        page: SimulatedPage,
        sections: &[SectionSpec],
        config: NavigatorConfig,
    ) -> Result<Self, RegistryError> {
        let registry = SectionRegistry::new(
            sections
                .iter()
                .map(|s| SectionDescriptor::new(s.id.as_str(), s.label.as_str()))
                .collect(),
        )?;
        Ok(Self {
            navigator: SectionNavigator::new(registry, config),
            page,
            now: Duration::ZERO,
            transcript: Transcript::new(),
            seen: Seen::default(),
        })
    }

    /// Four 1000 px chapters `ch1..ch4` labelled `Chapter N`.
    #[must_use]
    pub fn chapters() -> Vec<SectionSpec> {
        (1..=4)
            .map(|n| SectionSpec::new(format!("ch{n}"), format!("Chapter {n}"), 1000.0))
            .collect()
    }

    pub fn mount(&mut self) {
        self.transcript.record(
            self.now,
            "mount",
            json!({ "fragment": self.page.fragment() }),
        );
        self.navigator.mount(&mut self.page, self.now);
        self.page.flush_observations();
        self.navigator.pump(&mut self.page, self.now);
        self.note_effects();
    }

    /// Click the tab for `id`. Returns whether a navigation started.
    pub fn click(&mut self, id: &str) -> bool {
        self.input("activate", json!({ "id": id }));
        let started = self.navigator.activate(id, &mut self.page, self.now);
        self.note_effects();
        started
    }

    pub fn key(&mut self, key: NavKey) -> bool {
        self.input("key", json!({ "key": format!("{key:?}") }));
        self.dispatch(NavEvent::Key(key))
    }

    /// The user edits the address bar to `fragment`.
    pub fn visit(&mut self, fragment: &str) -> bool {
        self.page.visit(fragment);
        self.input("visit", json!({ "fragment": fragment }));
        self.dispatch(NavEvent::FragmentChanged(fragment.to_owned()))
    }

    /// History back. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        let Some(fragment) = self.page.back() else {
            return false;
        };
        self.input("back", json!({ "fragment": fragment }));
        self.dispatch(NavEvent::FragmentChanged(fragment));
        true
    }

    /// History forward. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        let Some(fragment) = self.page.forward() else {
            return false;
        };
        self.input("forward", json!({ "fragment": fragment }));
        self.dispatch(NavEvent::FragmentChanged(fragment));
        true
    }

    /// The user scrolls to `offset`; delivered on the next frame.
    pub fn user_scroll_to(&mut self, offset: f64) {
        self.input("user_scroll", json!({ "offset": offset }));
        self.page.user_scroll_to(offset);
        self.frame();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.page.resize(width, height);
        self.input("resize", json!({ "width": width, "height": height }));
        self.dispatch(NavEvent::Resize { width, height });
    }

    /// Change a tab's text and report the layout change.
    pub fn relabel(&mut self, id: &str, text: &str) {
        self.page.set_label(id, text);
        self.input("relabel", json!({ "id": id, "text": text }));
        self.dispatch(NavEvent::LayoutChanged);
    }

    /// Remove a section's element and report it.
    pub fn detach_section(&mut self, id: &str) -> bool {
        self.page.detach_section(id);
        self.input("detach_section", json!({ "id": id }));
        self.dispatch(NavEvent::SectionDetached(SectionId::new(id)))
    }

    pub fn detach_tab(&mut self, id: &str) {
        self.page.detach_tab(id);
        self.input("detach_tab", json!({ "id": id }));
    }

    pub fn attach_tab(&mut self, id: &str) {
        self.page.attach_tab(id);
        self.input("attach_tab", json!({ "id": id }));
    }

    /// Send the observer's last batch again.
    pub fn replay_last_batch(&mut self) -> bool {
        let sent = self.page.replay_last_batch();
        self.input("replay_batch", json!({ "sent": sent }));
        self.navigator.pump(&mut self.page, self.now);
        self.note_effects();
        sent
    }

    /// Run frames covering `span`.
    pub fn advance(&mut self, span: Duration) {
        let end = self.now + span;
        while self.now < end {
            self.frame();
        }
    }

    /// Run frames until no navigation, scroll, or wake-up is pending.
    ///
    /// Returns the time spent; stops after five seconds regardless.
    pub fn settle(&mut self) -> Duration {
        let start = self.now;
        while self.is_busy() && self.now.saturating_sub(start) < SETTLE_LIMIT {
            self.frame();
        }
        self.now.saturating_sub(start)
    }

    pub fn unmount(&mut self) {
        self.input("unmount", Value::Null);
        self.navigator.unmount(&mut self.page);
        self.note_effects();
    }

    #[must_use]
    pub fn active(&self) -> Option<String> {
        self.navigator.current_active_id().map(|id| id.to_string())
    }

    #[must_use]
    pub fn is_navigating(&self) -> bool {
        matches!(self.navigator.state().mode, NavigationMode::Navigating(_))
    }

    #[must_use]
    pub fn navigator(&self) -> &SectionNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn page(&self) -> &SimulatedPage {
        &self.page
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    fn is_busy(&self) -> bool {
        self.is_navigating() || self.page.is_scrolling() || self.page.pending_timers() > 0
    }

    fn frame(&mut self) {
        self.now += FRAME;
        let report = self.page.tick(self.now);
        if let Some(offset) = report.scrolled {
            self.dispatch(NavEvent::Scrolled { offset });
        }
        if report.scroll_ended {
            self.dispatch(NavEvent::ScrollEnd);
        }
        for token in self.page.take_due(self.now) {
            self.dispatch(NavEvent::Wake(token));
        }
        self.navigator.pump(&mut self.page, self.now);
        self.note_effects();
    }

    fn dispatch(&mut self, event: NavEvent) -> bool {
        tracing::trace!(
            message = "rig.dispatch",
            kind = event.kind(),
            t_ms = self.now.as_millis() as u64,
        );
        let changed = self.navigator.update(event, &mut self.page, self.now);
        self.note_effects();
        changed
    }

    fn input(&mut self, input: &str, fields: Value) {
        let mut entry = json!({ "input": input });
        if let (Value::Object(entry), Value::Object(fields)) = (&mut entry, fields) {
            entry.extend(fields);
        }
        self.transcript.record(self.now, "input", entry);
    }

    /// Record whatever changed since the last call.
    fn note_effects(&mut self) {
        let state = self.navigator.state();
        let current = Seen {
            active: state.active,
            mode: state.mode.name(),
            fragment: self.page.fragment(),
            scrolls: self.page.scroll_requests().len(),
            indicator: self.navigator.indicator().get().map(|g| (g.left, g.width)),
        };
        for request in &self.page.scroll_requests()[self.seen.scrolls.min(current.scrolls)..] {
            self.transcript.record(
                self.now,
                "scroll",
                json!({
                    "offset": request.offset,
                    "smooth": request.behavior == ScrollBehavior::Smooth,
                }),
            );
        }
        if current.active != self.seen.active {
            self.transcript.record(
                self.now,
                "active",
                json!({ "id": current.active.as_ref().map(SectionId::as_str) }),
            );
        }
        if current.mode != self.seen.mode {
            self.transcript
                .record(self.now, "mode", json!({ "mode": current.mode }));
        }
        if current.fragment != self.seen.fragment {
            self.transcript
                .record(self.now, "fragment", json!({ "fragment": current.fragment }));
        }
        if current.indicator != self.seen.indicator {
            self.transcript.record(
                self.now,
                "indicator",
                json!({ "geometry": current.indicator.map(|(l, w)| [l, w]) }),
            );
        }
        self.seen = current;
    }
}
