#![forbid(unsafe_code)]

//! The section navigator.
//!
//! [`SectionNavigator`] owns the whole navigation state for one page: the
//! registry, the visibility tracker, the fragment synchronizer, the
//! navigation controller, and the indicator positioner. Hosts feed it
//! [`NavEvent`]s and call [`SectionNavigator::pump`] whenever visibility
//! batches may have arrived; outputs are published through two
//! [`Observable`]s.
//!
//! # Lifecycle
//!
//! `new` → `mount` → (`update` | `pump` | `activate`)* → `unmount`.
//! Before `mount` and after `unmount` every input is ignored.
//!
//! # Invariants
//!
//! 1. Once set, the active id is always a registered section and never goes
//!    back to `None`.
//! 2. While a navigation is in flight, tracker updates never change the
//!    active id.
//! 3. Once settled, the fragment equals the active id.
//! 4. After `unmount` the observer is disconnected, the wake-up cancelled,
//!    and every subscriber dropped.

use secnav_core::{
    IndicatorGeometry, NavEvent, NavKey, SectionId, SectionRegistry, TimerToken, resolve_active,
};
use secnav_i18n::LabelResolver;
use web_time::Duration;

use crate::config::NavigatorConfig;
use crate::controller::{NavigationController, NavigationMode, NavigationOrigin, Settled};
use crate::hash_sync::{FragmentChange, HashSynchronizer, decode_fragment};
use crate::host::{Host, ObserveError};
use crate::indicator::{IndicatorPositioner, RecomputeReason};
use crate::observable::Observable;
use crate::tracker::{TrackerState, VisibilityTracker};

/// Snapshot of navigation state.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    /// `None` only before the first measurement.
    pub active: Option<SectionId>,
    pub mode: NavigationMode,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigatorStats {
    /// Active-id changes.
    pub transitions: u64,
    /// Snapshot changes ignored inside a suppression window.
    pub suppressed_updates: u64,
    /// External fragments that named no section.
    pub ignored_fragments: u64,
    /// Explicit navigations started.
    pub navigations: u64,
    /// Visibility batches merged.
    pub batches: u64,
}

/// A tab's text as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub id: SectionId,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Mounted,
    Unmounted,
}

/// One page's navigator.
#[derive(Debug)]
pub struct SectionNavigator {
    registry: SectionRegistry,
    config: NavigatorConfig,
    tracker: VisibilityTracker,
    hash: HashSynchronizer,
    controller: NavigationController,
    indicator: IndicatorPositioner,
    active: Observable<Option<SectionId>>,
    geometry: Observable<Option<IndicatorGeometry>>,
    fragment_hint: Option<String>,
    suppressed_since_navigation: bool,
    lifecycle: Lifecycle,
    stats: NavigatorStats,
}

impl SectionNavigator {
    #[must_use]
    pub fn new(registry: SectionRegistry, config: NavigatorConfig) -> Self {
        let controller = NavigationController::new(config.scroll_policy());
        let indicator = IndicatorPositioner::new(config.indicator_inset);
        Self {
            registry,
            config,
            tracker: VisibilityTracker::new(),
            hash: HashSynchronizer::new(),
            controller,
            indicator,
            active: Observable::new(None),
            geometry: Observable::new(None),
            fragment_hint: None,
            suppressed_since_navigation: false,
            lifecycle: Lifecycle::Created,
            stats: NavigatorStats::default(),
        }
    }

    /// Start tracking and settle on the initial section.
    ///
    /// The initial section is the one named by the current fragment, or the
    /// first section. A known fragment is scrolled to instantly when
    /// `scroll_on_deep_link` is set.
    pub fn mount<H: Host + ?Sized>(&mut self, host: &mut H, now: Duration) {
        if self.lifecycle != Lifecycle::Created {
            tracing::warn!(message = "navigator.mount_ignored", mounted = self.is_mounted());
            return;
        }
        self.lifecycle = Lifecycle::Mounted;

        let fragment = host.fragment();
        let decoded = fragment.as_deref().map(decode_fragment);
        let initial = self.registry.initial_section(decoded.as_deref()).id.clone();
        let deep_link = decoded
            .as_deref()
            .is_some_and(|f| self.registry.contains(f));
        self.fragment_hint = decoded.map(std::borrow::Cow::into_owned);

        let options = self.config.observer_options();
        match self.tracker.start(&self.registry, &options, host) {
            Ok(observed) => {
                tracing::info!(
                    message = "navigator.mount",
                    sections = self.registry.len(),
                    observed,
                    initial = %initial,
                    deep_link,
                );
            }
            Err(ObserveError::Unsupported) => {
                tracing::warn!(
                    message = "navigator.tracking_disabled",
                    sections = self.registry.len(),
                    initial = %initial,
                );
            }
            Err(err) => {
                tracing::warn!(message = "navigator.tracking_failed", error = %err);
            }
        }

        let landed = deep_link
            && self.config.scroll_on_deep_link
            && self.navigate(initial.as_str(), host, now, NavigationOrigin::DeepLink);
        if !landed {
            self.set_active(initial.clone(), host);
            self.hash.sync_tracked(&initial, host);
            self.controller.begin_tracking();
        }
        self.pump(host, now);
    }

    /// Handle one input event.
    ///
    /// Returns `true` if the active section changed. Visibility batches are
    /// drained afterwards, so the result includes tracker-driven changes.
    pub fn update<H: Host + ?Sized>(&mut self, event: NavEvent, host: &mut H, now: Duration) -> bool {
        if !self.is_mounted() {
            tracing::trace!(message = "navigator.event_ignored", kind = event.kind());
            return false;
        }
        let before = self.active.version();
        // Apply what the tracker saw before this event happened.
        self.ingest_batches(host);
        match event {
            NavEvent::Activate(id) => {
                self.activate(id.as_str(), host, now);
            }
            NavEvent::FragmentChanged(raw) => self.on_fragment(&raw, host, now),
            NavEvent::Scrolled { offset } => {
                let settled = self.controller.on_scrolled(offset, host, now);
                self.after_settle(settled, host);
            }
            NavEvent::ScrollEnd => {
                let settled = self.controller.on_scroll_end(host, now);
                self.after_settle(settled, host);
            }
            NavEvent::Resize { .. } => self.recompute_indicator(host, RecomputeReason::Resize),
            NavEvent::LayoutChanged => {
                self.recompute_indicator(host, RecomputeReason::LayoutChanged);
            }
            NavEvent::Wake(token) => self.on_wake(token, host, now),
            NavEvent::Key(key) => self.on_key(key, host, now),
            NavEvent::SectionDetached(id) => self.on_section_detached(&id, host),
        }
        self.pump(host, now);
        self.active.version() != before
    }

    /// Drain pending visibility batches and check the settle deadline.
    ///
    /// Returns `true` if the active section changed.
    pub fn pump<H: Host + ?Sized>(&mut self, host: &mut H, now: Duration) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let before = self.active.version();
        self.ingest_batches(host);
        let settled = self.controller.poll(host, now);
        self.after_settle(settled, host);
        self.active.version() != before
    }

    fn ingest_batches<H: Host + ?Sized>(&mut self, host: &mut H) {
        let ingest = self.tracker.ingest(&self.registry);
        self.stats.batches += ingest.batches as u64;
        if ingest.changed {
            self.snapshot_changed(host);
        }
    }

    fn snapshot_changed<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.controller.accepts_tracker_updates() {
            self.resolve_from_tracker(host);
        } else {
            self.stats.suppressed_updates += 1;
            self.suppressed_since_navigation = true;
            tracing::trace!(
                message = "navigator.suppressed",
                target = ?self.controller.target().map(SectionId::as_str),
            );
        }
    }

    fn on_section_detached<H: Host + ?Sized>(&mut self, id: &SectionId, host: &mut H) {
        if !self.tracker.forget(id.as_str()) {
            return;
        }
        tracing::debug!(message = "navigator.section_detached", section = %id);
        self.snapshot_changed(host);
    }

    /// Jump to `id`: scroll, push a history entry, and set the active id
    /// immediately.
    ///
    /// Unknown ids are ignored. Returns `true` if a navigation started.
    pub fn activate<H: Host + ?Sized>(&mut self, id: &str, host: &mut H, now: Duration) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.navigate(id, host, now, NavigationOrigin::User)
    }

    /// Tear down. Idempotent; the navigator ignores everything afterwards.
    pub fn unmount<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        let was_mounted = self.is_mounted();
        self.lifecycle = Lifecycle::Unmounted;
        if was_mounted {
            self.tracker.stop(host);
            self.controller.cancel(host);
        }
        self.active.clear_subscribers();
        self.geometry.clear_subscribers();
        tracing::info!(
            message = "navigator.unmount",
            transitions = self.stats.transitions,
            navigations = self.stats.navigations,
        );
    }

    /// Resolve each tab's label through `labels`.
    #[must_use]
    pub fn tab_labels(&self, labels: &dyn LabelResolver) -> Vec<TabLabel> {
        let active = self.current_active_id();
        self.registry
            .iter()
            .map(|section| TabLabel {
                id: section.id.clone(),
                text: labels.label(&section.label),
                selected: active.as_ref() == Some(&section.id),
            })
            .collect()
    }

    #[must_use]
    pub fn current_active_id(&self) -> Option<SectionId> {
        self.active.get()
    }

    /// The active id as an observable for renderers.
    #[must_use]
    pub fn active(&self) -> &Observable<Option<SectionId>> {
        &self.active
    }

    /// Indicator geometry as an observable for renderers.
    #[must_use]
    pub fn indicator(&self) -> &Observable<Option<IndicatorGeometry>> {
        &self.geometry
    }

    #[must_use]
    pub fn state(&self) -> NavigationState {
        NavigationState {
            active: self.current_active_id(),
            mode: self.controller.mode().clone(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> NavigatorStats {
        self.stats
    }

    /// Indicator measurements skipped because a tab was detached.
    #[must_use]
    pub fn skipped_measurements(&self) -> u64 {
        self.indicator.skipped()
    }

    #[must_use]
    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    fn navigate<H: Host + ?Sized>(
        &mut self,
        id: &str,
        host: &mut H,
        now: Duration,
        origin: NavigationOrigin,
    ) -> bool {
        let Some(started) = self.controller.go_to(&self.registry, id, host, now, origin) else {
            return false;
        };
        self.stats.navigations += 1;
        self.suppressed_since_navigation = false;
        if origin.pushes_history() {
            self.hash.sync_navigated(&started.target, host);
        } else {
            self.hash.sync_tracked(&started.target, host);
        }
        self.set_active(started.target, host);
        true
    }

    fn on_fragment<H: Host + ?Sized>(&mut self, raw: &str, host: &mut H, now: Duration) {
        match self.hash.interpret(raw, &self.registry) {
            FragmentChange::Section(id) => {
                if self.active.with(|a| a.as_ref() == Some(&id)) {
                    tracing::trace!(message = "navigator.fragment_current", section = %id);
                    return;
                }
                self.navigate(id.as_str(), host, now, NavigationOrigin::History);
            }
            FragmentChange::Unknown(value) => {
                self.stats.ignored_fragments += 1;
                tracing::debug!(message = "navigator.fragment_unknown", fragment = %value);
                self.restore_fragment(host);
            }
            FragmentChange::Empty => {
                self.stats.ignored_fragments += 1;
                tracing::debug!(message = "navigator.fragment_empty");
                self.restore_fragment(host);
            }
        }
    }

    /// Put the active id back in place of a fragment that named no section.
    fn restore_fragment<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(active) = self.current_active_id() {
            self.hash.sync_tracked(&active, host);
        }
    }

    fn on_wake<H: Host + ?Sized>(&mut self, token: TimerToken, host: &mut H, now: Duration) {
        let settled = self.controller.on_wake(token, now);
        if settled.is_none() {
            tracing::trace!(message = "navigator.stale_wake", token = token.0);
        }
        self.after_settle(settled, host);
    }

    fn on_key<H: Host + ?Sized>(&mut self, key: NavKey, host: &mut H, now: Duration) {
        if !self.config.keyboard_navigation {
            return;
        }
        let Some(active) = self.current_active_id() else {
            return;
        };
        let target = match key {
            NavKey::Next => self.registry.next_of(active.as_str()),
            NavKey::Previous => self.registry.previous_of(active.as_str()),
            NavKey::First => Some(self.registry.first()),
            NavKey::Last => Some(self.registry.last()),
        };
        let Some(target) = target.map(|s| s.id.clone()) else {
            return;
        };
        if target != active {
            self.navigate(target.as_str(), host, now, NavigationOrigin::Keyboard);
        }
    }

    fn after_settle<H: Host + ?Sized>(&mut self, settled: Option<Settled>, host: &mut H) {
        let Some(settled) = settled else {
            return;
        };
        tracing::debug!(
            message = "navigator.settled",
            target = %settled.target,
            reason = settled.reason.as_str(),
            suppressed = self.suppressed_since_navigation,
        );
        // Visibility that changed during the window was never applied.
        if std::mem::take(&mut self.suppressed_since_navigation) {
            self.resolve_from_tracker(host);
        }
    }

    fn resolve_from_tracker<H: Host + ?Sized>(&mut self, host: &mut H) {
        let previous = self.current_active_id();
        let next = resolve_active(
            &self.registry,
            self.tracker.snapshot(),
            previous.as_ref(),
            self.fragment_hint.as_deref(),
            self.config.tie_break,
        );
        if previous.as_ref() == Some(&next) {
            return;
        }
        self.hash.sync_tracked(&next, host);
        self.set_active(next, host);
    }

    fn set_active<H: Host + ?Sized>(&mut self, id: SectionId, host: &mut H) {
        let from = self.current_active_id();
        if !self.active.set(Some(id.clone())) {
            return;
        }
        self.stats.transitions += 1;
        tracing::debug!(
            message = "navigator.active",
            from = ?from.as_ref().map(SectionId::as_str),
            to = %id,
            mode = self.controller.mode().name(),
        );
        host.reveal_tab(&id);
        self.recompute_indicator(host, RecomputeReason::ActiveChanged);
    }

    fn recompute_indicator<H: Host + ?Sized>(&mut self, host: &mut H, reason: RecomputeReason) {
        let Some(active) = self.current_active_id() else {
            return;
        };
        if let Some(geometry) = self.indicator.recompute(&active, host, reason) {
            self.geometry.set(Some(geometry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;
    use secnav_core::{VisibilityBatch, VisibilityMetric};
    use std::cell::RefCell;
    use std::rc::Rc;

    const T0: Duration = Duration::from_millis(0);

    fn registry() -> SectionRegistry {
        SectionRegistry::from_pairs([
            ("ch1", "nav.why"),
            ("ch2", "nav.projects"),
            ("ch3", "nav.impact"),
            ("ch4", "nav.next"),
        ])
        .expect("registry")
    }

    fn mounted(fragment: Option<&str>) -> (SectionNavigator, TestHost) {
        let mut host = TestHost::with_sections(&["ch1", "ch2", "ch3", "ch4"], 900.0);
        host.fragment = fragment.map(str::to_owned);
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        nav.mount(&mut host, T0);
        (nav, host)
    }

    fn metric(id: &str, ratio: f64, top: f64) -> VisibilityMetric {
        VisibilityMetric::new(id, ratio, top, top + 900.0)
    }

    #[test]
    fn mount_defaults_to_first_and_writes_fragment() {
        let (nav, host) = mounted(None);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch1")));
        assert_eq!(host.fragment.as_deref(), Some("ch1"));
        assert!(host.pushes.is_empty());
        assert!(host.scrolls.is_empty());
        assert_eq!(nav.state().mode, NavigationMode::Tracking);
    }

    #[test]
    fn unknown_fragment_on_load_falls_back() {
        let (nav, host) = mounted(Some("#nope"));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch1")));
        assert_eq!(host.fragment.as_deref(), Some("ch1"));
        assert!(host.scrolls.is_empty());
    }

    #[test]
    fn deep_link_scrolls_instantly_without_history() {
        let (nav, host) = mounted(Some("ch3"));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch3")));
        assert_eq!(host.scrolls.len(), 1);
        assert_eq!(host.scrolls[0].0, 1800.0 - 68.0);
        assert!(host.pushes.is_empty());
    }

    #[test]
    fn tracker_batches_drive_active_section() {
        let (mut nav, mut host) = mounted(None);
        host.send(VisibilityBatch::new(vec![
            metric("ch1", 0.1, -950.0),
            metric("ch2", 0.6, 10.0),
        ]));
        assert!(nav.pump(&mut host, T0));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch2")));
        assert_eq!(host.fragment.as_deref(), Some("ch2"));
        assert!(host.pushes.is_empty());
        assert_eq!(host.revealed.last().map(String::as_str), Some("ch2"));
    }

    #[test]
    fn duplicate_batch_is_idempotent() {
        let (mut nav, mut host) = mounted(None);
        let batch = VisibilityBatch::new(vec![metric("ch2", 0.6, 10.0)]);
        host.send(batch.clone());
        nav.pump(&mut host, T0);
        let transitions = nav.stats().transitions;
        let version = nav.active().version();
        host.send(batch);
        assert!(!nav.pump(&mut host, T0));
        assert_eq!(nav.stats().transitions, transitions);
        assert_eq!(nav.active().version(), version);
    }

    #[test]
    fn activate_unknown_is_a_no_op() {
        let (mut nav, mut host) = mounted(None);
        assert!(!nav.activate("nonexistent", &mut host, T0));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch1")));
        assert!(host.scrolls.is_empty());
    }

    #[test]
    fn activate_is_optimistic_and_suppresses_tracker() {
        let (mut nav, mut host) = mounted(None);
        assert!(nav.activate("ch3", &mut host, T0));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch3")));
        assert_eq!(host.fragment.as_deref(), Some("ch3"));
        assert_eq!(host.pushes, vec!["ch3"]);

        // Mid-animation the tracker sees ch2 on the line; it must not win.
        host.send(VisibilityBatch::new(vec![metric("ch2", 0.5, 0.0)]));
        nav.pump(&mut host, Duration::from_millis(100));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch3")));
        assert_eq!(nav.stats().suppressed_updates, 1);

        // Landing report arrives, then the window closes.
        host.send(VisibilityBatch::new(vec![
            metric("ch2", 0.1, -900.0),
            metric("ch3", 0.8, 0.0),
        ]));
        let token = host.pending_wake().expect("wake scheduled");
        nav.update(NavEvent::Wake(token), &mut host, Duration::from_millis(700));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch3")));
        assert_eq!(nav.state().mode, NavigationMode::Tracking);
    }

    #[test]
    fn detached_section_stops_counting() {
        let (mut nav, mut host) = mounted(None);
        host.send(VisibilityBatch::new(vec![
            metric("ch2", 0.5, -10.0),
            metric("ch3", 0.3, 200.0),
        ]));
        nav.pump(&mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch2")));

        assert!(nav.update(NavEvent::SectionDetached(SectionId::new("ch2")), &mut host, T0));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch3")));
        assert_eq!(host.fragment.as_deref(), Some("ch3"));
        assert!(nav.tracker.snapshot().get("ch2").is_none());

        // Nothing left to forget.
        let version = nav.active().version();
        assert!(!nav.update(NavEvent::SectionDetached(SectionId::new("ch2")), &mut host, T0));
        assert!(!nav.update(NavEvent::SectionDetached(SectionId::new("ch4")), &mut host, T0));
        assert_eq!(nav.active().version(), version);
    }

    #[test]
    fn detach_during_navigation_waits_for_settle() {
        let (mut nav, mut host) = mounted(None);
        host.send(VisibilityBatch::new(vec![metric("ch3", 0.3, 200.0)]));
        nav.pump(&mut host, T0);
        nav.activate("ch4", &mut host, T0);
        let suppressed = nav.stats().suppressed_updates;

        nav.update(NavEvent::SectionDetached(SectionId::new("ch3")), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch4")));
        assert_eq!(nav.stats().suppressed_updates, suppressed + 1);
    }

    #[test]
    fn repeated_scroll_sample_does_not_end_navigation() {
        let (mut nav, mut host) = mounted(None);
        nav.activate("ch4", &mut host, T0);
        let t = T0 + Duration::from_millis(50);
        nav.update(NavEvent::Scrolled { offset: 500.0 }, &mut host, t);
        nav.update(NavEvent::Scrolled { offset: 500.0 }, &mut host, t);
        assert!(matches!(nav.state().mode, NavigationMode::Navigating(_)));

        host.send(VisibilityBatch::new(vec![metric("ch2", 0.4, -10.0)]));
        nav.pump(&mut host, T0 + Duration::from_millis(60));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch4")));
        assert_eq!(nav.stats().suppressed_updates, 1);
    }

    #[test]
    fn external_fragment_scrolls_once() {
        let (mut nav, mut host) = mounted(None);
        nav.update(NavEvent::FragmentChanged("#ch4".into()), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch4")));
        assert_eq!(host.scrolls.len(), 1);
        assert!(host.pushes.is_empty());

        nav.update(NavEvent::FragmentChanged("#ch4".into()), &mut host, T0);
        assert_eq!(host.scrolls.len(), 1);

        host.fragment = Some("missing".into());
        nav.update(NavEvent::FragmentChanged("#missing".into()), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch4")));
        assert_eq!(nav.stats().ignored_fragments, 1);
        assert_eq!(host.fragment.as_deref(), Some("ch4"));
        assert_eq!(host.scrolls.len(), 1);
    }

    #[test]
    fn emptied_fragment_is_rewritten_without_history() {
        let (mut nav, mut host) = mounted(None);
        nav.activate("ch2", &mut host, T0);
        let pushes = host.pushes.len();
        let scrolls = host.scrolls.len();

        host.fragment = None;
        nav.update(NavEvent::FragmentChanged("#".into()), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch2")));
        assert_eq!(host.fragment.as_deref(), Some("ch2"));
        assert_eq!(host.pushes.len(), pushes);
        assert_eq!(host.scrolls.len(), scrolls);
        assert_eq!(nav.stats().ignored_fragments, 1);
    }

    #[test]
    fn keyboard_moves_between_neighbours() {
        let (mut nav, mut host) = mounted(None);
        nav.update(NavEvent::Key(NavKey::Next), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch2")));
        nav.update(NavEvent::Key(NavKey::Last), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch4")));
        let scrolls = host.scrolls.len();
        nav.update(NavEvent::Key(NavKey::Next), &mut host, T0);
        assert_eq!(host.scrolls.len(), scrolls);
        nav.update(NavEvent::Key(NavKey::First), &mut host, T0);
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch1")));
    }

    #[test]
    fn unsupported_observer_still_navigates() {
        let mut host = TestHost::with_sections(&["ch1", "ch2", "ch3", "ch4"], 900.0);
        host.observer_supported = false;
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        nav.mount(&mut host, T0);
        assert_eq!(nav.tracker_state(), TrackerState::Unsupported);
        assert!(nav.activate("ch2", &mut host, T0));
        assert_eq!(nav.current_active_id(), Some(SectionId::new("ch2")));
    }

    #[test]
    fn indicator_follows_active_and_skips_detached() {
        let (mut nav, mut host) = mounted(None);
        let first = nav.indicator().get().expect("geometry");
        nav.activate("ch2", &mut host, T0);
        let second = nav.indicator().get().expect("geometry");
        assert!(second.left > first.left);

        host.detached = true;
        nav.update(NavEvent::Resize { width: 500.0, height: 800.0 }, &mut host, T0);
        assert_eq!(nav.skipped_measurements(), 1);
        assert_eq!(nav.indicator().get(), Some(second));

        host.detached = false;
        host.tab_width = 140.0;
        nav.update(NavEvent::Resize { width: 500.0, height: 800.0 }, &mut host, T0);
        assert_eq!(nav.indicator().get().map(|g| g.width), Some(124.0));
    }

    #[test]
    fn subscribers_see_changes_until_unmount() {
        let (mut nav, mut host) = mounted(None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = nav.active().subscribe(move |id| {
            sink.borrow_mut().push(id.as_ref().map(ToString::to_string));
        });
        nav.activate("ch2", &mut host, T0);
        nav.unmount(&mut host);
        nav.unmount(&mut host);
        assert_eq!(host.disconnects, 1);
        assert!(!host.cancelled.is_empty());
        assert!(!host.sender_open());

        assert!(!nav.activate("ch3", &mut host, T0));
        assert!(!nav.update(NavEvent::FragmentChanged("ch4".into()), &mut host, T0));
        assert_eq!(*seen.borrow(), vec![Some("ch2".to_string())]);
    }

    #[test]
    fn tab_labels_use_resolver() {
        let (nav, _host) = mounted(None);
        let labels = |key: &str| (key == "nav.why").then(|| "Why".to_string());
        let tabs = nav.tab_labels(&labels);
        assert_eq!(tabs[0].text, "Why");
        assert!(tabs[0].selected);
        assert_eq!(tabs[1].text, "nav.projects");
        assert!(!tabs[1].selected);
    }
}
