#![forbid(unsafe_code)]

//! Explicit navigation and the suppression window.
//!
//! ```text
//!   Idle ──go_to──▶ Navigating ──settle──▶ Tracking
//!                    ▲      │                 │
//!                    └go_to─┘◀──────go_to─────┘
//! ```
//!
//! While `Navigating`, tracker-driven updates are ignored so the indicator
//! does not bounce through intermediate sections mid-animation. The window
//! closes on whichever comes first: the settle estimate elapsing (the host
//! wake-up or [`NavigationController::poll`]), the environment reporting
//! scroll end, or the viewport arriving at the target.
//!
//! # Invariants
//!
//! 1. At most one wake-up is outstanding; a new `go_to` cancels the old one.
//! 2. `go_to` on an unregistered id changes nothing and scrolls nothing.
//! 3. The scroll target is never negative.

use secnav_core::{SectionId, SectionRegistry, TimerToken};
use web_time::Duration;

use crate::config::ScrollPolicy;
use crate::host::{ScrollBehavior, Timers, Viewport};

/// Pixels within which the viewport counts as having arrived.
const ARRIVAL_TOLERANCE: f64 = 1.0;

/// A repeated offset counts as a stall only this long after it was first seen.
const STALL_INTERVAL: Duration = Duration::from_millis(16);

/// What asked for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrigin {
    /// A tab or button.
    User,
    /// Keyboard movement on the tab strip.
    Keyboard,
    /// An external fragment change (back/forward, manual edit).
    History,
    /// The fragment present at mount.
    DeepLink,
}

impl NavigationOrigin {
    /// Whether this navigation should add a history entry.
    #[must_use]
    pub const fn pushes_history(self) -> bool {
        matches!(self, Self::User | Self::Keyboard)
    }

    #[must_use]
    pub const fn scroll_behavior(self) -> ScrollBehavior {
        match self {
            Self::DeepLink => ScrollBehavior::Instant,
            _ => ScrollBehavior::Smooth,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Keyboard => "keyboard",
            Self::History => "history",
            Self::DeepLink => "deep_link",
        }
    }
}

/// An in-flight explicit navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub target: SectionId,
    pub origin: NavigationOrigin,
    pub started_at: Duration,
    pub deadline: Duration,
    pub scroll_target: f64,
    wake: TimerToken,
    /// Last distinct offset reported and when it was first seen.
    last_sample: Option<(f64, Duration)>,
}

/// Controller mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavigationMode {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// Tracker updates are suppressed until the navigation settles.
    Navigating(Navigation),
    /// Tracker updates drive the active section.
    Tracking,
}

impl NavigationMode {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Navigating(_) => "navigating",
            Self::Tracking => "tracking",
        }
    }
}

/// Returned by a successful [`NavigationController::go_to`].
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStarted {
    pub target: SectionId,
    pub scroll_target: f64,
    pub settle_after: Duration,
    /// An earlier navigation was still in flight and has been replaced.
    pub replaced: Option<SectionId>,
}

/// Why the suppression window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// The host wake-up fired.
    Wake,
    /// `poll` observed the deadline.
    Deadline,
    /// The environment reported scroll end.
    ScrollEnd,
    /// The viewport reached the target.
    Arrived,
    /// The viewport stopped moving short of the target.
    Stalled,
}

impl SettleReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wake => "wake",
            Self::Deadline => "deadline",
            Self::ScrollEnd => "scroll_end",
            Self::Arrived => "arrived",
            Self::Stalled => "stalled",
        }
    }
}

/// A navigation that just settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub target: SectionId,
    pub reason: SettleReason,
    pub elapsed: Duration,
}

/// Orchestrates explicit jumps.
#[derive(Debug, Default)]
pub struct NavigationController {
    policy: ScrollPolicy,
    mode: NavigationMode,
    started: u64,
}

impl NavigationController {
    #[must_use]
    pub fn new(policy: ScrollPolicy) -> Self {
        Self {
            policy,
            mode: NavigationMode::Idle,
            started: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> &NavigationMode {
        &self.mode
    }

    #[must_use]
    pub fn policy(&self) -> &ScrollPolicy {
        &self.policy
    }

    /// The section being navigated to, if any.
    #[must_use]
    pub fn target(&self) -> Option<&SectionId> {
        match &self.mode {
            NavigationMode::Navigating(nav) => Some(&nav.target),
            _ => None,
        }
    }

    /// `false` inside the suppression window.
    #[must_use]
    pub fn accepts_tracker_updates(&self) -> bool {
        !matches!(self.mode, NavigationMode::Navigating(_))
    }

    /// Total navigations started.
    #[must_use]
    pub fn started(&self) -> u64 {
        self.started
    }

    /// Expected scroll duration for `distance` pixels.
    #[must_use]
    pub fn estimate_settle(&self, distance: f64) -> Duration {
        let p = &self.policy;
        let distance = if distance.is_finite() { distance.abs() } else { 0.0 };
        let min_ms = p.settle_min.as_millis() as f64;
        let max_ms = p.settle_max.as_millis() as f64;
        let ms = (distance * p.settle_ms_per_px).clamp(min_ms, max_ms.max(min_ms));
        if ms.is_nan() {
            return p.settle_min;
        }
        Duration::from_millis(ms.round() as u64)
    }

    /// Document offset that places the top of a section at `section_top`
    /// just below the fixed header.
    #[must_use]
    pub fn scroll_target_for(&self, section_top: f64) -> f64 {
        (section_top - self.policy.header_offset - self.policy.scroll_padding).max(0.0)
    }

    /// Scroll to `id` and open the suppression window.
    ///
    /// Returns `None` without touching the host when `id` is not registered
    /// or its element cannot be located.
    pub fn go_to<H>(
        &mut self,
        registry: &SectionRegistry,
        id: &str,
        host: &mut H,
        now: Duration,
        origin: NavigationOrigin,
    ) -> Option<NavigationStarted>
    where
        H: Viewport + Timers + ?Sized,
    {
        let Some(section) = registry.get(id) else {
            tracing::debug!(message = "nav.goto_unknown", target = id);
            return None;
        };
        let target = section.id.clone();
        let Some(top) = host.section_top(&target) else {
            tracing::warn!(message = "nav.goto_missing_element", target = %target);
            return None;
        };

        let scroll_target = self.scroll_target_for(top);
        let behavior = origin.scroll_behavior();
        let settle_after = match behavior {
            ScrollBehavior::Instant => self.policy.settle_min,
            ScrollBehavior::Smooth => {
                self.estimate_settle(scroll_target - host.scroll_offset())
            }
        };

        let replaced = match std::mem::take(&mut self.mode) {
            NavigationMode::Navigating(previous) => {
                host.cancel_wake(previous.wake);
                Some(previous.target)
            }
            _ => None,
        };

        host.scroll_to(scroll_target, behavior);
        let wake = host.schedule_wake(settle_after);
        self.started += 1;

        tracing::debug!(
            message = "nav.goto",
            target = %target,
            origin = origin.as_str(),
            scroll_target,
            settle_ms = settle_after.as_millis() as u64,
            replaced = replaced.is_some(),
        );

        self.mode = NavigationMode::Navigating(Navigation {
            target: target.clone(),
            origin,
            started_at: now,
            deadline: now + settle_after,
            scroll_target,
            wake,
            last_sample: None,
        });

        Some(NavigationStarted {
            target,
            scroll_target,
            settle_after,
            replaced,
        })
    }

    /// Host wake-up. Stale tokens are ignored.
    pub fn on_wake(&mut self, token: TimerToken, now: Duration) -> Option<Settled> {
        if !matches!(&self.mode, NavigationMode::Navigating(nav) if nav.wake == token) {
            return None;
        }
        self.settle(SettleReason::Wake, now)
    }

    /// The environment reported that scrolling stopped.
    pub fn on_scroll_end<T: Timers + ?Sized>(
        &mut self,
        timers: &mut T,
        now: Duration,
    ) -> Option<Settled> {
        let NavigationMode::Navigating(nav) = &self.mode else {
            return None;
        };
        timers.cancel_wake(nav.wake);
        self.settle(SettleReason::ScrollEnd, now)
    }

    /// The viewport scrolled to `offset`.
    ///
    /// Settles when the offset is within a pixel of the target, or when the
    /// same offset is still reported at least a frame after it was first
    /// seen. A duplicate delivered at the same instant is not a stall.
    pub fn on_scrolled<T: Timers + ?Sized>(
        &mut self,
        offset: f64,
        timers: &mut T,
        now: Duration,
    ) -> Option<Settled> {
        let NavigationMode::Navigating(nav) = &mut self.mode else {
            return None;
        };
        let reason = if (offset - nav.scroll_target).abs() <= ARRIVAL_TOLERANCE {
            SettleReason::Arrived
        } else {
            match nav.last_sample {
                Some((last, seen)) if (last - offset).abs() < f64::EPSILON => {
                    if now.saturating_sub(seen) < STALL_INTERVAL {
                        return None;
                    }
                    SettleReason::Stalled
                }
                _ => {
                    nav.last_sample = Some((offset, now));
                    return None;
                }
            }
        };
        timers.cancel_wake(nav.wake);
        self.settle(reason, now)
    }

    /// Settle if the deadline has passed. For hosts without wake-ups.
    pub fn poll<T: Timers + ?Sized>(&mut self, timers: &mut T, now: Duration) -> Option<Settled> {
        let NavigationMode::Navigating(nav) = &self.mode else {
            return None;
        };
        if now < nav.deadline {
            return None;
        }
        timers.cancel_wake(nav.wake);
        self.settle(SettleReason::Deadline, now)
    }

    /// Abandon any navigation and release its wake-up.
    pub fn cancel<T: Timers + ?Sized>(&mut self, timers: &mut T) {
        if let NavigationMode::Navigating(nav) = std::mem::take(&mut self.mode) {
            timers.cancel_wake(nav.wake);
            tracing::debug!(message = "nav.cancel", target = %nav.target);
        }
    }

    /// Enter tracking without a navigation (first measurement, mount).
    pub fn begin_tracking(&mut self) {
        if matches!(self.mode, NavigationMode::Idle) {
            self.mode = NavigationMode::Tracking;
        }
    }

    fn settle(&mut self, reason: SettleReason, now: Duration) -> Option<Settled> {
        let NavigationMode::Navigating(nav) =
            std::mem::replace(&mut self.mode, NavigationMode::Tracking)
        else {
            return None;
        };
        let elapsed = now.saturating_sub(nav.started_at);
        tracing::debug!(
            message = "nav.settle",
            target = %nav.target,
            reason = reason.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
        );
        Some(Settled {
            target: nav.target,
            reason,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        tops: Vec<(&'static str, f64)>,
        offset: f64,
        scrolls: Vec<(f64, ScrollBehavior)>,
        next_token: u64,
        scheduled: Vec<(TimerToken, Duration)>,
        cancelled: Vec<TimerToken>,
    }

    impl Viewport for FakeHost {
        fn section_top(&self, id: &SectionId) -> Option<f64> {
            self.tops
                .iter()
                .find(|(k, _)| *k == id.as_str())
                .map(|(_, top)| *top)
        }

        fn scroll_offset(&self) -> f64 {
            self.offset
        }

        fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
            self.scrolls.push((offset, behavior));
        }
    }

    impl Timers for FakeHost {
        fn schedule_wake(&mut self, after: Duration) -> TimerToken {
            self.next_token += 1;
            let token = TimerToken(self.next_token);
            self.scheduled.push((token, after));
            token
        }

        fn cancel_wake(&mut self, token: TimerToken) {
            self.cancelled.push(token);
        }
    }

    fn setup() -> (SectionRegistry, FakeHost, NavigationController) {
        let registry =
            SectionRegistry::from_pairs([("ch1", "a"), ("ch2", "b"), ("ch3", "c"), ("ch4", "d")])
                .expect("registry");
        let host = FakeHost {
            tops: vec![("ch1", 0.0), ("ch2", 900.0), ("ch3", 1800.0), ("ch4", 2700.0)],
            ..FakeHost::default()
        };
        (registry, host, NavigationController::new(ScrollPolicy::default()))
    }

    const T0: Duration = Duration::from_millis(1_000);

    #[test]
    fn unknown_target_is_a_no_op() {
        let (reg, mut host, mut ctl) = setup();
        assert!(ctl.go_to(&reg, "nonexistent", &mut host, T0, NavigationOrigin::User).is_none());
        assert!(host.scrolls.is_empty());
        assert!(host.scheduled.is_empty());
        assert_eq!(ctl.mode(), &NavigationMode::Idle);
    }

    #[test]
    fn target_subtracts_header_and_padding() {
        let (reg, mut host, mut ctl) = setup();
        let started = ctl
            .go_to(&reg, "ch3", &mut host, T0, NavigationOrigin::User)
            .expect("started");
        assert_eq!(started.scroll_target, 1800.0 - 56.0 - 12.0);
        assert_eq!(host.scrolls, vec![(1732.0, ScrollBehavior::Smooth)]);
        assert!(!ctl.accepts_tracker_updates());
        assert_eq!(ctl.scroll_target_for(10.0), 0.0);
    }

    #[test]
    fn settle_estimate_is_clamped() {
        let (_, _, ctl) = setup();
        assert_eq!(ctl.estimate_settle(0.0), Duration::from_millis(150));
        assert_eq!(ctl.estimate_settle(1000.0), Duration::from_millis(350));
        assert_eq!(ctl.estimate_settle(-1000.0), Duration::from_millis(350));
        assert_eq!(ctl.estimate_settle(1e9), Duration::from_millis(700));
        assert_eq!(ctl.estimate_settle(f64::NAN), Duration::from_millis(150));
    }

    #[test]
    fn second_go_to_replaces_and_restarts_window() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch2", &mut host, T0, NavigationOrigin::User);
        let later = T0 + Duration::from_millis(100);
        let second = ctl
            .go_to(&reg, "ch4", &mut host, later, NavigationOrigin::User)
            .expect("started");
        assert_eq!(second.replaced, Some(SectionId::new("ch2")));
        assert_eq!(host.cancelled, vec![TimerToken(1)]);
        // The stale wake-up no longer settles anything.
        assert!(ctl.on_wake(TimerToken(1), later).is_none());
        let NavigationMode::Navigating(nav) = ctl.mode() else {
            panic!("expected navigating");
        };
        assert_eq!(nav.started_at, later);
        assert_eq!(nav.target, "ch4");
    }

    #[test]
    fn wake_settles_into_tracking() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch2", &mut host, T0, NavigationOrigin::User);
        let settled = ctl
            .on_wake(TimerToken(1), T0 + Duration::from_millis(400))
            .expect("settled");
        assert_eq!(settled.reason, SettleReason::Wake);
        assert_eq!(settled.elapsed, Duration::from_millis(400));
        assert_eq!(ctl.mode(), &NavigationMode::Tracking);
        assert!(ctl.accepts_tracker_updates());
    }

    #[test]
    fn arrival_settles_before_deadline() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch2", &mut host, T0, NavigationOrigin::User);
        assert!(ctl.on_scrolled(400.0, &mut host, T0).is_none());
        let settled = ctl.on_scrolled(831.5, &mut host, T0).expect("arrived");
        assert_eq!(settled.reason, SettleReason::Arrived);
        assert_eq!(host.cancelled, vec![TimerToken(1)]);
    }

    #[test]
    fn stalled_viewport_settles() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch4", &mut host, T0, NavigationOrigin::User);
        assert!(ctl.on_scrolled(1500.0, &mut host, T0).is_none());
        let later = T0 + Duration::from_millis(16);
        let settled = ctl.on_scrolled(1500.0, &mut host, later).expect("stalled");
        assert_eq!(settled.reason, SettleReason::Stalled);
    }

    #[test]
    fn duplicate_sample_at_same_instant_keeps_window_open() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch4", &mut host, T0, NavigationOrigin::User);
        let t = T0 + Duration::from_millis(50);
        assert!(ctl.on_scrolled(500.0, &mut host, t).is_none());
        assert!(ctl.on_scrolled(500.0, &mut host, t).is_none());
        assert!(ctl.on_scrolled(500.0, &mut host, t + Duration::from_millis(5)).is_none());
        assert!(!ctl.accepts_tracker_updates());
        assert!(host.cancelled.is_empty());

        // Movement resumes, so the earlier sample no longer counts.
        assert!(ctl.on_scrolled(900.0, &mut host, t + Duration::from_millis(16)).is_none());
        assert!(ctl.on_scrolled(900.0, &mut host, t + Duration::from_millis(20)).is_none());
        assert!(!ctl.accepts_tracker_updates());
    }

    #[test]
    fn poll_and_scroll_end() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch2", &mut host, T0, NavigationOrigin::User);
        assert!(ctl.poll(&mut host, T0 + Duration::from_millis(100)).is_none());
        let settled = ctl
            .poll(&mut host, T0 + Duration::from_secs(2))
            .expect("deadline");
        assert_eq!(settled.reason, SettleReason::Deadline);

        ctl.go_to(&reg, "ch3", &mut host, T0, NavigationOrigin::User);
        let settled = ctl.on_scroll_end(&mut host, T0).expect("scroll end");
        assert_eq!(settled.reason, SettleReason::ScrollEnd);
        assert!(ctl.on_scroll_end(&mut host, T0).is_none());
    }

    #[test]
    fn deep_link_scrolls_instantly() {
        let (reg, mut host, mut ctl) = setup();
        let started = ctl
            .go_to(&reg, "ch4", &mut host, T0, NavigationOrigin::DeepLink)
            .expect("started");
        assert_eq!(host.scrolls[0].1, ScrollBehavior::Instant);
        assert_eq!(started.settle_after, Duration::from_millis(150));
        assert!(!NavigationOrigin::DeepLink.pushes_history());
        assert!(!NavigationOrigin::History.pushes_history());
        assert!(NavigationOrigin::Keyboard.pushes_history());
    }

    #[test]
    fn cancel_releases_wake() {
        let (reg, mut host, mut ctl) = setup();
        ctl.go_to(&reg, "ch2", &mut host, T0, NavigationOrigin::User);
        ctl.cancel(&mut host);
        assert_eq!(host.cancelled, vec![TimerToken(1)]);
        assert_eq!(ctl.mode(), &NavigationMode::Idle);
        ctl.begin_tracking();
        assert_eq!(ctl.mode(), &NavigationMode::Tracking);
    }
}
