//! Property-based invariant tests for the navigator state machine.
//!
//! 1. Once set, the active id is always registered and never `None`
//! 2. While navigating, visibility batches never change the active id
//! 3. Outside a navigation, the fragment always equals the active id
//! 4. Unknown targets never scroll
//! 5. After unmount no input changes anything and the observer is released
//! 6. Observable versions only move when the value changes

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use secnav_core::{
    NavEvent, NavKey, ObserverOptions, SectionId, SectionRegistry, TabBounds, TimerToken,
    VisibilityBatch, VisibilityMetric,
};
use secnav_runtime::{
    BatchSender, Location, MeasureError, NavigationMode, NavigatorConfig, Observable, ObserveError,
    ScrollBehavior, SectionNavigator, TabStrip, Timers, Viewport, VisibilityObserver,
};
use web_time::Duration;

// ── Host ────────────────────────────────────────────────────────────────

const IDS: [&str; 5] = ["intro", "why", "projects", "impact", "next"];

#[derive(Default)]
struct Page {
    fragment: Option<String>,
    scrolls: usize,
    sender: Option<BatchSender>,
    connected: bool,
    next_token: u64,
    live_wake: Option<TimerToken>,
}

impl Viewport for Page {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        IDS.iter()
            .position(|k| *k == id.as_str())
            .map(|i| i as f64 * 1000.0)
    }

    fn scroll_offset(&self) -> f64 {
        0.0
    }

    fn scroll_to(&mut self, _offset: f64, _behavior: ScrollBehavior) {
        self.scrolls += 1;
    }
}

impl Location for Page {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
    }

    fn push_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
    }
}

impl TabStrip for Page {
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError> {
        let i = IDS
            .iter()
            .position(|k| *k == id.as_str())
            .ok_or_else(|| MeasureError::Missing(id.clone()))?;
        Ok(TabBounds {
            left: i as f64 * 90.0,
            width: 90.0,
            strip_left: 0.0,
        })
    }
}

impl VisibilityObserver for Page {
    fn is_supported(&self) -> bool {
        true
    }

    fn connect(
        &mut self,
        _options: &ObserverOptions,
        sender: BatchSender,
    ) -> Result<(), ObserveError> {
        self.sender = Some(sender);
        self.connected = true;
        Ok(())
    }

    fn observe(&mut self, _id: &SectionId) -> Result<(), ObserveError> {
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}

impl Timers for Page {
    fn schedule_wake(&mut self, _after: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.live_wake = Some(token);
        token
    }

    fn cancel_wake(&mut self, token: TimerToken) {
        if self.live_wake == Some(token) {
            self.live_wake = None;
        }
    }
}

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    Activate(usize),
    Fragment(usize),
    Batch(Vec<(usize, f64, f64)>),
    Wake,
    ScrollEnd,
    Key(NavKey),
    Advance(u64),
}

fn id_at(idx: usize) -> String {
    IDS.get(idx).map_or_else(|| format!("ghost{idx}"), |s| (*s).to_string())
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..IDS.len() + 2).prop_map(Step::Activate),
        (0usize..IDS.len() + 2).prop_map(Step::Fragment),
        prop::collection::vec((0usize..IDS.len() + 1, 0.0f64..=1.0, -1500.0f64..1500.0), 0..6)
            .prop_map(Step::Batch),
        Just(Step::Wake),
        Just(Step::ScrollEnd),
        prop_oneof![
            Just(NavKey::Next),
            Just(NavKey::Previous),
            Just(NavKey::First),
            Just(NavKey::Last)
        ]
        .prop_map(Step::Key),
        (0u64..1000).prop_map(Step::Advance),
    ]
}

fn registry() -> SectionRegistry {
    SectionRegistry::from_pairs(IDS.iter().map(|id| (*id, "label"))).expect("registry")
}

fn apply(nav: &mut SectionNavigator, page: &mut Page, step: &Step, now: &mut Duration) {
    match step {
        Step::Activate(i) => {
            nav.activate(&id_at(*i), page, *now);
        }
        Step::Fragment(i) => {
            nav.update(NavEvent::FragmentChanged(format!("#{}", id_at(*i))), page, *now);
        }
        Step::Batch(entries) => {
            let batch: VisibilityBatch = entries
                .iter()
                .map(|(i, ratio, top)| VisibilityMetric::new(id_at(*i), *ratio, *top, top + 1000.0))
                .collect();
            if let Some(tx) = &page.sender {
                tx.send(batch);
            }
            nav.pump(page, *now);
        }
        Step::Wake => {
            if let Some(token) = page.live_wake.take() {
                nav.update(NavEvent::Wake(token), page, *now);
            }
        }
        Step::ScrollEnd => {
            nav.update(NavEvent::ScrollEnd, page, *now);
        }
        Step::Key(key) => {
            nav.update(NavEvent::Key(*key), page, *now);
        }
        Step::Advance(ms) => {
            *now += Duration::from_millis(*ms);
            nav.pump(page, *now);
        }
    }
}

fn is_navigating(nav: &SectionNavigator) -> bool {
    matches!(nav.state().mode, NavigationMode::Navigating(_))
}

proptest! {
    #[test]
    fn active_is_always_registered(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let reg = registry();
        let mut page = Page::default();
        let mut nav = SectionNavigator::new(reg.clone(), NavigatorConfig::default());
        let mut now = Duration::ZERO;
        nav.mount(&mut page, now);
        for step in &steps {
            apply(&mut nav, &mut page, step, &mut now);
            let active = nav.current_active_id();
            prop_assert!(active.is_some());
            prop_assert!(reg.contains(active.as_ref().map_or("", SectionId::as_str)));
        }
    }

    #[test]
    fn batches_never_override_navigation(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut page = Page::default();
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        let mut now = Duration::ZERO;
        nav.mount(&mut page, now);
        for step in &steps {
            let before = nav.current_active_id();
            let navigating = is_navigating(&nav);
            apply(&mut nav, &mut page, step, &mut now);
            if navigating && matches!(step, Step::Batch(_)) && is_navigating(&nav) {
                prop_assert_eq!(nav.current_active_id(), before);
            }
        }
    }

    #[test]
    fn settled_fragment_matches_active(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut page = Page::default();
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        let mut now = Duration::ZERO;
        nav.mount(&mut page, now);
        for step in &steps {
            apply(&mut nav, &mut page, step, &mut now);
            let active = nav.current_active_id().map(|id| id.to_string());
            prop_assert_eq!(page.fragment.clone(), active);
        }
    }

    #[test]
    fn unknown_targets_never_scroll(idx in IDS.len()..IDS.len() + 10) {
        let mut page = Page::default();
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        nav.mount(&mut page, Duration::ZERO);
        let before = nav.current_active_id();
        prop_assert!(!nav.activate(&id_at(idx), &mut page, Duration::ZERO));
        prop_assert_eq!(page.scrolls, 0);
        prop_assert_eq!(nav.current_active_id(), before);
    }

    #[test]
    fn unmount_freezes_everything(steps in prop::collection::vec(step_strategy(), 0..30)) {
        let mut page = Page::default();
        let mut nav = SectionNavigator::new(registry(), NavigatorConfig::default());
        let mut now = Duration::ZERO;
        nav.mount(&mut page, now);
        nav.unmount(&mut page);
        prop_assert!(!page.connected);
        prop_assert!(page.live_wake.is_none());
        let frozen = nav.state();
        let scrolls = page.scrolls;
        for step in &steps {
            apply(&mut nav, &mut page, step, &mut now);
        }
        prop_assert_eq!(nav.state(), frozen);
        prop_assert_eq!(page.scrolls, scrolls);
    }

    #[test]
    fn observable_version_counts_changes(values in prop::collection::vec(0u8..4, 0..40)) {
        let obs = Observable::new(0u8);
        let hits = Rc::new(RefCell::new(0u64));
        let sink = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| *sink.borrow_mut() += 1);
        let mut expected = 0u64;
        let mut current = 0u8;
        for v in values {
            if v != current {
                expected += 1;
                current = v;
            }
            obs.set(v);
        }
        prop_assert_eq!(obs.version(), expected);
        prop_assert_eq!(*hits.borrow(), expected);
        prop_assert_eq!(obs.get(), current);
    }
}
