#![forbid(unsafe_code)]

//! A simulated browser page.
//!
//! [`SimulatedPage`] implements every host capability the navigator needs
//! with deterministic stand-ins for the browser:
//!
//! - **Layout**: sections stack from the document top; a footer one viewport
//!   tall lets the last section reach the activation line.
//! - **Scrolling**: smooth scrolls ease in and out over a distance-based
//!   duration and are advanced by [`SimulatedPage::tick`].
//! - **Visibility**: an intersection-observer emulation reports a section
//!   when its threshold bucket or its side of the activation line changes,
//!   with bounds measured at that moment.
//! - **History**: a session history stack with back/forward.
//! - **Tabs**: widths derived from label text; tabs can be detached.
//! - **Timers**: wake-ups fire from [`SimulatedPage::take_due`].

use std::collections::{BTreeMap, HashMap, HashSet};

use secnav_core::{
    ElementBounds, ObserverOptions, SectionId, TabBounds, TimerToken, VisibilityBatch,
    VisibilityMetric,
};
use secnav_runtime::{
    BatchSender, Location, MeasureError, ObserveError, ScrollBehavior, TabStrip, Timers, Viewport,
    VisibilityObserver,
};
use web_time::Duration;

/// Viewport used unless a test picks another.
pub const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 800.0);

const STRIP_LEFT: f64 = 24.0;
const TAB_GAP: f64 = 8.0;
const TAB_PADDING: f64 = 32.0;
const CHAR_WIDTH: f64 = 8.0;
const MIN_SCROLL_MS: f64 = 120.0;
const MAX_SCROLL_MS: f64 = 600.0;

/// One section of the simulated document.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpec {
    pub id: String,
    /// Label key, also the initial tab text.
    pub label: String,
    pub height: f64,
}

impl SectionSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, height: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            height: height.max(0.0),
        }
    }
}

/// A scroll the navigator asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub offset: f64,
    pub behavior: ScrollBehavior,
    pub at: Duration,
}

/// What happened during one [`SimulatedPage::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// New scroll offset if the document scrolled.
    pub scrolled: Option<f64>,
    /// Scrolling came to rest during this frame.
    pub scroll_ended: bool,
    /// Visibility entries delivered to the observer.
    pub observed_entries: usize,
}

#[derive(Debug, Clone)]
struct PlacedSection {
    id: SectionId,
    top: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineSide {
    Below,
    Straddle,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reading {
    bucket: Option<usize>,
    side: LineSide,
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
}

#[derive(Debug)]
struct Observer {
    options: ObserverOptions,
    sender: BatchSender,
    observed: Vec<SectionId>,
    readings: HashMap<SectionId, Reading>,
}

/// Deterministic page implementing [`secnav_runtime::Host`].
#[derive(Debug)]
pub struct SimulatedPage {
    sections: Vec<PlacedSection>,
    labels: Vec<(SectionId, String)>,
    viewport: (f64, f64),
    offset: f64,
    animation: Option<ScrollAnimation>,
    pending_scroll: bool,
    scroll_ms_per_px: f64,
    now: Duration,
    history: Vec<Option<String>>,
    cursor: usize,
    observer_supported: bool,
    observer: Option<Observer>,
    last_batch: Option<VisibilityBatch>,
    detached_tabs: HashSet<SectionId>,
    timers: BTreeMap<TimerToken, Duration>,
    next_token: u64,
    scroll_requests: Vec<ScrollRequest>,
    revealed: Vec<SectionId>,
    pushes: usize,
    replaces: usize,
    connects: usize,
    disconnects: usize,
}

impl SimulatedPage {
    /// Lay out `sections` top to bottom in a default viewport.
    #[must_use]
    pub fn new(sections: &[SectionSpec]) -> Self {
        let mut top = 0.0;
        let mut placed = Vec::with_capacity(sections.len());
        for spec in sections {
            placed.push(PlacedSection {
                id: SectionId::new(spec.id.clone()),
                top,
                height: spec.height,
            });
            top += spec.height;
        }
        Self {
            labels: sections
                .iter()
                .map(|s| (SectionId::new(s.id.clone()), s.label.clone()))
                .collect(),
            sections: placed,
            viewport: DEFAULT_VIEWPORT,
            offset: 0.0,
            animation: None,
            pending_scroll: false,
            scroll_ms_per_px: 0.3,
            now: Duration::ZERO,
            history: vec![None],
            cursor: 0,
            observer_supported: true,
            observer: None,
            last_batch: None,
            detached_tabs: HashSet::new(),
            timers: BTreeMap::new(),
            next_token: 0,
            scroll_requests: Vec::new(),
            revealed: Vec::new(),
            pushes: 0,
            replaces: 0,
            connects: 0,
            disconnects: 0,
        }
    }

    /// Start with `fragment` in the address bar (`#` optional).
    #[must_use]
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.history = vec![normalize(fragment)];
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Start already scrolled, as after the browser's own anchor jump.
    #[must_use]
    pub fn with_scroll_offset(mut self, offset: f64) -> Self {
        self.offset = offset.clamp(0.0, self.max_scroll());
        self
    }

    /// Pretend the browser lacks an intersection observer.
    #[must_use]
    pub fn without_observer(mut self) -> Self {
        self.observer_supported = false;
        self
    }

    /// Smooth-scroll speed; durations are still clamped to 120..=600 ms.
    #[must_use]
    pub fn with_scroll_speed(mut self, ms_per_px: f64) -> Self {
        self.scroll_ms_per_px = ms_per_px.max(0.0);
        self
    }

    /// Advance the page clock to `now`: animate scrolling and deliver any
    /// visibility changes.
    pub fn tick(&mut self, now: Duration) -> FrameReport {
        self.now = self.now.max(now);
        let before = self.offset;
        let mut ended = std::mem::take(&mut self.pending_scroll);
        let mut moved = ended;

        if let Some(anim) = self.animation {
            let elapsed = self.now.saturating_sub(anim.start);
            if elapsed >= anim.duration {
                self.offset = anim.to;
                self.animation = None;
                ended = true;
            } else {
                let progress = elapsed.as_secs_f64() / anim.duration.as_secs_f64();
                self.offset = anim.from + (anim.to - anim.from) * ease_in_out(progress);
            }
            moved |= self.offset != before;
        }

        let observed_entries = self.flush_observations();
        FrameReport {
            scrolled: moved.then_some(self.offset),
            scroll_ended: ended,
            observed_entries,
        }
    }

    /// Deliver entries for every observed section whose reading changed.
    ///
    /// Returns the number of entries sent.
    pub fn flush_observations(&mut self) -> usize {
        let Some(observer) = self.observer.as_mut() else {
            return 0;
        };
        let (clip_top, clip_bottom) = observer.options.root_span(self.viewport.1);
        let line = observer.options.activation_line;
        let mut entries = Vec::new();
        for id in &observer.observed {
            let Some(section) = self.sections.iter().find(|s| &s.id == id) else {
                continue;
            };
            let bounds = ElementBounds::new(section.top - self.offset, section.height);
            let ratio = bounds.visible_ratio(clip_top, clip_bottom);
            let reading = Reading {
                bucket: if ratio > 0.0 {
                    observer.options.threshold_bucket(ratio)
                } else {
                    None
                },
                side: side_of(&bounds, line),
            };
            if observer.readings.get(id) != Some(&reading) {
                observer.readings.insert(id.clone(), reading);
                entries.push(VisibilityMetric::from_bounds(id.clone(), ratio, bounds, line));
            }
        }
        if entries.is_empty() {
            return 0;
        }
        let count = entries.len();
        let batch = VisibilityBatch::new(entries);
        self.last_batch = Some(batch.clone());
        if !observer.sender.send(batch) {
            tracing::debug!(message = "page.batch_dropped", entries = count);
        }
        count
    }

    /// Send the previous batch again, as a flaky observer might.
    pub fn replay_last_batch(&mut self) -> bool {
        match (&self.observer, &self.last_batch) {
            (Some(observer), Some(batch)) => observer.sender.send(batch.clone()),
            _ => false,
        }
    }

    /// The user scrolled (wheel, touch, scrollbar). Interrupts any animation.
    pub fn user_scroll_to(&mut self, offset: f64) {
        self.animation = None;
        self.offset = offset.clamp(0.0, self.max_scroll());
        self.pending_scroll = true;
    }

    /// Wake-ups due at or before `now`, in firing order.
    pub fn take_due(&mut self, now: Duration) -> Vec<TimerToken> {
        let mut due: Vec<(Duration, TimerToken)> = self
            .timers
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(token, at)| (*at, *token))
            .collect();
        due.sort();
        for (_, token) in &due {
            self.timers.remove(token);
        }
        due.into_iter().map(|(_, token)| token).collect()
    }

    /// History back. Returns the fragment now shown (empty if none).
    pub fn back(&mut self) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.history[self.cursor].clone().unwrap_or_default())
    }

    /// History forward. Returns the fragment now shown (empty if none).
    pub fn forward(&mut self) -> Option<String> {
        if self.cursor + 1 >= self.history.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.history[self.cursor].clone().unwrap_or_default())
    }

    /// The user typed a new fragment into the address bar.
    pub fn visit(&mut self, fragment: &str) {
        self.history.truncate(self.cursor + 1);
        self.history.push(normalize(fragment));
        self.cursor += 1;
    }

    /// Change a tab's text; its width follows.
    pub fn set_label(&mut self, id: &str, text: impl Into<String>) {
        if let Some((_, label)) = self.labels.iter_mut().find(|(sid, _)| sid.as_str() == id) {
            *label = text.into();
        }
    }

    /// A section's element leaves the document; the observer stops
    /// reporting it.
    pub fn detach_section(&mut self, id: &str) -> bool {
        let Some(observer) = self.observer.as_mut() else {
            return false;
        };
        let before = observer.observed.len();
        observer.observed.retain(|observed| observed.as_str() != id);
        observer.readings.retain(|observed, _| observed.as_str() != id);
        observer.observed.len() != before
    }

    pub fn detach_tab(&mut self, id: &str) {
        self.detached_tabs.insert(SectionId::new(id));
    }

    pub fn attach_tab(&mut self, id: &str) {
        self.detached_tabs.remove(id);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        self.offset = self.offset.min(self.max_scroll());
    }

    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Largest reachable scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        // The footer is one viewport tall, so only the content height scrolls.
        self.sections.iter().map(|s| s.height).sum::<f64>().max(0.0)
    }

    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.animation.is_some() || self.pending_scroll
    }

    /// Viewport-relative bounds of a section.
    #[must_use]
    pub fn section_bounds(&self, id: &str) -> Option<ElementBounds> {
        self.sections
            .iter()
            .find(|s| s.id.as_str() == id)
            .map(|s| ElementBounds::new(s.top - self.offset, s.height))
    }

    #[must_use]
    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    #[must_use]
    pub fn revealed(&self) -> &[SectionId] {
        &self.revealed
    }

    /// Fragment writes that added a history entry.
    #[must_use]
    pub fn pushes(&self) -> usize {
        self.pushes
    }

    /// Fragment writes that replaced the current entry.
    #[must_use]
    pub fn replaces(&self) -> usize {
        self.replaces
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects
    }

    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    /// An observer is connected and its sender still reaches a feed.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observer.as_ref().is_some_and(|o| o.sender.is_open())
    }

    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.observer.as_ref().map_or(0, |o| o.observed.len())
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn tab_bounds(&self, index: usize) -> Option<TabBounds> {
        let mut left = STRIP_LEFT;
        for (i, (_, text)) in self.labels.iter().enumerate() {
            let width = tab_width(text);
            if i == index {
                return Some(TabBounds::new(left, width, STRIP_LEFT));
            }
            left += width + TAB_GAP;
        }
        None
    }
}

impl Viewport for SimulatedPage {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        self.sections.iter().find(|s| &s.id == id).map(|s| s.top)
    }

    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        let target = offset.clamp(0.0, self.max_scroll());
        self.scroll_requests.push(ScrollRequest {
            offset: target,
            behavior,
            at: self.now,
        });
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.offset = target;
                self.pending_scroll = true;
            }
            ScrollBehavior::Smooth => {
                let distance = (target - self.offset).abs();
                if distance < 0.5 {
                    self.animation = None;
                    return;
                }
                let ms = (distance * self.scroll_ms_per_px).clamp(MIN_SCROLL_MS, MAX_SCROLL_MS);
                self.animation = Some(ScrollAnimation {
                    from: self.offset,
                    to: target,
                    start: self.now,
                    duration: Duration::from_millis(ms.round() as u64),
                });
            }
        }
    }
}

impl Location for SimulatedPage {
    fn fragment(&self) -> Option<String> {
        self.history.get(self.cursor).cloned().flatten()
    }

    fn replace_fragment(&mut self, id: &SectionId) {
        self.history[self.cursor] = Some(id.to_string());
        self.replaces += 1;
    }

    fn push_fragment(&mut self, id: &SectionId) {
        self.history.truncate(self.cursor + 1);
        self.history.push(Some(id.to_string()));
        self.cursor += 1;
        self.pushes += 1;
    }
}

impl TabStrip for SimulatedPage {
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError> {
        if self.detached_tabs.contains(id) {
            return Err(MeasureError::Detached(id.clone()));
        }
        self.labels
            .iter()
            .position(|(sid, _)| sid == id)
            .and_then(|i| self.tab_bounds(i))
            .ok_or_else(|| MeasureError::Missing(id.clone()))
    }

    fn reveal_tab(&mut self, id: &SectionId) {
        self.revealed.push(id.clone());
    }
}

impl VisibilityObserver for SimulatedPage {
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
        self.connects += 1;
        self.observer = Some(Observer {
            options: options.clone(),
            sender,
            observed: Vec::new(),
            readings: HashMap::new(),
        });
        Ok(())
    }

    fn observe(&mut self, id: &SectionId) -> Result<(), ObserveError> {
        if !self.sections.iter().any(|s| &s.id == id) {
            return Err(ObserveError::MissingElement(id.clone()));
        }
        let Some(observer) = self.observer.as_mut() else {
            return Err(ObserveError::Rejected("observer not connected".into()));
        };
        if !observer.observed.contains(id) {
            observer.observed.push(id.clone());
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.observer.take().is_some() {
            self.disconnects += 1;
        }
    }
}

impl Timers for SimulatedPage {
    fn schedule_wake(&mut self, after: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.timers.insert(token, self.now + after);
        token
    }

    fn cancel_wake(&mut self, token: TimerToken) {
        self.timers.remove(&token);
    }
}

fn normalize(fragment: &str) -> Option<String> {
    let trimmed = fragment.strip_prefix('#').unwrap_or(fragment);
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn side_of(bounds: &ElementBounds, line: f64) -> LineSide {
    if bounds.top >= line {
        LineSide::Below
    } else if bounds.bottom() > line {
        LineSide::Straddle
    } else {
        LineSide::Above
    }
}

fn tab_width(text: &str) -> f64 {
    TAB_PADDING + CHAR_WIDTH * text.chars().count() as f64
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
